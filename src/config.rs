// src/config.rs
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

/// Everything the rig binary reads from `rig.toml`. Any missing section
/// falls back to the wiring of the bench rig this was written for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub stepper: StepperParams,
    pub motors: Vec<MotorPins>,
    pub camera: CameraConfig,
    pub vision: VisionConfig,
    pub blink: BlinkConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            stepper: StepperParams::default(),
            motors: default_motors(),
            camera: CameraConfig::default(),
            vision: VisionConfig::default(),
            blink: BlinkConfig::default(),
        }
    }
}

impl RigConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            warn!("config {} not found, using built-in defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let cfg: RigConfig =
            toml::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), String> {
        if self.motors.is_empty() {
            return Err("No motors defined in config".to_string());
        }
        let mut seen = BTreeSet::new();
        for m in &self.motors {
            if !seen.insert(m.id) {
                return Err(format!("Duplicate motor id {} in config", m.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StepperParams {
    pub steps_per_rev: u32,
    pub pulse_delay_us: u64,
}

impl Default for StepperParams {
    fn default() -> Self {
        // motor pulse/rev (*) micro step count (*)
        Self {
            steps_per_rev: 16000,
            pulse_delay_us: 200,
        }
    }
}

impl StepperParams {
    /// ≈ 44.44 steps/deg at the default microstep count.
    pub fn steps_per_deg(&self) -> f64 {
        self.steps_per_rev as f64 / 360.0
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct MotorPins {
    pub id: u8,
    pub step_pin: u8,
    pub dir_pin: u8,
    pub enable_pin: u8,
}

fn default_motors() -> Vec<MotorPins> {
    vec![
        MotorPins { id: 1, step_pin: 4, dir_pin: 3, enable_pin: 2 },
        MotorPins { id: 2, step_pin: 22, dir_pin: 27, enable_pin: 17 },
        MotorPins { id: 3, step_pin: 11, dir_pin: 9, enable_pin: 10 },
    ]
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub device_index: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            device_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// OpenCV-scale HSV (H in 0..180)
    pub lower_hsv: [u8; 3],
    pub upper_hsv: [u8; 3],
    pub min_radius: f32,
    pub min_area: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            lower_hsv: [5, 150, 150],
            upper_hsv: [15, 255, 255],
            min_radius: 10.0,
            min_area: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    pub pin: u8,
    pub cycles: u32,
    pub period_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            pin: 17,
            cycles: 10,
            period_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_bench_rig() {
        let cfg = RigConfig::default();
        assert_eq!(cfg.stepper.steps_per_rev, 16000);
        assert_eq!(cfg.stepper.pulse_delay_us, 200);
        assert_eq!(cfg.motors.len(), 3);
        assert_eq!(cfg.motors[1], MotorPins { id: 2, step_pin: 22, dir_pin: 27, enable_pin: 17 });
        assert_eq!(cfg.blink.pin, 17);
    }

    #[test]
    fn steps_per_deg_from_rev_count() {
        let params = StepperParams { steps_per_rev: 16000, pulse_delay_us: 200 };
        assert!((params.steps_per_deg() - 44.444).abs() < 0.001);
    }

    #[test]
    fn parses_full_config() {
        let raw = r#"
            [stepper]
            steps_per_rev = 3200
            pulse_delay_us = 500

            [[motors]]
            id = 7
            step_pin = 5
            dir_pin = 6
            enable_pin = 13

            [vision]
            lower_hsv = [0, 100, 100]
            upper_hsv = [10, 255, 255]
        "#;
        let cfg: RigConfig = toml::from_str(raw).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.stepper.steps_per_rev, 3200);
        assert_eq!(cfg.motors, vec![MotorPins { id: 7, step_pin: 5, dir_pin: 6, enable_pin: 13 }]);
        assert_eq!(cfg.vision.upper_hsv, [10, 255, 255]);
        // untouched sections keep their defaults
        assert_eq!(cfg.camera.width, 640);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: RigConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.motors.len(), 3);
        assert_eq!(cfg.vision.lower_hsv, [5, 150, 150]);
    }

    #[test]
    fn rejects_duplicate_motor_ids() {
        let raw = r#"
            [[motors]]
            id = 1
            step_pin = 4
            dir_pin = 3
            enable_pin = 2

            [[motors]]
            id = 1
            step_pin = 22
            dir_pin = 27
            enable_pin = 17
        "#;
        let cfg: RigConfig = toml::from_str(raw).unwrap();
        assert!(cfg.validate().is_err());
    }
}
