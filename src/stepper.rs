// src/stepper.rs
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::StepperParams;
use crate::gpio::OutputLine;

/// One stepper driver behind STEP/DIR/ENABLE lines.
///
/// The lines are handed over already requested and at their idle levels
/// (STEP low, DIR low, ENABLE high = driver de-energized).
pub struct StepperMotor {
    step_line: Box<dyn OutputLine>,
    dir_line: Box<dyn OutputLine>,
    en_line: Box<dyn OutputLine>,
    steps_per_deg: f64,
    pulse_delay: Duration,
    enabled: bool,
}

impl StepperMotor {
    pub fn new(
        step_line: Box<dyn OutputLine>,
        dir_line: Box<dyn OutputLine>,
        en_line: Box<dyn OutputLine>,
        params: &StepperParams,
    ) -> Self {
        Self {
            step_line,
            dir_line,
            en_line,
            steps_per_deg: params.steps_per_deg(),
            pulse_delay: Duration::from_micros(params.pulse_delay_us),
            enabled: false,
        }
    }

    /// ENABLE is active-low on these drivers: LOW = energized.
    pub fn enable(&mut self, on: bool) -> Result<(), String> {
        self.en_line.set_value(!on)?;
        self.enabled = on;
        println!("{} motor", if on { "Enabled" } else { "Disabled" });
        Ok(())
    }

    pub fn manual_enable(&mut self, on: bool) -> Result<(), String> {
        self.enable(on)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_direction(&mut self, clockwise: bool) -> Result<(), String> {
        self.dir_line.set_value(clockwise)
    }

    /// Issue `count` step pulses with the configured half-period between
    /// edges. Blocks until the last pulse has been driven low.
    pub fn step(&mut self, count: u64) -> Result<(), String> {
        for _ in 0..count {
            self.step_line.set_high()?;
            thread::sleep(self.pulse_delay);
            self.step_line.set_low()?;
            thread::sleep(self.pulse_delay);
        }
        Ok(())
    }

    /// Rotate by a signed angle. Positive is clockwise. The driver is
    /// released after every move, even if it was enabled manually first.
    pub fn rotate_degrees(&mut self, degrees: f64) -> Result<(), String> {
        if degrees == 0.0 {
            return Ok(());
        }
        if !self.enabled {
            self.enable(true)?;
        }
        self.set_direction(degrees > 0.0)?;
        let steps = (degrees * self.steps_per_deg) as i64;
        debug!("rotate {:.2} deg -> {} steps", degrees, steps.unsigned_abs());
        self.step(steps.unsigned_abs())?;
        self.enable(false)
    }
}
