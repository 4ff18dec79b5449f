// src/camera.rs
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use chrono::Local;
use log::info;

use crate::config::CameraConfig;

/// Still capture through the external `libcamera-still` tool.
pub struct StillCamera {
    width: u32,
    height: u32,
}

impl StillCamera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
        }
    }

    fn capture_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new("libcamera-still");
        cmd.arg("-o")
            .arg(path)
            .arg("-n") // no preview window
            .arg("--width")
            .arg(self.width.to_string())
            .arg("--height")
            .arg(self.height.to_string());
        cmd
    }

    /// Capture one frame to `path`.
    pub fn capture(&self, path: &Path) -> Result<(), String> {
        let start = Instant::now();
        let status = self
            .capture_command(path)
            .status()
            .map_err(|e| format!("Failed to run libcamera-still: {}", e))?;
        if !status.success() {
            return Err(format!("libcamera-still exited with {}", status));
        }
        if !path.exists() {
            return Err(format!("Captured file {} not found", path.display()));
        }
        info!("captured {} in {} ms", path.display(), start.elapsed().as_millis());
        Ok(())
    }

    /// Capture, decode, and re-save a processed copy under a timestamped
    /// name. Returns the path of the copy.
    pub fn capture_and_process(&self, path: &Path) -> Result<PathBuf, String> {
        self.capture(path)?;

        let frame = image::open(path)
            .map_err(|e| format!("Could not load image {}: {}", path.display(), e))?;
        println!("Loaded {}x{} frame", frame.width(), frame.height());

        let out = PathBuf::from(format!("processed_{}.jpg", Local::now().format("%Y%m%d_%H%M%S")));
        frame
            .save(&out)
            .map_err(|e| format!("Could not save {}: {}", out.display(), e))?;
        println!("Saved processed image to {}", out.display());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_command_carries_geometry() {
        let camera = StillCamera::from_config(&CameraConfig {
            width: 1280,
            height: 720,
            device_index: 0,
        });
        let cmd = camera.capture_command(Path::new("shot.jpg"));
        assert_eq!(cmd.get_program(), "libcamera-still");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-o", "shot.jpg", "-n", "--width", "1280", "--height", "720"]);
    }
}
