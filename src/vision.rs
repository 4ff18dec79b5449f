// src/vision.rs
use log::info;
use opencv::core::{self, Mat, Point, Point2f, Scalar, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc, videoio};

use crate::config::{CameraConfig, VisionConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub x: i32,
    pub y: i32,
    pub radius: f32,
    pub area: f64,
}

/// Largest-blob color detector. All of the actual image work is OpenCV;
/// this just sequences the calls with the configured thresholds.
pub struct BlobDetector {
    lower: Scalar,
    upper: Scalar,
    min_radius: f32,
    min_area: f64,
}

impl BlobDetector {
    pub fn from_config(cfg: &VisionConfig) -> Self {
        let bound = |hsv: [u8; 3]| Scalar::new(hsv[0] as f64, hsv[1] as f64, hsv[2] as f64, 0.0);
        Self {
            lower: bound(cfg.lower_hsv),
            upper: bound(cfg.upper_hsv),
            min_radius: cfg.min_radius,
            min_area: cfg.min_area,
        }
    }

    /// Find the largest in-range blob in a BGR frame, if any passes the
    /// area and radius gates.
    pub fn detect(&self, frame: &Mat) -> Result<Option<Blob>, String> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)
            .map_err(|e| format!("cvtColor failed: {}", e))?;

        let mut mask = Mat::default();
        core::in_range(&hsv, &self.lower, &self.upper, &mut mask)
            .map_err(|e| format!("inRange failed: {}", e))?;

        // two erode/dilate passes to knock out speckle
        let kernel = Mat::default();
        let anchor = Point::new(-1, -1);
        let border = imgproc::morphology_default_border_value().map_err(|e| e.to_string())?;
        let mut eroded = Mat::default();
        imgproc::erode(&mask, &mut eroded, &kernel, anchor, 2, core::BORDER_CONSTANT, border)
            .map_err(|e| format!("erode failed: {}", e))?;
        let mut cleaned = Mat::default();
        imgproc::dilate(&eroded, &mut cleaned, &kernel, anchor, 2, core::BORDER_CONSTANT, border)
            .map_err(|e| format!("dilate failed: {}", e))?;

        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours(
            &cleaned,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .map_err(|e| format!("findContours failed: {}", e))?;

        let mut best: Option<(f64, Vector<Point>)> = None;
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)
                .map_err(|e| format!("contourArea failed: {}", e))?;
            if best.as_ref().map_or(true, |(a, _)| area > *a) {
                best = Some((area, contour));
            }
        }

        let (area, contour) = match best {
            Some(b) => b,
            None => return Ok(None),
        };
        if area < self.min_area {
            return Ok(None);
        }

        let mut center = Point2f::new(0.0, 0.0);
        let mut radius = 0.0f32;
        imgproc::min_enclosing_circle(&contour, &mut center, &mut radius)
            .map_err(|e| format!("minEnclosingCircle failed: {}", e))?;
        if radius < self.min_radius {
            return Ok(None);
        }

        Ok(Some(Blob {
            x: center.x as i32,
            y: center.y as i32,
            radius,
            area,
        }))
    }

    /// Green enclosing circle plus a red center dot.
    pub fn annotate(&self, frame: &mut Mat, blob: &Blob) -> Result<(), String> {
        let center = Point::new(blob.x, blob.y);
        imgproc::circle(
            frame,
            center,
            blob.radius as i32,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            0,
        )
        .map_err(|e| format!("circle failed: {}", e))?;
        imgproc::circle(
            frame,
            center,
            5,
            Scalar::new(0.0, 0.0, 255.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .map_err(|e| format!("circle failed: {}", e))?;
        Ok(())
    }
}

/// Continuous tracking loop over the capture device. Prints one position
/// line per detection; `snapshot_every` > 0 additionally writes an
/// annotated frame every N-th detection (the headless stand-in for a
/// preview window).
pub fn run_tracker(
    cam: &CameraConfig,
    vis: &VisionConfig,
    frame_limit: Option<u64>,
    snapshot_every: u64,
) -> Result<(), String> {
    let detector = BlobDetector::from_config(vis);

    let mut cap = videoio::VideoCapture::new(cam.device_index, videoio::CAP_ANY)
        .map_err(|e| format!("Cannot open camera {}: {}", cam.device_index, e))?;
    if !cap.is_opened().map_err(|e| e.to_string())? {
        return Err("Cannot open camera.".to_string());
    }
    let _ = cap
        .set(videoio::CAP_PROP_FRAME_WIDTH, cam.width as f64)
        .map_err(|e| e.to_string())?;
    let _ = cap
        .set(videoio::CAP_PROP_FRAME_HEIGHT, cam.height as f64)
        .map_err(|e| e.to_string())?;

    let mut frame = Mat::default();
    let mut seen: u64 = 0;
    let mut hits: u64 = 0;
    loop {
        if let Some(limit) = frame_limit {
            if seen >= limit {
                break;
            }
        }
        let ok = cap
            .read(&mut frame)
            .map_err(|e| format!("Camera read failed: {}", e))?;
        if !ok || frame.empty().map_err(|e| e.to_string())? {
            break;
        }
        seen += 1;

        if let Some(blob) = detector.detect(&frame)? {
            hits += 1;
            println!("Ball position: ({}, {})", blob.x, blob.y);
            if snapshot_every > 0 && hits % snapshot_every == 0 {
                let mut annotated = frame.try_clone().map_err(|e| e.to_string())?;
                detector.annotate(&mut annotated, &blob)?;
                imgcodecs::imwrite("track_debug.jpg", &annotated, &Vector::new())
                    .map_err(|e| format!("Could not save snapshot: {}", e))?;
            }
        }
    }
    info!("tracker stopped after {} frames ({} detections)", seen, hits);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionConfig;
    use opencv::core::Rect;

    /// Black 640x480 BGR frame with an orange square at the given spot.
    /// BGR (0, 100, 255) sits around H=12 S=255 V=255, inside the default
    /// [5..15, 150..255, 150..255] window.
    fn frame_with_square(x: i32, y: i32, side: i32) -> Mat {
        let mut frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(0.0)).unwrap();
        imgproc::rectangle(
            &mut frame,
            Rect::new(x, y, side, side),
            Scalar::new(0.0, 100.0, 255.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        frame
    }

    fn detector() -> BlobDetector {
        BlobDetector::from_config(&VisionConfig::default())
    }

    #[test]
    fn finds_centered_square() {
        let frame = frame_with_square(300, 220, 40);
        let blob = detector().detect(&frame).unwrap().expect("no blob found");
        assert!((blob.x - 320).abs() <= 2, "x = {}", blob.x);
        assert!((blob.y - 240).abs() <= 2, "y = {}", blob.y);
        assert!(blob.radius >= 10.0);
        assert!(blob.area >= 500.0);
    }

    #[test]
    fn empty_frame_has_no_blob() {
        let frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(0.0)).unwrap();
        assert_eq!(detector().detect(&frame).unwrap(), None);
    }

    #[test]
    fn speckle_is_rejected() {
        // 6x6 patch: survives thresholding but not the area gate
        let frame = frame_with_square(100, 100, 6);
        assert_eq!(detector().detect(&frame).unwrap(), None);
    }

    #[test]
    fn annotate_draws_in_place() {
        let frame = frame_with_square(300, 220, 40);
        let det = detector();
        let blob = det.detect(&frame).unwrap().unwrap();
        let mut annotated = frame.try_clone().unwrap();
        det.annotate(&mut annotated, &blob).unwrap();
        // the green ring must have changed some pixels
        let mut diff = Mat::default();
        core::absdiff(&frame, &annotated, &mut diff).unwrap();
        let changed = core::sum_elems(&diff).unwrap();
        assert!(changed[0] + changed[1] + changed[2] > 0.0);
    }
}
