// src/lib.rs

pub mod blink;   // LED smoke test
pub mod camera;  // still capture via libcamera-still
pub mod config;  // rig configuration (rig.toml)
pub mod console; // interactive motor command loop
pub mod gpio;    // output line drivers (hardware / simulated)
pub mod stepper; // stepper motor control
pub mod vision;  // ball detection
