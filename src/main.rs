// src/main.rs
use ballrig_cmd::camera::StillCamera;
use ballrig_cmd::config::RigConfig;
use ballrig_cmd::console::MotorConsole;
use ballrig_cmd::gpio::{self, DriverType};
use ballrig_cmd::stepper::StepperMotor;
use ballrig_cmd::{blink, vision};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rig configuration file
    #[arg(short, long, default_value = "rig.toml")]
    config: PathBuf,

    /// Run without GPIO hardware (simulated output lines)
    #[arg(long)]
    sim: bool,

    /// Run a hardware test mode (blink, capture, track)
    #[arg(long)]
    test: Option<String>,

    /// Frame limit for the track test (0 = run until the camera stops)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Write an annotated frame every N-th detection in the track test
    #[arg(long, default_value_t = 0)]
    snapshot_every: u64,

    /// Enable debug messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter(
        None,
        if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
    );
    builder.init();

    println!("========================================");
    println!("Ball Rig Control Center");
    println!("Config: {}", args.config.display());
    if let Some(t) = &args.test {
        println!("Mode: test ({})", t);
    } else {
        println!("Mode: motor console");
    }
    println!("========================================");

    let cfg = match RigConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let driver = if args.sim {
        println!("No-hardware simulation mode: GPIO writes are logged only");
        DriverType::Software
    } else {
        DriverType::Hardware
    };

    let result = match args.test.as_deref() {
        Some("blink") => run_blink_test(&cfg, driver),
        Some("capture") => run_capture_test(&cfg),
        Some("track") => run_track_test(&cfg, args.frames, args.snapshot_every),
        Some(other) => {
            eprintln!("Unknown test mode '{}'", other);
            process::exit(2);
        }
        None => run_motor_console(&cfg, driver),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

// ----------------------------------------------------------------
// Run modes
// ----------------------------------------------------------------

fn run_motor_console(cfg: &RigConfig, driver: DriverType) -> Result<(), String> {
    let mut motors = BTreeMap::new();
    for m in &cfg.motors {
        // STEP and DIR idle low; ENABLE idles high (driver de-energized)
        let step = gpio::create_line(driver, m.step_pin, false)?;
        let dir = gpio::create_line(driver, m.dir_pin, false)?;
        let en = gpio::create_line(driver, m.enable_pin, true)?;
        motors.insert(m.id, StepperMotor::new(step, dir, en, &cfg.stepper));
    }
    MotorConsole::new(motors).run()
}

fn run_blink_test(cfg: &RigConfig, driver: DriverType) -> Result<(), String> {
    let mut line = gpio::create_line(driver, cfg.blink.pin, false)?;
    blink::run(line.as_mut(), cfg.blink.cycles, Duration::from_millis(cfg.blink.period_ms))
}

fn run_capture_test(cfg: &RigConfig) -> Result<(), String> {
    let camera = StillCamera::from_config(&cfg.camera);
    camera.capture_and_process(Path::new("capture.jpg")).map(|_| ())
}

fn run_track_test(cfg: &RigConfig, frames: u64, snapshot_every: u64) -> Result<(), String> {
    let limit = if frames == 0 { None } else { Some(frames) };
    vision::run_tracker(&cfg.camera, &cfg.vision, limit, snapshot_every)
}
