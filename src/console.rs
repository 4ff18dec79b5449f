// src/console.rs
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use regex::Regex;

use crate::stepper::StepperMotor;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Rotate { motor: u8, degrees: f64 },
    Enable(u8),
    Disable(u8),
    Exit,
}

// ==========================================
// 1. Command Grammar
// ==========================================
pub struct CommandParser {
    rotate_re: Regex,
    enable_re: Regex,
    disable_re: Regex,
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            rotate_re: Regex::new(r"^motor\s+(\d+)\s*:\s*(-?\d+(?:\.\d+)?)$").unwrap(),
            enable_re: Regex::new(r"^enable\s+(\d+)$").unwrap(),
            disable_re: Regex::new(r"^disable\s+(\d+)$").unwrap(),
        }
    }

    /// Input is trimmed and lowercased before matching.
    pub fn parse(&self, line: &str) -> Result<Command, String> {
        let cmd = line.trim().to_lowercase();
        if cmd == "exit" {
            return Ok(Command::Exit);
        }
        if cmd.starts_with("motor") {
            let caps = self
                .rotate_re
                .captures(&cmd)
                .ok_or_else(|| "Invalid input format. Use 'motor <id>: <deg>'".to_string())?;
            let motor = caps[1]
                .parse::<u8>()
                .map_err(|_| "Invalid input format. Use 'motor <id>: <deg>'".to_string())?;
            let degrees = caps[2]
                .parse::<f64>()
                .map_err(|_| "Invalid input format. Use 'motor <id>: <deg>'".to_string())?;
            return Ok(Command::Rotate { motor, degrees });
        }
        if cmd.starts_with("enable") {
            let caps = self
                .enable_re
                .captures(&cmd)
                .ok_or_else(|| "Invalid input. Use 'enable <id>'".to_string())?;
            let id = caps[1]
                .parse::<u8>()
                .map_err(|_| "Invalid input. Use 'enable <id>'".to_string())?;
            return Ok(Command::Enable(id));
        }
        if cmd.starts_with("disable") {
            let caps = self
                .disable_re
                .captures(&cmd)
                .ok_or_else(|| "Invalid input. Use 'disable <id>'".to_string())?;
            let id = caps[1]
                .parse::<u8>()
                .map_err(|_| "Invalid input. Use 'disable <id>'".to_string())?;
            return Ok(Command::Disable(id));
        }
        Err("Invalid command.".to_string())
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 2. Interactive Loop
// ==========================================
pub struct MotorConsole {
    motors: BTreeMap<u8, StepperMotor>,
    parser: CommandParser,
}

impl MotorConsole {
    pub fn new(motors: BTreeMap<u8, StepperMotor>) -> Self {
        Self {
            motors,
            parser: CommandParser::new(),
        }
    }

    pub fn motor(&self, id: u8) -> Option<&StepperMotor> {
        self.motors.get(&id)
    }

    pub fn print_help() {
        println!("Commands:");
        println!("- 'motor <id>: <degrees>' to rotate");
        println!("- 'enable <id>' to enable");
        println!("- 'disable <id>' to disable");
        println!("- 'exit' to quit");
    }

    /// Apply one command. Returns false once the loop should stop.
    pub fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Exit => return false,
            Command::Rotate { motor, degrees } => match self.motors.get_mut(&motor) {
                Some(m) => {
                    println!("Rotating motor {} by {}°", motor, degrees);
                    if let Err(e) = m.rotate_degrees(degrees) {
                        eprintln!("Motor {} fault: {}", motor, e);
                    }
                }
                None => println!("Invalid motor number"),
            },
            Command::Enable(id) => self.toggle(id, true),
            Command::Disable(id) => self.toggle(id, false),
        }
        true
    }

    fn toggle(&mut self, id: u8, on: bool) {
        match self.motors.get_mut(&id) {
            Some(m) => {
                if let Err(e) = m.manual_enable(on) {
                    eprintln!("Motor {} fault: {}", id, e);
                }
            }
            None => println!("Invalid motor number"),
        }
    }

    /// Blocking read-dispatch loop over stdin. EOF behaves like `exit`.
    pub fn run(&mut self) -> Result<(), String> {
        Self::print_help();
        let stdin = io::stdin();
        loop {
            print!("> ");
            io::stdout().flush().map_err(|e| format!("stdout: {}", e))?;

            let mut line = String::new();
            let n = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| format!("stdin: {}", e))?;
            if n == 0 {
                break;
            }
            match self.parser.parse(&line) {
                Ok(cmd) => {
                    if !self.handle(cmd) {
                        break;
                    }
                }
                Err(msg) => println!("{}", msg),
            }
        }
        Ok(())
    }
}
