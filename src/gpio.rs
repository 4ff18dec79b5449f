// src/gpio.rs
use log::{debug, trace};
use rppal::gpio::{Gpio, OutputPin};

// ==========================================
// 1. Common Interface (Trait)
// ==========================================
pub trait OutputLine: Send {
    fn set_high(&mut self) -> Result<(), String>;
    fn set_low(&mut self) -> Result<(), String>;

    fn set_value(&mut self, high: bool) -> Result<(), String> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// BCM line offset this handle drives.
    fn pin(&self) -> u8;
}

// ==========================================
// 2. Hardware Line (rppal / BCM GPIO)
// ==========================================
pub struct HardwareLine {
    pin: OutputPin,
    offset: u8,
}

impl HardwareLine {
    /// Claims `offset` as an output, driven to `initial_high` before this
    /// returns.
    pub fn new(offset: u8, initial_high: bool) -> Result<Self, String> {
        let gpio = Gpio::new().map_err(|e| format!("Failed to open GPIO chip: {}", e))?;
        let io = gpio
            .get(offset)
            .map_err(|e| format!("Failed to get GPIO line {}: {}", offset, e))?;
        let pin = if initial_high {
            io.into_output_high()
        } else {
            io.into_output_low()
        };
        debug!(
            "requested GPIO {} as output (initial {})",
            offset,
            if initial_high { "high" } else { "low" }
        );
        Ok(Self { pin, offset })
    }
}

impl OutputLine for HardwareLine {
    fn set_high(&mut self) -> Result<(), String> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), String> {
        self.pin.set_low();
        Ok(())
    }

    fn pin(&self) -> u8 {
        self.offset
    }
}

// ==========================================
// 3. Simulated Line (no GPIO chip required)
// ==========================================
pub struct SimLine {
    offset: u8,
    high: bool,
    transitions: u64,
}

impl SimLine {
    pub fn new(offset: u8, initial_high: bool) -> Self {
        Self {
            offset,
            high: initial_high,
            transitions: 0,
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Number of level writes since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl OutputLine for SimLine {
    fn set_high(&mut self) -> Result<(), String> {
        self.high = true;
        self.transitions += 1;
        trace!("sim GPIO {} -> high", self.offset);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), String> {
        self.high = false;
        self.transitions += 1;
        trace!("sim GPIO {} -> low", self.offset);
        Ok(())
    }

    fn pin(&self) -> u8 {
        self.offset
    }
}

// ==========================================
// 4. Factory Function
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverType {
    Hardware,
    Software,
}

pub fn create_line(t: DriverType, offset: u8, initial_high: bool) -> Result<Box<dyn OutputLine>, String> {
    match t {
        DriverType::Hardware => {
            let line = HardwareLine::new(offset, initial_high)?;
            Ok(Box::new(line))
        }
        DriverType::Software => Ok(Box::new(SimLine::new(offset, initial_high))),
    }
}
