use ballrig_cmd::config::StepperParams;
use ballrig_cmd::console::{Command, CommandParser, MotorConsole};
use ballrig_cmd::gpio::{create_line, DriverType};
use ballrig_cmd::stepper::StepperMotor;
use std::collections::BTreeMap;

fn sim_console() -> MotorConsole {
    let params = StepperParams {
        steps_per_rev: 360,
        pulse_delay_us: 0,
    };
    let mut motors = BTreeMap::new();
    for (id, step, dir, en) in [(1u8, 4u8, 3u8, 2u8), (2, 22, 27, 17)] {
        let motor = StepperMotor::new(
            create_line(DriverType::Software, step, false).unwrap(),
            create_line(DriverType::Software, dir, false).unwrap(),
            create_line(DriverType::Software, en, true).unwrap(),
            &params,
        );
        motors.insert(id, motor);
    }
    MotorConsole::new(motors)
}

#[test]
fn test_parse_motor_command() {
    let parser = CommandParser::new();
    assert_eq!(
        parser.parse("motor 2: -90.5").unwrap(),
        Command::Rotate { motor: 2, degrees: -90.5 }
    );
}

#[test]
fn test_parse_tolerates_case_and_spacing() {
    let parser = CommandParser::new();
    assert_eq!(
        parser.parse("  MOTOR 1 :45  ").unwrap(),
        Command::Rotate { motor: 1, degrees: 45.0 }
    );
}

#[test]
fn test_parse_enable_disable_exit() {
    let parser = CommandParser::new();
    assert_eq!(parser.parse("enable 3").unwrap(), Command::Enable(3));
    assert_eq!(parser.parse("disable 1").unwrap(), Command::Disable(1));
    assert_eq!(parser.parse("exit").unwrap(), Command::Exit);
}

#[test]
fn test_parse_rejects_unknown_verbs() {
    let parser = CommandParser::new();
    assert_eq!(parser.parse("rotate 1 90").unwrap_err(), "Invalid command.");
}

#[test]
fn test_parse_rejects_bad_motor_syntax() {
    let parser = CommandParser::new();
    assert_eq!(
        parser.parse("motor one: 90").unwrap_err(),
        "Invalid input format. Use 'motor <id>: <deg>'"
    );
    assert_eq!(
        parser.parse("motor 1 90").unwrap_err(),
        "Invalid input format. Use 'motor <id>: <deg>'"
    );
}

#[test]
fn test_parse_rejects_bad_enable_syntax() {
    let parser = CommandParser::new();
    assert_eq!(parser.parse("enable x").unwrap_err(), "Invalid input. Use 'enable <id>'");
}

#[test]
fn test_exit_stops_the_loop() {
    let mut console = sim_console();
    assert!(!console.handle(Command::Exit));
}

#[test]
fn test_enable_updates_motor_state() {
    let mut console = sim_console();
    assert!(console.handle(Command::Enable(1)));
    assert!(console.motor(1).unwrap().is_enabled());

    assert!(console.handle(Command::Disable(1)));
    assert!(!console.motor(1).unwrap().is_enabled());
}

#[test]
fn test_unknown_motor_id_is_reported_not_fatal() {
    let mut console = sim_console();
    assert!(console.handle(Command::Rotate { motor: 9, degrees: 10.0 }));
    assert!(console.handle(Command::Enable(9)));
}

#[test]
fn test_rotate_releases_the_motor_afterwards() {
    let mut console = sim_console();
    assert!(console.handle(Command::Enable(2)));
    assert!(console.handle(Command::Rotate { motor: 2, degrees: 15.0 }));
    assert!(!console.motor(2).unwrap().is_enabled());
}
