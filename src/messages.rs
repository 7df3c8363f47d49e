// Message types exchanged with the operator station, the gyro and the module hardware

use serde::{Deserialize, Serialize};

use crate::drive::module::InversionFlags;

// Operator -> runtime
// Normalized joystick axes in [-1, 1], not yet deadbanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorAxes {
    pub forward: f64,
    pub strafe: f64,
    pub rotation: f64,
}

// Gyro -> runtime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingReading {
    pub radians: f64,
}

/// Latest setpoint handed to one module's actuators
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSetpoint {
    pub index: usize,
    /// Signed drive velocity
    pub speed: f64,
    /// Steering position in radians
    pub angle: f64,
    /// Steering position in encoder ticks, mechanical offset included
    pub steering_ticks: f64,
    pub steering_enabled: bool,
}

// Runtime -> module hardware, once per cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveActuation {
    pub modules: [ModuleSetpoint; 4],
}

/// Closed-loop gains for the steering controllers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidfGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub kf: f64,
}

// Runtime -> module hardware, once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub steering_pidf: PidfGains,
    pub command_timeout_ms: u64,
    pub inversion: [InversionFlags; 4],
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    HeadingStale,
}
