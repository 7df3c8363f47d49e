// Timeouts, topics and robot configuration
use std::f64::consts::{PI, TAU};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drive::module::ModuleConfig;
use crate::messages::{ActuatorConfig, PidfGains};

// Runtime loop frequency (20 ms control period)
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_DRIVE: &str = "swerve/cmd/drive"; // operator axes
pub const TOPIC_HEADING: &str = "swerve/state/heading"; // gyro heading
pub const TOPIC_RT_MODULES: &str = "swerve/rt/modules"; // module setpoints
pub const TOPIC_RT_CONFIG: &str = "swerve/rt/config"; // actuator configuration
pub const TOPIC_HEALTH: &str = "swerve/state/health"; // health status

// Steering encoder resolution
pub const TICKS_PER_RADIAN: f64 = 1024.0 / TAU;

/// Error types for loading the drive configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Immutable drive configuration, built once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Chassis length in meters
    pub robot_length: f64,
    /// Chassis width in meters
    pub robot_width: f64,
    /// Scales the forward and strafe axes
    pub speed_multiplier: f64,
    /// Scales the rotation axis
    pub rotation_multiplier: f64,
    pub joystick_deadband: f64,
    /// Interpret translation in field coordinates
    pub field_oriented: bool,
    /// In module order: front-right, front-left, back-right, back-left
    pub modules: [ModuleConfig; 4],
    pub steering_pidf: PidfGains,
    pub actuator_timeout_ms: u64,
    pub control_period_ms: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        let offsets = [-1720, -1690, -1141, 1];
        Self {
            robot_length: 0.75,
            robot_width: 0.75,
            speed_multiplier: 0.7,
            rotation_multiplier: PI,
            joystick_deadband: 0.05,
            field_oriented: true,
            modules: offsets.map(|mechanical_offset| ModuleConfig {
                mechanical_offset,
                ..Default::default()
            }),
            steering_pidf: PidfGains::default(),
            actuator_timeout_ms: 10,
            control_period_ms: 1000 / LOOP_HZ,
        }
    }
}

impl DriveConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading drive config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("robot_length", self.robot_length)?;
        positive("robot_width", self.robot_width)?;

        if !self.speed_multiplier.is_finite() || !self.rotation_multiplier.is_finite() {
            return Err(ConfigError::Invalid("multipliers must be finite".to_string()));
        }
        if !(0.0..1.0).contains(&self.joystick_deadband) {
            return Err(ConfigError::Invalid(format!(
                "joystick_deadband must be in [0, 1), got {}",
                self.joystick_deadband
            )));
        }
        if self.control_period_ms == 0 {
            return Err(ConfigError::Invalid("control_period_ms must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    /// Settings the module hardware needs before the first setpoint
    pub fn actuator_config(&self) -> ActuatorConfig {
        ActuatorConfig {
            steering_pidf: self.steering_pidf,
            command_timeout_ms: self.actuator_timeout_ms,
            inversion: self.modules.map(|m| m.inversion),
        }
    }
}
