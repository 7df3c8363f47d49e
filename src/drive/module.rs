// One swerve module: a drive wheel plus its steering actuator.
//
// The module owns its last commanded steering angle and picks the shortest
// rotation to the next target, reversing the wheel when that is closer.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TICKS_PER_RADIAN;
use crate::messages::ModuleSetpoint;

/// Physical corner of a module. The discriminant is the module index.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    FrontRight = 0,
    FrontLeft = 1,
    BackRight = 2,
    BackLeft = 3,
}

impl Corner {
    /// All corners in module index order
    pub const ALL: [Corner; 4] = [
        Corner::FrontRight,
        Corner::FrontLeft,
        Corner::BackRight,
        Corner::BackLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Sign conventions for the two actuators and their sensors
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InversionFlags {
    pub drive_motor: bool,
    pub angle_motor: bool,
    pub drive_sensor: bool,
    pub angle_sensor: bool,
}

/// Per-module calibration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Encoder ticks between the absolute sensor zero and the wheel facing forward
    pub mechanical_offset: i32,
    #[serde(default)]
    pub inversion: InversionFlags,
}

/// Result of the shortest-rotation search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetAngle {
    /// Steering angle to command, in the same continuous domain as the current angle
    pub angle: f64,
    /// True when the wheel points opposite the requested heading and must drive backwards
    pub reversed: bool,
}

impl TargetAngle {
    /// Factor to apply to the requested wheel speed
    pub fn speed_multiplier(&self) -> f64 {
        if self.reversed { -1.0 } else { 1.0 }
    }
}

/// Distance difference below which the two candidates count as a tie
const TIE_TOLERANCE: f64 = 1e-9;

/// Nearest representative of `angle + 2*PI*k` to `reference`
fn nearest_equivalent(reference: f64, angle: f64) -> f64 {
    angle + TAU * ((reference - angle) / TAU).round()
}

/// Choose the steering angle closest to `current` that realizes `desired`
///
/// Candidates are `desired + 2*PI*k` (drive forwards) and `desired + PI + 2*PI*k`
/// (drive backwards). `current` is continuous and is never wrapped. When both
/// candidates are exactly as far away the forward one wins.
pub fn get_target_angle(current: f64, desired: f64) -> TargetAngle {
    let forward = nearest_equivalent(current, desired);
    let backward = nearest_equivalent(current, desired + PI);

    if (forward - current).abs() <= (backward - current).abs() + TIE_TOLERANCE {
        TargetAngle {
            angle: forward,
            reversed: false,
        }
    } else {
        TargetAngle {
            angle: backward,
            reversed: true,
        }
    }
}

/// Setpoint sink for one module's drive and steering actuators
///
/// Closed-loop control lives in the actuator firmware; implementors only
/// forward setpoints.
pub trait ModuleActuator {
    /// Drive velocity setpoint, inversion already applied
    fn set_drive_velocity(&mut self, velocity: f64);

    /// Steering position setpoint in radians and in encoder ticks (offset applied)
    fn set_steering_position(&mut self, radians: f64, ticks: f64);

    /// Release the steering actuator
    fn disable_steering(&mut self);
}

/// Actuator that keeps the latest setpoint in memory so the runtime can publish it
#[derive(Debug, Clone, Default)]
pub struct SetpointLatch {
    setpoint: ModuleSetpoint,
}

impl SetpointLatch {
    pub fn new(index: usize) -> Self {
        Self {
            setpoint: ModuleSetpoint {
                index,
                ..Default::default()
            },
        }
    }

    pub fn setpoint(&self) -> ModuleSetpoint {
        self.setpoint
    }
}

impl ModuleActuator for SetpointLatch {
    fn set_drive_velocity(&mut self, velocity: f64) {
        self.setpoint.speed = velocity;
    }

    fn set_steering_position(&mut self, radians: f64, ticks: f64) {
        self.setpoint.angle = radians;
        self.setpoint.steering_ticks = ticks;
        self.setpoint.steering_enabled = true;
    }

    fn disable_steering(&mut self) {
        self.setpoint.steering_enabled = false;
    }
}

pub struct SwerveModule<A> {
    corner: Corner,
    config: ModuleConfig,
    current_angle: f64,
    actuator: A,
}

impl<A: ModuleActuator> SwerveModule<A> {
    pub fn new(corner: Corner, config: ModuleConfig, actuator: A) -> Self {
        Self {
            corner,
            config,
            current_angle: 0.0,
            actuator,
        }
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn index(&self) -> usize {
        self.corner.index()
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Last commanded steering angle (radians, unwrapped)
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Send a drive velocity setpoint
    pub fn set_speed(&mut self, speed: f64) {
        let velocity = if self.config.inversion.drive_motor {
            -speed
        } else {
            speed
        };
        self.actuator.set_drive_velocity(velocity);
    }

    /// Send a steering setpoint. The angle becomes the reference for the next
    /// shortest-rotation search.
    pub fn set_angle(&mut self, angle: f64) {
        self.current_angle = angle;

        let radians = if self.config.inversion.angle_motor {
            -angle
        } else {
            angle
        };
        let ticks = radians * TICKS_PER_RADIAN + f64::from(self.config.mechanical_offset);
        self.actuator.set_steering_position(radians, ticks);
    }

    pub fn stop_angle_motor(&mut self) {
        self.actuator.disable_steering();
    }

    /// Drive at `speed` towards heading `desired_angle`, taking the shortest
    /// steering rotation and flipping the speed sign when the wheel is reversed
    ///
    /// A zero speed leaves the steering where it is.
    pub fn drive_toward(&mut self, speed: f64, desired_angle: f64) -> TargetAngle {
        if speed == 0.0 {
            self.set_speed(0.0);
            return TargetAngle {
                angle: self.current_angle,
                reversed: false,
            };
        }

        let target = get_target_angle(self.current_angle, desired_angle);
        let signed_speed = speed * target.speed_multiplier();
        debug!(
            "Module {:?}: speed={:.3}, angle={:.3} (reversed={})",
            self.corner, signed_speed, target.angle, target.reversed
        );

        self.set_speed(signed_speed);
        self.set_angle(target.angle);
        target
    }
}
