// Default drive command: joystick axes -> deadband -> holonomic drive, every cycle

use tracing::{info, warn};

use super::module::ModuleActuator;
use super::swerve::SwerveDrive;
use crate::messages::OperatorAxes;

/// Source of the operator's three drive axes
pub trait OperatorInput {
    fn axes(&mut self) -> OperatorAxes;
}

/// Source of the robot heading in radians
pub trait HeadingSource {
    fn heading(&mut self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Running,
    Ended,
}

/// Zero out values whose magnitude is below `threshold`
pub fn deadband(value: f64, threshold: f64) -> f64 {
    if value.abs() < threshold { 0.0 } else { value }
}

/// Drives the base from operator input until interrupted. Never finishes on its own.
pub struct HolonomicDriveCommand {
    state: CommandState,
    deadband: f64,
}

impl HolonomicDriveCommand {
    pub fn new(deadband: f64) -> Self {
        Self {
            state: CommandState::Running,
            deadband,
        }
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    /// (Re)start the command
    pub fn initialize(&mut self) {
        if self.state == CommandState::Ended {
            info!("Drive command resumed");
        }
        self.state = CommandState::Running;
    }

    /// One control cycle. Does nothing once the command has ended.
    pub fn execute<A, I, H>(&mut self, drive: &mut SwerveDrive<A>, input: &mut I, gyro: &mut H)
    where
        A: ModuleActuator,
        I: OperatorInput,
        H: HeadingSource,
    {
        if self.state != CommandState::Running {
            return;
        }

        let axes = input.axes();
        let forward = deadband(axes.forward, self.deadband);
        let strafe = deadband(axes.strafe, self.deadband);
        let rotation = deadband(axes.rotation, self.deadband);

        if let Err(e) = drive.holonomic_drive(forward, strafe, rotation, gyro.heading()) {
            warn!("Holonomic drive failed ({}), stopping", e);
            self.end(drive, true);
        }
    }

    /// Stop the drive and leave the running state
    pub fn end<A: ModuleActuator>(&mut self, drive: &mut SwerveDrive<A>, interrupted: bool) {
        if self.state == CommandState::Ended {
            return;
        }
        info!("Drive command ended (interrupted = {})", interrupted);
        drive.stop();
        self.state = CommandState::Ended;
    }

    pub fn is_finished(&self) -> bool {
        false
    }
}
