// Swerve drive control
//
// Provides:
// - Vector helpers (rotation, matrix-vector product, polar conversion)
// - Swerve module with shortest-rotation steering
// - Four-module holonomic kinematics, lock and stop
// - The default drive command run every control cycle

pub mod command;
pub mod math;
pub mod module;
pub mod swerve;

pub use command::{CommandState, HeadingSource, HolonomicDriveCommand, OperatorInput, deadband};
pub use module::{Corner, ModuleActuator, SetpointLatch, SwerveModule, TargetAngle, get_target_angle};
pub use swerve::{DriveError, SwerveDrive};
