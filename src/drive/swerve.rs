// Holonomic inverse kinematics for a four-module swerve base
// Converts (forward, strafe, rotation) into a speed and steering angle per module.

use std::f64::consts::{FRAC_PI_2, PI};

use tracing::{debug, info};

use super::math::{MathError, cartesian_to_polar, matrix_vector_multiply, rotate_2d};
use super::module::{Corner, ModuleActuator, SetpointLatch, SwerveModule};
use crate::config::DriveConfig;
use crate::messages::DriveActuation;

/// Sign of each module's x lever arm, in module order
const SIGN_X: [f64; 4] = [1.0, 1.0, -1.0, -1.0];
/// Sign of each module's y lever arm, in module order
const SIGN_Y: [f64; 4] = [-1.0, 1.0, 1.0, -1.0];

/// Error types for the drive pipeline
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DriveError {
    #[error("Kinematics error: {0}")]
    Math(#[from] MathError),

    #[error("Expected {expected} wheel velocity components, got {found}")]
    WheelCount { expected: usize, found: usize },
}

/// Chassis dimensions in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisGeometry {
    pub length: f64,
    pub width: f64,
}

impl ChassisGeometry {
    /// Half-width and half-length: lever arms from the rotation center to the wheels
    pub fn lever_arms(&self) -> (f64, f64) {
        (self.width / 2.0, self.length / 2.0)
    }
}

pub struct SwerveDrive<A> {
    modules: [SwerveModule<A>; 4],
    field_oriented: bool,
    geometry: ChassisGeometry,
    speed_multiplier: f64,
    rotation_multiplier: f64,
}

impl SwerveDrive<SetpointLatch> {
    /// Drive whose modules latch their setpoints in memory
    pub fn with_latches(config: &DriveConfig) -> Self {
        Self::new(config, Corner::ALL.map(|c| SetpointLatch::new(c.index())))
    }

    /// Latest setpoint of every module
    pub fn actuation(&self) -> DriveActuation {
        DriveActuation {
            modules: self.modules.each_ref().map(|m| m.actuator().setpoint()),
        }
    }
}

impl<A: ModuleActuator> SwerveDrive<A> {
    /// Build the drive. Actuators are given in module order.
    pub fn new(config: &DriveConfig, actuators: [A; 4]) -> Self {
        let mut corners = Corner::ALL.into_iter();
        let modules = actuators.map(|actuator| {
            let corner = corners.next().unwrap_or(Corner::BackLeft);
            SwerveModule::new(corner, config.modules[corner.index()], actuator)
        });

        info!(
            "Swerve drive: {}x{} m, field oriented = {}",
            config.robot_length, config.robot_width, config.field_oriented
        );

        Self {
            modules,
            field_oriented: config.field_oriented,
            geometry: ChassisGeometry {
                length: config.robot_length,
                width: config.robot_width,
            },
            speed_multiplier: config.speed_multiplier,
            rotation_multiplier: config.rotation_multiplier,
        }
    }

    pub fn modules(&self) -> &[SwerveModule<A>; 4] {
        &self.modules
    }

    pub fn is_field_oriented(&self) -> bool {
        self.field_oriented
    }

    pub fn geometry(&self) -> ChassisGeometry {
        self.geometry
    }

    /// Scale the operator axes and, when field oriented, rotate the translation
    /// into the robot frame
    ///
    /// # Arguments
    /// * `forward` - Forward axis, [-1, 1]
    /// * `strafe` - Sideways axis, [-1, 1]
    /// * `rotation` - Rotation axis, [-1, 1]
    /// * `heading` - Robot heading in radians
    ///
    /// # Returns
    /// `[forward, strafe, rotation]` in the robot frame
    pub fn robot_heading(&self, forward: f64, strafe: f64, rotation: f64, heading: f64) -> [f64; 3] {
        let mut forward = forward * self.speed_multiplier;
        let mut strafe = strafe * self.speed_multiplier;
        let rotation = rotation * self.rotation_multiplier;

        if self.field_oriented {
            [forward, strafe] = rotate_2d(heading, [forward, strafe]);
        }

        [forward, strafe, rotation]
    }

    /// Per-wheel velocity as four consecutive (x, y) pairs, in module order
    pub fn calculate_wheel_velocities(&self, robot_heading: &[f64; 3]) -> Result<[f64; 8], DriveError> {
        let (rx, ry) = self.geometry.lever_arms();

        // Row 2i maps to the wheel's x component, row 2i+1 to its y component
        let mut matrix = [[0.0f64; 3]; 8];
        for i in 0..4 {
            matrix[2 * i] = [0.0, 1.0, rx * SIGN_X[i]];
            matrix[2 * i + 1] = [1.0, 0.0, ry * SIGN_Y[i]];
        }

        let velocities = matrix_vector_multiply(&matrix, robot_heading)?;
        let found = velocities.len();
        velocities
            .try_into()
            .map_err(|_| DriveError::WheelCount { expected: 8, found })
    }

    /// Run one cycle of the kinematics pipeline and hand the result to the modules
    pub fn holonomic_drive(
        &mut self,
        forward: f64,
        strafe: f64,
        rotation: f64,
        heading: f64,
    ) -> Result<(), DriveError> {
        let robot_heading = self.robot_heading(forward, strafe, rotation, heading);
        let velocities = self.calculate_wheel_velocities(&robot_heading)?;

        debug!("Wheel velocities: {:?}", velocities);

        for (module, pair) in self.modules.iter_mut().zip(velocities.chunks_exact(2)) {
            let polar = cartesian_to_polar(pair[0], pair[1]);
            module.drive_toward(polar.magnitude, polar.angle);
        }
        Ok(())
    }

    /// Steering angles of the defensive stance, in module order
    pub fn calculate_lock_angles(&self) -> [f64; 4] {
        let base = FRAC_PI_2 - (self.geometry.width / self.geometry.length).atan();
        [0.0, 1.0, 2.0, 3.0].map(|i| base + i * PI / 2.0)
    }

    /// Stop and turn the wheels into the defensive stance
    pub fn lock(&mut self) {
        info!("Locking drive");
        let angles = self.calculate_lock_angles();
        for (module, angle) in self.modules.iter_mut().zip(angles) {
            module.set_speed(0.0);
            module.set_angle(angle);
        }
    }

    /// Zero every drive and release every steering actuator
    pub fn stop(&mut self) {
        info!("Stopping drive");
        for module in &mut self.modules {
            module.set_speed(0.0);
            module.stop_angle_motor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn robot_relative() -> DriveConfig {
        DriveConfig {
            field_oriented: false,
            ..Default::default()
        }
    }

    fn speeds(drive: &SwerveDrive<SetpointLatch>) -> [f64; 4] {
        drive.actuation().modules.map(|m| m.speed)
    }

    #[test]
    fn test_zero_input_zero_speed() {
        for heading in [0.0, 1.2, -2.9] {
            let mut drive = SwerveDrive::with_latches(&DriveConfig::default());
            drive.holonomic_drive(0.0, 0.0, 0.0, heading).unwrap();
            assert_eq!(speeds(&drive), [0.0; 4]);
        }
    }

    #[test]
    fn test_forward_motion() {
        let mut drive = SwerveDrive::with_latches(&robot_relative());
        drive.holonomic_drive(1.0, 0.0, 0.0, 0.0).unwrap();

        for sp in drive.actuation().modules {
            assert!((sp.speed - 0.7).abs() < EPS);
            assert!((sp.angle - FRAC_PI_2).abs() < EPS);
        }
    }

    #[test]
    fn test_wheel_velocities_layout() {
        let drive = SwerveDrive::with_latches(&robot_relative());
        let v = drive.calculate_wheel_velocities(&[2.0, 3.0, 0.0]).unwrap();
        // Pure translation: x component is strafe, y component is forward
        assert_eq!(v, [3.0, 2.0, 3.0, 2.0, 3.0, 2.0, 3.0, 2.0]);

        let v = drive.calculate_wheel_velocities(&[0.0, 0.0, 1.0]).unwrap();
        let (rx, ry) = drive.geometry().lever_arms();
        for i in 0..4 {
            assert_eq!(v[2 * i], rx * SIGN_X[i]);
            assert_eq!(v[2 * i + 1], ry * SIGN_Y[i]);
        }
    }

    #[test]
    fn test_pure_rotation() {
        let mut drive = SwerveDrive::with_latches(&robot_relative());
        drive.holonomic_drive(0.0, 0.0, 0.5, 0.0).unwrap();

        let (rx, ry) = drive.geometry().lever_arms();
        let expected = 0.5 * PI * rx.hypot(ry);
        let actuation = drive.actuation();

        for (i, sp) in actuation.modules.iter().enumerate() {
            // Same magnitude on every module, the sign depends on the chosen branch
            assert!((sp.speed.abs() - expected).abs() < EPS);

            // Wheel direction is perpendicular to the lever arm
            let radius = [ry * SIGN_Y[i], -rx * SIGN_X[i]];
            let dir = [sp.angle.cos(), sp.angle.sin()];
            assert!((dir[0] * radius[0] + dir[1] * radius[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_field_oriented_zero_heading_matches_robot_relative() {
        let mut field = SwerveDrive::with_latches(&DriveConfig::default());
        let mut robot = SwerveDrive::with_latches(&robot_relative());

        for (f, s, r) in [(0.4, -0.2, 0.1), (-1.0, 0.3, 0.0), (0.0, 0.0, -0.6)] {
            field.holonomic_drive(f, s, r, 0.0).unwrap();
            robot.holonomic_drive(f, s, r, 0.0).unwrap();
            assert_eq!(field.actuation(), robot.actuation());
        }
    }

    #[test]
    fn test_field_oriented_rotates_translation() {
        let drive = SwerveDrive::with_latches(&DriveConfig::default());
        let [forward, strafe, rotation] = drive.robot_heading(1.0, 0.0, 1.0, FRAC_PI_2);
        assert!(forward.abs() < EPS);
        assert!((strafe - 0.7).abs() < EPS);
        assert!((rotation - PI).abs() < EPS);

        let robot = SwerveDrive::with_latches(&robot_relative());
        assert_eq!(robot.robot_heading(1.0, 0.0, 1.0, FRAC_PI_2), [0.7, 0.0, PI]);
    }

    #[test]
    fn test_polar_round_trip_of_wheel_velocities() {
        let drive = SwerveDrive::with_latches(&robot_relative());
        let heading = drive.robot_heading(0.3, -0.8, 0.45, 0.0);
        let v = drive.calculate_wheel_velocities(&heading).unwrap();

        for pair in v.chunks_exact(2) {
            let [x, y] = cartesian_to_polar(pair[0], pair[1]).to_cartesian();
            assert!((x - pair[0]).abs() < EPS);
            assert!((y - pair[1]).abs() < EPS);
        }
    }

    #[test]
    fn test_signed_speed_matches_angle() {
        // Whatever branch a module picks, speed * direction reproduces the wheel velocity
        let mut drive = SwerveDrive::with_latches(&robot_relative());
        let cycles = [(0.2, 0.9, 0.0), (-0.7, -0.1, 0.3), (0.0, -1.0, -0.4), (0.5, 0.5, 0.5)];

        for (f, s, r) in cycles {
            drive.holonomic_drive(f, s, r, 0.0).unwrap();
            let heading = drive.robot_heading(f, s, r, 0.0);
            let v = drive.calculate_wheel_velocities(&heading).unwrap();

            for (i, sp) in drive.actuation().modules.iter().enumerate() {
                assert!((sp.speed * sp.angle.cos() - v[2 * i]).abs() < 1e-9);
                assert!((sp.speed * sp.angle.sin() - v[2 * i + 1]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_lock() {
        let mut drive = SwerveDrive::with_latches(&robot_relative());
        drive.holonomic_drive(1.0, 0.5, 0.2, 0.0).unwrap();
        drive.lock();

        let actuation = drive.actuation();
        for sp in &actuation.modules {
            assert_eq!(sp.speed, 0.0);
            assert!(sp.steering_enabled);
        }
        for i in 1..4 {
            let step = actuation.modules[i].angle - actuation.modules[i - 1].angle;
            assert!((step - FRAC_PI_2).abs() < EPS);
        }
        // Square chassis: first module at 45 degrees
        assert!((actuation.modules[0].angle - PI / 4.0).abs() < EPS);
        assert!((drive.modules()[0].current_angle() - PI / 4.0).abs() < EPS);
    }

    #[test]
    fn test_stop() {
        let mut drive = SwerveDrive::with_latches(&robot_relative());
        drive.holonomic_drive(0.6, 0.0, 0.3, 0.0).unwrap();
        drive.stop();

        for sp in drive.actuation().modules {
            assert_eq!(sp.speed, 0.0);
            assert!(!sp.steering_enabled);
        }
    }

    #[test]
    fn test_modules_in_corner_order() {
        let drive = SwerveDrive::with_latches(&DriveConfig::default());
        let corners: Vec<Corner> = drive.modules().iter().map(|m| m.corner()).collect();
        assert_eq!(corners, Corner::ALL.to_vec());
        assert_eq!(drive.modules()[2].config().mechanical_offset, -1141);
    }
}
