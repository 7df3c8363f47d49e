// Control loop with watchdog
// Each tick drains operator and gyro samples, runs the drive command and publishes
// the module setpoints. Stale operator input (or a stale heading when driving field
// oriented) interrupts the command, which stops the drive.

use std::time::Instant;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    CMD_TIMEOUT, DriveConfig, TOPIC_CMD_DRIVE, TOPIC_HEADING, TOPIC_HEALTH, TOPIC_RT_CONFIG,
    TOPIC_RT_MODULES,
};
use crate::drive::{HeadingSource, HolonomicDriveCommand, OperatorInput, SetpointLatch, SwerveDrive};
use crate::messages::{DriveActuation, HeadingReading, OperatorAxes, RuntimeHealth};

/// Last received sample, handed to the drive command as its input source
struct Latest<T>(T);

impl OperatorInput for Latest<OperatorAxes> {
    fn axes(&mut self) -> OperatorAxes {
        self.0
    }
}

impl HeadingSource for Latest<f64> {
    fn heading(&mut self) -> f64 {
        self.0
    }
}

pub struct Runtime {
    drive: SwerveDrive<SetpointLatch>,
    command: HolonomicDriveCommand,
    latest_axes: Option<OperatorAxes>,
    axes_received_at: Instant,
    latest_heading: Option<f64>,
    heading_received_at: Instant,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            drive: SwerveDrive::with_latches(config),
            command: HolonomicDriveCommand::new(config.joystick_deadband),
            latest_axes: None,
            axes_received_at: Instant::now(),
            latest_heading: None,
            heading_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming operator axes
    fn on_command(&mut self, axes: OperatorAxes) {
        self.latest_axes = Some(axes);
        self.axes_received_at = Instant::now();
    }

    /// Process incoming heading
    fn on_heading(&mut self, reading: HeadingReading) {
        self.latest_heading = Some(reading.radians);
        self.heading_received_at = Instant::now();
    }

    fn check_inputs(&self) -> Option<(OperatorAxes, f64)> {
        let axes = self.latest_axes.filter(|_| self.axes_received_at.elapsed() <= CMD_TIMEOUT)?;
        if !self.drive.is_field_oriented() {
            return Some((axes, 0.0));
        }
        let heading = self
            .latest_heading
            .filter(|_| self.heading_received_at.elapsed() <= CMD_TIMEOUT)?;
        Some((axes, heading))
    }

    /// Run the drive command for one cycle and return the resulting setpoints
    fn compute_actuation(&mut self) -> DriveActuation {
        match self.check_inputs() {
            Some((axes, heading)) => {
                if self.health != RuntimeHealth::Ok {
                    info!("Inputs fresh, driving");
                    self.command.initialize();
                }
                self.health = RuntimeHealth::Ok;
                self.command
                    .execute(&mut self.drive, &mut Latest(axes), &mut Latest(heading));
            }
            None => {
                let health = if self
                    .latest_axes
                    .is_some_and(|_| self.axes_received_at.elapsed() <= CMD_TIMEOUT)
                {
                    RuntimeHealth::HeadingStale
                } else {
                    RuntimeHealth::CmdStale
                };

                // Watchdog triggered - stop the robot
                if self.health != health {
                    warn!("Input stale ({:?}), stopping robot", health);
                }
                self.health = health;
                self.command.end(&mut self.drive, true);
            }
        }

        self.drive.actuation()
    }
}

pub async fn run(config: DriveConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_cmd = session.declare_subscriber(TOPIC_CMD_DRIVE).await?;
    let sub_heading = session.declare_subscriber(TOPIC_HEADING).await?;
    let pub_actuation = session.declare_publisher(TOPIC_RT_MODULES).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    // Actuators need gains, timeout and inversion before the first setpoint
    let actuator_config = serde_json::to_string(&config.actuator_config())?;
    session.put(TOPIC_RT_CONFIG, actuator_config).await?;

    let mut runtime = Runtime::new(&config);
    let mut tick = interval(config.control_period());

    info!(
        "Runtime started: {}ms period, {}ms watchdog timeout",
        config.control_period_ms,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_DRIVE, TOPIC_HEADING);
    info!("Publishing to: {}, {}", TOPIC_RT_MODULES, TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain all pending samples (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_cmd.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<OperatorAxes>(&payload) {
                Ok(axes) => runtime.on_command(axes),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_heading.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<HeadingReading>(&payload) {
                Ok(reading) => runtime.on_heading(reading),
                Err(e) => warn!("Failed to parse heading: {}", e),
            }
        }

        // 2. Compute actuation (includes watchdog logic)
        let actuation = runtime.compute_actuation();

        // 3. Publish actuation
        let actuation_json = serde_json::to_string(&actuation)?;
        pub_actuation.put(actuation_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}
