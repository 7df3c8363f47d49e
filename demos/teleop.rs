// Keyboard teleop: WASD translate, Z/X rotate, R/F axis scale, Q quit
// Publishes normalized operator axes; the runtime applies deadband and multipliers.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use swerve_zenoh_runtime::config::TOPIC_CMD_DRIVE;
use swerve_zenoh_runtime::messages::OperatorAxes;

const AXIS_SCALES: [f64; 3] = [0.25, 0.5, 1.0]; // fraction of full stick
const INPUT_TIMEOUT_MS: u64 = 100; // Release the sticks after this much time with no input

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_DRIVE).await?;

    info!("Controls: WASD=move, Z/X=rotate, R/F=scale, Q=quit");
    print_scale(0);

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut scale_idx: usize = 0;
    let mut axes = OperatorAxes::default();
    let mut last_movement_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (one control period)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let scale = AXIS_SCALES[scale_idx];

                match code {
                    KeyCode::Char('w') if pressed => axes.forward = scale,
                    KeyCode::Char('s') if pressed => axes.forward = -scale,
                    KeyCode::Char('a') if pressed => axes.strafe = -scale,
                    KeyCode::Char('d') if pressed => axes.strafe = scale,
                    KeyCode::Char('z') if pressed => axes.rotation = scale,
                    KeyCode::Char('x') if pressed => axes.rotation = -scale,

                    KeyCode::Char('r') if pressed => {
                        scale_idx = (scale_idx + 1).min(AXIS_SCALES.len() - 1);
                        print_scale(scale_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        scale_idx = scale_idx.saturating_sub(1);
                        print_scale(scale_idx);
                    }

                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }

                if pressed && matches!(code, KeyCode::Char('w' | 's' | 'a' | 'd' | 'z' | 'x')) {
                    last_movement_input = Instant::now();
                }
            }
        }

        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            axes = OperatorAxes::default();
        }

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&axes)?).await?;
    }

    Ok(())
}

fn print_scale(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Axis scale: {}", label);
}
