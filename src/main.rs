//! Command-line reader for the AirSense CO2 sensor.
//!
//! Scans for the sensor, connects, and prints CO2 and temperature readings
//! every two seconds until Ctrl+C.
//!
//! Run with: cargo run --bin airsense

use airsense_ble::{spawn_shutdown, BleScanner, Monitor, MonitorConfig, Result};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so readings on stdout stay clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("airsense=warn,airsense_ble=warn")),
        )
        .init();

    // Armed before scanning so Ctrl+C at any stage still releases the session.
    let shutdown = spawn_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    });

    let scanner = BleScanner::new().await?;
    let monitor = Monitor::new(scanner, MonitorConfig::default());

    let mut stdout = std::io::stdout();
    let outcome = monitor.run(&mut stdout, shutdown).await?;
    debug!("Monitor finished: {:?}", outcome);

    Ok(())
}
