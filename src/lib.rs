// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # airsense-ble
//!
//! Reads CO2 and temperature from an AirSense sensor over Bluetooth Low
//! Energy.
//!
//! The sensor advertises as `AirSenseCO2` and exposes two string
//! characteristics, CO2 (`2A6E`) and Temperature (`2A6F`). A run goes
//! through four steps in order:
//!
//! 1. **Scan** for nearby advertisers and pick the first one named `AirSenseCO2`.
//! 2. **Connect** to its address and check the link is up.
//! 3. **Resolve** both characteristics by UUID suffix.
//! 4. **Poll** CO2 then Temperature every two seconds until shutdown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airsense_ble::{BleScanner, Monitor, MonitorConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scanner = BleScanner::new().await?;
//!     let monitor = Monitor::new(scanner, MonitorConfig::default());
//!
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!
//!     monitor.run(&mut std::io::stdout(), shutdown).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Addresses are CoreBluetooth peripheral
//! UUIDs rather than MAC addresses.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod poller;

// Re-exports for convenience
pub use ble::characteristics::{CharacteristicHandle, SensorCharacteristics, SensorKind, ServiceInfo};
pub use ble::connection::{BleSession, ConnectionState};
pub use ble::scanner::{find_device_by_name, BleScanner, DiscoveredDevice};
pub use ble::traits::{Central, GattSession};
pub use config::MonitorConfig;
pub use data::{Reading, SensorSample};
pub use error::{Error, Result};
pub use monitor::{spawn_shutdown, Monitor, Outcome};
pub use poller::{PollSummary, Poller};
