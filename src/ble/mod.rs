//! BLE communication module.
//!
//! This module provides the Bluetooth Low Energy side of the monitor:
//! discovering the sensor, holding a session to it, and resolving its
//! characteristics.

pub mod characteristics;
pub mod connection;
pub mod scanner;
pub mod traits;
pub mod uuids;

pub use characteristics::{CharacteristicHandle, SensorCharacteristics, SensorKind, ServiceInfo};
pub use connection::{BleSession, ConnectionState};
pub use scanner::{find_device_by_name, BleScanner, DiscoveredDevice};
pub use traits::{Central, GattSession};
pub use uuids::*;
