//! Trait abstractions over the BLE host stack.
//!
//! [`Central`] and [`GattSession`] cover exactly the primitives the monitor
//! consumes, so the program flow can run against btleplug or a mock.

use async_trait::async_trait;
use std::time::Duration;

use crate::ble::characteristics::{CharacteristicHandle, ServiceInfo};
use crate::ble::scanner::DiscoveredDevice;
use crate::error::Result;

/// Discovery and connection establishment.
#[cfg_attr(test, mockall::automock(type Session = MockGattSession;))]
#[async_trait]
pub trait Central: Send + Sync {
    /// Session type produced by [`Central::connect`].
    type Session: GattSession;

    /// Scan for advertisers for `duration` and report every device seen.
    async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>>;

    /// Open a session to the device with the given address.
    async fn connect(&self, address: &str) -> Result<Self::Session>;
}

/// An open connection to one peripheral.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GattSession: Send + Sync {
    /// Query the live connection status.
    async fn is_connected(&self) -> Result<bool>;

    /// Enumerate the peripheral's services and their characteristics.
    async fn services(&self) -> Result<Vec<ServiceInfo>>;

    /// Read the raw value of a characteristic.
    async fn read(&self, characteristic: &CharacteristicHandle) -> Result<Vec<u8>>;

    /// Release the connection.
    async fn disconnect(&self) -> Result<()>;
}
