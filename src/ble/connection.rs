//! BLE connection management.
//!
//! Handles connecting to the sensor and reading from its characteristics.

use async_trait::async_trait;
use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::ble::characteristics::{CharacteristicHandle, ServiceInfo};
use crate::ble::scanner::peripheral_address;
use crate::ble::traits::GattSession;
use crate::error::{Error, Result};

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// An open btleplug connection to one peripheral.
pub struct BleSession {
    /// The connected peripheral.
    peripheral: Peripheral,
    /// Address the session was opened for.
    address: String,
    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,
}

impl BleSession {
    /// Connect to a peripheral and discover its services.
    ///
    /// A single attempt is made; there is no retry or backoff.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] if the link cannot be established.
    pub async fn connect(peripheral: Peripheral) -> Result<Self> {
        let session = Self {
            address: peripheral_address(&peripheral),
            peripheral,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        };

        session.set_state(ConnectionState::Connecting);

        if session.peripheral.is_connected().await.unwrap_or(false) {
            info!("Peripheral {} already connected at BLE level", session.address);
        } else if let Err(e) = session.peripheral.connect().await {
            warn!("Connection to {} failed: {}", session.address, e);
            session.set_state(ConnectionState::Disconnected);
            return Err(Error::ConnectionFailed {
                reason: e.to_string(),
            });
        }

        info!("Connected to {}", session.address);

        if let Err(e) = session.peripheral.discover_services().await {
            warn!("Failed to discover services: {}", e);
        }

        session.set_state(ConnectionState::Connected);
        Ok(session)
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Address of the connected peripheral.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Update the connection state.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!(
                "Connection state of {} changed: {} -> {}",
                self.address, old_state, new_state
            );
        }
    }
}

#[async_trait]
impl GattSession for BleSession {
    async fn is_connected(&self) -> Result<bool> {
        let connected = self
            .peripheral
            .is_connected()
            .await
            .map_err(Error::Bluetooth)?;

        if !connected && self.state().is_connected() {
            self.set_state(ConnectionState::Disconnected);
        }

        Ok(connected)
    }

    async fn services(&self) -> Result<Vec<ServiceInfo>> {
        let mut services = self.peripheral.services();
        if services.is_empty() {
            self.peripheral
                .discover_services()
                .await
                .map_err(Error::Bluetooth)?;
            services = self.peripheral.services();
        }

        debug!("Discovered {} services", services.len());

        Ok(services
            .into_iter()
            .map(|service| ServiceInfo {
                uuid: service.uuid.to_string(),
                characteristics: service
                    .characteristics
                    .into_iter()
                    .map(|c| CharacteristicHandle::new(c.uuid.to_string()))
                    .collect(),
            })
            .collect())
    }

    async fn read(&self, characteristic: &CharacteristicHandle) -> Result<Vec<u8>> {
        if !self.state().is_connected() {
            return Err(Error::NotConnected);
        }

        let target = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid.to_string() == characteristic.uuid)
            .ok_or_else(|| Error::UnknownCharacteristic {
                uuid: characteristic.uuid.clone(),
            })?;

        let data = self
            .peripheral
            .read(&target)
            .await
            .map_err(Error::Bluetooth)?;

        trace!(
            "Read {} bytes from characteristic {}",
            data.len(),
            characteristic.uuid
        );

        Ok(data)
    }

    async fn disconnect(&self) -> Result<()> {
        let current_state = self.state();

        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        match self.peripheral.disconnect().await {
            Ok(_) => {
                info!("Disconnected from {}", self.address);
                self.set_state(ConnectionState::Disconnected);
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                self.set_state(ConnectionState::Disconnected);
                Err(Error::Bluetooth(e))
            }
        }
    }
}
