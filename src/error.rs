//! Error types for the airsense-ble crate.

use thiserror::Error;

use crate::ble::characteristics::SensorKind;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No peripheral with the given address was seen by the adapter.
    #[error("Peripheral not found: {address}")]
    PeripheralNotFound {
        /// The address that was searched for.
        address: String,
    },

    /// Operation requires a connection but the session is not connected.
    #[error("Device not connected")]
    NotConnected,

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// One of the sensor characteristics is absent from the service tree.
    #[error("{sensor} characteristic {short_uuid} not found.")]
    CharacteristicNotFound {
        /// Which sensor was being resolved.
        sensor: SensorKind,
        /// The short-form UUID that was searched for.
        short_uuid: String,
    },

    /// A characteristic handle does not belong to the connected peripheral.
    #[error("Unknown characteristic: {uuid}")]
    UnknownCharacteristic {
        /// The full UUID of the handle.
        uuid: String,
    },

    /// Invalid data was received from the device.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// Writing console output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The sensor whose characteristic could not be resolved, if that is
    /// what this error reports.
    pub fn missing_sensor(&self) -> Option<SensorKind> {
        match self {
            Self::CharacteristicNotFound { sensor, .. } => Some(*sensor),
            _ => None,
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
