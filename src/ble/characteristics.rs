//! GATT service tree model and sensor characteristic resolution.

use tracing::{debug, trace};

use crate::ble::uuids::uuid_matches_short;
use crate::error::{Error, Result};

/// Which of the two AirSense sensors a characteristic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// CO2 concentration.
    Co2,
    /// Ambient temperature.
    Temperature,
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Co2 => write!(f, "CO2"),
            Self::Temperature => write!(f, "Temperature"),
        }
    }
}

/// A readable characteristic, identified by its UUID string as the stack reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacteristicHandle {
    /// Full UUID, typically lowercase.
    pub uuid: String,
}

impl CharacteristicHandle {
    /// Create a handle for the given UUID.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}

/// A GATT service and its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceInfo {
    /// Service UUID.
    pub uuid: String,
    /// Characteristics exposed by the service.
    pub characteristics: Vec<CharacteristicHandle>,
}

/// The two characteristics the poller reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorCharacteristics {
    /// CO2 characteristic.
    pub co2: CharacteristicHandle,
    /// Temperature characteristic.
    pub temperature: CharacteristicHandle,
}

/// Find the CO2 and Temperature characteristics in a service tree.
///
/// Every characteristic of every service is checked against both short UUIDs;
/// the first match per sensor wins. A missing CO2 characteristic is reported
/// before a missing Temperature one, so only one absence is reported per call.
///
/// # Errors
///
/// Returns [`Error::CharacteristicNotFound`] naming the first missing sensor.
pub fn resolve(
    services: &[ServiceInfo],
    co2_short: &str,
    temperature_short: &str,
) -> Result<SensorCharacteristics> {
    let mut co2 = None;
    let mut temperature = None;

    for service in services {
        for characteristic in &service.characteristics {
            trace!(
                "Found characteristic: {} in service {}",
                characteristic.uuid,
                service.uuid
            );

            if co2.is_none() && uuid_matches_short(&characteristic.uuid, co2_short) {
                debug!("CO2 characteristic resolved to {}", characteristic.uuid);
                co2 = Some(characteristic.clone());
            } else if temperature.is_none()
                && uuid_matches_short(&characteristic.uuid, temperature_short)
            {
                debug!(
                    "Temperature characteristic resolved to {}",
                    characteristic.uuid
                );
                temperature = Some(characteristic.clone());
            }
        }
    }

    let co2 = co2.ok_or_else(|| Error::CharacteristicNotFound {
        sensor: SensorKind::Co2,
        short_uuid: co2_short.to_string(),
    })?;
    let temperature = temperature.ok_or_else(|| Error::CharacteristicNotFound {
        sensor: SensorKind::Temperature,
        short_uuid: temperature_short.to_string(),
    })?;

    Ok(SensorCharacteristics { co2, temperature })
}
