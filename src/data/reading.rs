//! Sensor reading data structures.
//!
//! The AirSense firmware publishes each measurement as a short UTF-8 string
//! such as `"CO2: 415.20 PPM"` or `"Temp: 22.70 C"`.

use crate::error::{Error, Result};

/// A text reading decoded from a characteristic payload.
///
/// Surrounding whitespace is trimmed; the text is otherwise kept as sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading(String);

impl Reading {
    /// Decode a raw payload as UTF-8 and trim it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the payload is not valid UTF-8.
    ///
    /// # Example
    ///
    /// ```
    /// use airsense_ble::Reading;
    ///
    /// let reading = Reading::decode(b" 415.2 \r\n").unwrap();
    /// assert_eq!(reading.as_str(), "415.2");
    /// ```
    pub fn decode(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|e| Error::InvalidData {
            context: format!("reading is not valid UTF-8: {}", e),
        })?;
        Ok(Self(text.trim().to_string()))
    }

    /// The trimmed text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First numeric token of the reading, if any.
    ///
    /// `"CO2: 415.20 PPM"` yields `415.2`, a bare `"22.7"` yields `22.7`.
    pub fn value(&self) -> Option<f64> {
        self.0
            .split_whitespace()
            .filter_map(|token| token.trim_end_matches(',').parse::<f64>().ok())
            .find(|v| v.is_finite())
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One polling iteration's pair of readings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSample {
    /// CO2 reading.
    pub co2: Reading,
    /// Temperature reading.
    pub temperature: Reading,
}

impl SensorSample {
    /// Decode both payloads, CO2 first.
    pub fn decode(co2: &[u8], temperature: &[u8]) -> Result<Self> {
        Ok(Self {
            co2: Reading::decode(co2)?,
            temperature: Reading::decode(temperature)?,
        })
    }
}

impl std::fmt::Display for SensorSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Received CO2: {}, Temp: {}", self.co2, self.temperature)
    }
}
