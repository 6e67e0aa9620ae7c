//! Monitor configuration.
//!
//! All values are fixed at build time; [`MonitorConfig::default`] yields them.
//! The `with_*` builders exist for embedders and tests.

use std::time::Duration;

use crate::ble::uuids::{
    CO2_SHORT_UUID, DEFAULT_POLL_INTERVAL, DEFAULT_SCAN_DURATION, DEVICE_NAME,
    TEMPERATURE_SHORT_UUID,
};

/// Process-wide immutable settings for one monitor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Advertised name of the sensor.
    pub device_name: String,
    /// Short UUID of the CO2 characteristic.
    pub co2_uuid: String,
    /// Short UUID of the Temperature characteristic.
    pub temperature_uuid: String,
    /// Delay between polling iterations.
    pub poll_interval: Duration,
    /// Length of the discovery scan.
    pub scan_duration: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            co2_uuid: CO2_SHORT_UUID.to_string(),
            temperature_uuid: TEMPERATURE_SHORT_UUID.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            scan_duration: DEFAULT_SCAN_DURATION,
        }
    }
}

impl MonitorConfig {
    /// Set the advertised device name to look for.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the scan duration.
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }
}
