//! BLE names, UUIDs and timing constants.
//!
//! The AirSense firmware exposes one custom service with two string
//! characteristics, both published under their 16-bit SIG assigned numbers.

use std::time::Duration;
use uuid::Uuid;

/// Advertised local name of the AirSense sensor.
pub const DEVICE_NAME: &str = "AirSenseCO2";

/// Short-form UUID of the CO2 characteristic.
pub const CO2_SHORT_UUID: &str = "2A6E";

/// Short-form UUID of the Temperature characteristic.
pub const TEMPERATURE_SHORT_UUID: &str = "2A6F";

/// Bluetooth SIG base UUID that 16- and 32-bit short UUIDs expand into.
pub const BLUETOOTH_BASE_UUID: Uuid = Uuid::from_u128(0x0000_0000_0000_1000_8000_00805f9b34fb);

/// Sensor service advertised by the AirSense firmware.
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180c_0000_1000_8000_00805f9b34fb);
/// CO2 characteristic UUID (Read, Notify).
pub const CO2_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000_2a6e_0000_1000_8000_00805f9b34fb);
/// Temperature characteristic UUID (Read, Notify).
pub const TEMPERATURE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000_2a6f_0000_1000_8000_00805f9b34fb);

/// Delay between two polling iterations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long the scanner listens for advertisements.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(5);

/// Expand a 16- or 32-bit short UUID (hex, any case) onto the SIG base UUID.
///
/// Returns `None` when `short` is not 4 or 8 hex digits.
pub fn expand_short_uuid(short: &str) -> Option<Uuid> {
    if short.len() != 4 && short.len() != 8 {
        return None;
    }
    let value = u32::from_str_radix(short, 16).ok()?;
    Some(Uuid::from_u128(
        BLUETOOTH_BASE_UUID.as_u128() | (u128::from(value) << 96),
    ))
}

/// Check whether a UUID string refers to the given short UUID.
///
/// Matches when `uuid` ends with `short`, ignoring case.
///
/// Compatibility extension beyond the plain suffix rule: a UUID equal to the
/// SIG base expansion of `short` also matches. btleplug reports SIG UUIDs in
/// full 128-bit form (`00002a6e-0000-1000-8000-00805f9b34fb`), which does not
/// end in `2a6e`, so the suffix rule alone would never find them.
pub fn uuid_matches_short(uuid: &str, short: &str) -> bool {
    if short.is_empty() {
        return false;
    }

    let uuid = uuid.to_ascii_lowercase();
    let short = short.to_ascii_lowercase();

    if uuid.ends_with(&short) {
        return true;
    }

    expand_short_uuid(&short)
        .map(|full| full.to_string() == uuid)
        .unwrap_or(false)
}
