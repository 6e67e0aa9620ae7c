//! BLE scanning functionality.
//!
//! Provides the scanner for discovering nearby advertisers and opening
//! sessions to them.

use async_trait::async_trait;
use btleplug::api::{BDAddr, Central as _, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::ble::connection::BleSession;
use crate::ble::traits::Central;
use crate::error::{Error, Result};

/// A device seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveredDevice {
    /// Advertised local name, if any.
    pub name: Option<String>,
    /// Platform address (MAC on Linux/Windows, peripheral UUID on macOS).
    pub address: String,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Create a device entry.
    pub fn new(name: Option<&str>, address: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            address: address.into(),
            rssi: None,
        }
    }
}

/// Return the first device whose advertised name equals `name`.
pub fn find_device_by_name<'a>(
    devices: &'a [DiscoveredDevice],
    name: &str,
) -> Option<&'a DiscoveredDevice> {
    devices.iter().find(|d| d.name.as_deref() == Some(name))
}

/// Address string used to identify a peripheral.
///
/// CoreBluetooth hides MAC addresses and reports all zeroes, so the
/// peripheral id stands in there.
pub(crate) fn peripheral_address(peripheral: &Peripheral) -> String {
    let address = peripheral.address();
    if address == BDAddr::default() {
        peripheral.id().to_string()
    } else {
        address.to_string()
    }
}

/// BLE scanner backed by the first system Bluetooth adapter.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a new BLE scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Snapshot every peripheral the adapter currently knows about.
    async fn collect_devices(&self) -> Result<Vec<DiscoveredDevice>> {
        let peripherals = self.adapter.peripherals().await.map_err(Error::Bluetooth)?;
        let mut devices = Vec::with_capacity(peripherals.len());

        for peripheral in peripherals {
            let properties = match peripheral.properties().await {
                Ok(Some(p)) => p,
                _ => continue,
            };

            devices.push(DiscoveredDevice {
                name: properties.local_name,
                address: peripheral_address(&peripheral),
                rssi: properties.rssi,
            });
        }

        Ok(devices)
    }
}

#[async_trait]
impl Central for BleScanner {
    type Session = BleSession;

    async fn discover(&self, duration: Duration) -> Result<Vec<DiscoveredDevice>> {
        info!("Starting BLE scan for {:?}", duration);

        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                Some(event) = events.next() => {
                    if let CentralEvent::DeviceDiscovered(id) = event {
                        trace!("Device discovered: {:?}", id);
                    }
                }
            }
        }

        self.adapter.stop_scan().await.map_err(Error::Bluetooth)?;

        let devices = self.collect_devices().await?;
        debug!("Scan finished with {} devices", devices.len());

        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<BleSession> {
        let peripherals = self.adapter.peripherals().await.map_err(Error::Bluetooth)?;

        let peripheral = peripherals
            .into_iter()
            .find(|p| peripheral_address(p) == address)
            .ok_or_else(|| Error::PeripheralNotFound {
                address: address.to_string(),
            })?;

        BleSession::connect(peripheral).await
    }
}
