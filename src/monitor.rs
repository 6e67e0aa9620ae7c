//! End-to-end monitor flow.
//!
//! Runs the four stages in order: scan for the sensor by name, open a
//! session to its address, resolve the CO2 and Temperature characteristics,
//! then poll them until shutdown. Every user-facing line goes to the
//! supplied writer; diagnostics go through `tracing`.

use std::future::Future;
use std::io::Write;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::ble::characteristics::{self, SensorKind};
use crate::ble::scanner::find_device_by_name;
use crate::ble::traits::{Central, GattSession};
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::poller::{PollSummary, Poller};

/// How a monitor run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No advertiser carried the configured name.
    DeviceNotFound,
    /// The session did not report a live connection.
    ConnectionFailed,
    /// A sensor characteristic is missing from the service tree.
    CharacteristicMissing(SensorKind),
    /// The read loop stopped on shutdown.
    Stopped(PollSummary),
    /// The read loop ended on a read or decode failure.
    ReadFailed,
}

/// Start listening for `signal` now and return a future that resolves once it fires.
///
/// The listener runs on its own task, so a signal such as Ctrl+C is already
/// handled while the monitor is still scanning, connecting or reading.
/// Must be called from within a tokio runtime.
pub fn spawn_shutdown<S>(signal: S) -> impl Future<Output = ()> + Send + 'static
where
    S: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        signal.await;
        let _ = tx.send(());
    });

    async move {
        let _ = rx.await;
    }
}

/// Drives one monitor run against a [`Central`].
pub struct Monitor<C> {
    central: C,
    config: MonitorConfig,
}

impl<C: Central> Monitor<C> {
    /// Create a monitor with the given central and configuration.
    pub fn new(central: C, config: MonitorConfig) -> Self {
        Self { central, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run the monitor until it finishes or `shutdown` resolves.
    ///
    /// Expected conditions (device not found, not connected, missing
    /// characteristic, read failure) are reported on `out` and returned as an
    /// [`Outcome`]. Once a session is acquired it is released exactly once,
    /// whichever way the run ends.
    ///
    /// # Errors
    ///
    /// Returns an error for Bluetooth failures during scan or connect, and
    /// when writing to `out` fails.
    pub async fn run<W, F>(&self, out: &mut W, shutdown: F) -> Result<Outcome>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let name = &self.config.device_name;

        writeln!(out, "Scanning for BLE devices...")?;
        let devices = self.central.discover(self.config.scan_duration).await?;

        let Some(device) = find_device_by_name(&devices, name) else {
            info!("{} not among {} discovered devices", name, devices.len());
            writeln!(out, "Device named '{}' not found.", name)?;
            return Ok(Outcome::DeviceNotFound);
        };

        writeln!(
            out,
            "Found {} with address {}. Attempting to connect...",
            name, device.address
        )?;

        let session = match self.central.connect(&device.address).await {
            Ok(session) => session,
            Err(Error::ConnectionFailed { reason }) => {
                warn!("Connection to {} failed: {}", device.address, reason);
                writeln!(out, "Failed to connect to the device.")?;
                return Ok(Outcome::ConnectionFailed);
            }
            Err(e) => return Err(e),
        };

        let outcome = self.run_session(&session, out, shutdown).await;

        if let Err(e) = session.disconnect().await {
            warn!("Error disconnecting from {}: {}", device.address, e);
        }

        outcome
    }

    /// Stages run while the session is held.
    async fn run_session<S, W, F>(&self, session: &S, out: &mut W, shutdown: F) -> Result<Outcome>
    where
        S: GattSession,
        W: Write,
        F: Future<Output = ()>,
    {
        if !session.is_connected().await? {
            writeln!(out, "Failed to connect to the device.")?;
            return Ok(Outcome::ConnectionFailed);
        }

        writeln!(out, "Connected to {}", self.config.device_name)?;

        let services = session.services().await?;
        let characteristics = match characteristics::resolve(
            &services,
            &self.config.co2_uuid,
            &self.config.temperature_uuid,
        ) {
            Ok(characteristics) => characteristics,
            Err(e) => match e.missing_sensor() {
                Some(sensor) => {
                    writeln!(out, "{}", e)?;
                    return Ok(Outcome::CharacteristicMissing(sensor));
                }
                None => return Err(e),
            },
        };

        writeln!(out, "Reading data (press Ctrl+C to stop)...")?;

        let poller = Poller::new(self.config.poll_interval);
        match poller.run(session, &characteristics, out, shutdown).await {
            Ok(summary) => Ok(Outcome::Stopped(summary)),
            Err(Error::Io(e)) => Err(Error::Io(e)),
            Err(e) => {
                error!("Read loop failed: {}", e);
                writeln!(out, "Read failed: {}", e)?;
                Ok(Outcome::ReadFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::characteristics::{CharacteristicHandle, ServiceInfo};
    use crate::ble::scanner::DiscoveredDevice;
    use crate::ble::traits::{MockCentral, MockGattSession};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::broadcast;

    const CO2: &str = "0000180c-0000-0000-0000-000000002a6e";
    const TEMP: &str = "0000180c-0000-0000-0000-000000002a6f";

    fn sensor_services(uuids: &[&str]) -> Vec<ServiceInfo> {
        vec![ServiceInfo {
            uuid: "0000180c-0000-1000-8000-00805f9b34fb".to_string(),
            characteristics: uuids.iter().map(|u| CharacteristicHandle::new(*u)).collect(),
        }]
    }

    fn central_with_devices(devices: Vec<DiscoveredDevice>) -> MockCentral {
        let mut central = MockCentral::new();
        central
            .expect_discover()
            .times(1)
            .return_once(move |_| Ok(devices));
        central
    }

    fn airsense_devices() -> Vec<DiscoveredDevice> {
        vec![
            DiscoveredDevice::new(Some("Other"), "AA:BB"),
            DiscoveredDevice::new(Some("AirSenseCO2"), "11:22:33:44:55:66"),
        ]
    }

    /// Session that is connected, exposes `uuids`, and must be released once.
    fn connected_session(uuids: &'static [&'static str]) -> MockGattSession {
        let mut session = MockGattSession::new();
        session.expect_is_connected().times(1).returning(|| Ok(true));
        session
            .expect_services()
            .times(1)
            .returning(move || Ok(sensor_services(uuids)));
        session.expect_disconnect().times(1).returning(|| Ok(()));
        session
    }

    async fn run(central: MockCentral, shutdown_after: Duration) -> (Outcome, String) {
        let monitor = Monitor::new(central, MonitorConfig::default());
        let mut out = Vec::new();
        let outcome = monitor
            .run(&mut out, tokio::time::sleep(shutdown_after))
            .await
            .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_device_not_found_never_connects() {
        let mut central = central_with_devices(vec![
            DiscoveredDevice::new(Some("Other"), "AA:BB"),
            DiscoveredDevice::new(None, "CC:DD"),
        ]);
        central.expect_connect().never();

        let (outcome, out) = run(central, Duration::from_secs(1)).await;

        assert_eq!(outcome, Outcome::DeviceNotFound);
        assert_eq!(
            out,
            "Scanning for BLE devices...\nDevice named 'AirSenseCO2' not found.\n"
        );
    }

    #[tokio::test]
    async fn test_connects_to_matching_address_only() {
        let mut central = central_with_devices(airsense_devices());
        central
            .expect_connect()
            .withf(|address: &str| address == "11:22:33:44:55:66")
            .times(1)
            .return_once(|_| {
                let mut session = MockGattSession::new();
                session.expect_is_connected().returning(|| Ok(false));
                session.expect_services().never();
                session.expect_read().never();
                session.expect_disconnect().times(1).returning(|| Ok(()));
                Ok(session)
            });

        let (outcome, out) = run(central, Duration::from_secs(1)).await;

        assert_eq!(outcome, Outcome::ConnectionFailed);
        assert_eq!(
            out,
            "Scanning for BLE devices...\n\
             Found AirSenseCO2 with address 11:22:33:44:55:66. Attempting to connect...\n\
             Failed to connect to the device.\n"
        );
    }

    #[tokio::test]
    async fn test_connect_error_reported_as_connection_failure() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            Err(Error::ConnectionFailed {
                reason: "timeout".to_string(),
            })
        });

        let (outcome, out) = run(central, Duration::from_secs(1)).await;

        assert_eq!(outcome, Outcome::ConnectionFailed);
        assert!(out.ends_with("Failed to connect to the device.\n"));
    }

    #[tokio::test]
    async fn test_missing_co2_skips_read_loop() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            let mut session = connected_session(&[TEMP]);
            session.expect_read().never();
            Ok(session)
        });

        let (outcome, out) = run(central, Duration::from_secs(1)).await;

        assert_eq!(outcome, Outcome::CharacteristicMissing(SensorKind::Co2));
        assert!(out.ends_with("Connected to AirSenseCO2\nCO2 characteristic 2A6E not found.\n"));
    }

    #[tokio::test]
    async fn test_missing_temperature_skips_read_loop() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            let mut session = connected_session(&[CO2]);
            session.expect_read().never();
            Ok(session)
        });

        let (outcome, out) = run(central, Duration::from_secs(1)).await;

        assert_eq!(
            outcome,
            Outcome::CharacteristicMissing(SensorKind::Temperature)
        );
        assert!(out.ends_with("Temperature characteristic 2A6F not found.\n"));
        assert!(!out.contains("Reading data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_until_shutdown() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            let mut session = connected_session(&[CO2, TEMP]);
            let mut seq = Sequence::new();
            let payloads: [(&'static [u8], &'static [u8]); 2] =
                [(b"415.2 ", b"22.7"), (b"416.1", b"22.8")];
            for (co2, temp) in payloads {
                session
                    .expect_read()
                    .withf(|c: &CharacteristicHandle| c.uuid == CO2)
                    .times(1)
                    .in_sequence(&mut seq)
                    .returning(move |_| Ok(co2.to_vec()));
                session
                    .expect_read()
                    .withf(|c: &CharacteristicHandle| c.uuid == TEMP)
                    .times(1)
                    .in_sequence(&mut seq)
                    .returning(move |_| Ok(temp.to_vec()));
            }
            Ok(session)
        });

        let (outcome, out) = run(central, Duration::from_secs(3)).await;

        assert_eq!(outcome, Outcome::Stopped(PollSummary { iterations: 2 }));
        assert_eq!(
            out,
            "Scanning for BLE devices...\n\
             Found AirSenseCO2 with address 11:22:33:44:55:66. Attempting to connect...\n\
             Connected to AirSenseCO2\n\
             Reading data (press Ctrl+C to stop)...\n\
             Received CO2: 415.2, Temp: 22.7\n\
             Received CO2: 416.1, Temp: 22.8\n\
             Stopping read loop...\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_first_iteration() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            let mut session = connected_session(&[CO2, TEMP]);
            let mut seq = Sequence::new();
            session
                .expect_read()
                .withf(|c: &CharacteristicHandle| c.uuid == CO2)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(b"415.2".to_vec()));
            session
                .expect_read()
                .withf(|c: &CharacteristicHandle| c.uuid == TEMP)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(b"22.7".to_vec()));
            Ok(session)
        });

        let monitor = Monitor::new(central, MonitorConfig::default());
        let mut out = Vec::new();
        let outcome = monitor
            .run(&mut out, std::future::ready(()))
            .await
            .unwrap();

        // The iteration in flight completes, then the loop stops and the
        // session is released once (checked by the mock on drop).
        let out = String::from_utf8(out).unwrap();
        assert_eq!(outcome, Outcome::Stopped(PollSummary { iterations: 1 }));
        assert!(out.ends_with("Received CO2: 415.2, Temp: 22.7\nStopping read loop...\n"));
    }

    #[tokio::test]
    async fn test_spawn_shutdown_listens_before_first_poll() {
        // A broadcast receiver only sees messages sent after it subscribed,
        // so the signal is caught only if the listener is armed eagerly.
        let (signal, _) = broadcast::channel::<()>(1);
        let listener = signal.clone();
        let shutdown = spawn_shutdown(async move {
            let mut rx = listener.subscribe();
            let _ = rx.recv().await;
        });

        tokio::task::yield_now().await;
        signal.send(()).expect("listener subscribed before the signal fired");

        tokio::time::timeout(Duration::from_secs(1), shutdown)
            .await
            .expect("shutdown resolves after the signal");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_releases_session() {
        let mut central = central_with_devices(airsense_devices());
        central.expect_connect().times(1).return_once(|_| {
            let mut session = connected_session(&[CO2, TEMP]);
            session
                .expect_read()
                .times(1)
                .returning(|_| Err(Error::NotConnected));
            Ok(session)
        });

        let (outcome, out) = run(central, Duration::from_secs(60)).await;

        assert_eq!(outcome, Outcome::ReadFailed);
        assert!(out.ends_with("Read failed: Device not connected\n"));
    }

    #[tokio::test]
    async fn test_scan_error_propagates() {
        let mut central = MockCentral::new();
        central
            .expect_discover()
            .times(1)
            .return_once(|_| Err(Error::BluetoothUnavailable));
        central.expect_connect().never();

        let monitor = Monitor::new(central, MonitorConfig::default());
        let mut out = Vec::new();
        let result = monitor.run(&mut out, std::future::pending::<()>()).await;

        assert!(matches!(result, Err(Error::BluetoothUnavailable)));
    }

    #[tokio::test]
    async fn test_scan_uses_configured_duration() {
        let mut central = MockCentral::new();
        central
            .expect_discover()
            .with(eq(Duration::from_secs(9)))
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let config = MonitorConfig::default().with_scan_duration(Duration::from_secs(9));
        let monitor = Monitor::new(central, config);
        let mut out = Vec::new();
        let outcome = monitor
            .run(&mut out, std::future::pending::<()>())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::DeviceNotFound);
    }
}
