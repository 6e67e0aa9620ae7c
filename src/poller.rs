//! Fixed-interval polling of the two sensor characteristics.

use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::ble::characteristics::SensorCharacteristics;
use crate::ble::traits::GattSession;
use crate::data::SensorSample;
use crate::error::Result;

/// Summary of a read loop that stopped gracefully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollSummary {
    /// Number of completed iterations.
    pub iterations: u64,
}

/// Reads CO2 then Temperature, prints them, and waits a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    /// Create a poller with the given inter-iteration delay.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The inter-iteration delay.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read and decode one sample. CO2 is always read before Temperature.
    pub async fn poll_once<S>(
        &self,
        session: &S,
        characteristics: &SensorCharacteristics,
    ) -> Result<SensorSample>
    where
        S: GattSession + ?Sized,
    {
        let co2 = session.read(&characteristics.co2).await?;
        let temperature = session.read(&characteristics.temperature).await?;
        SensorSample::decode(&co2, &temperature)
    }

    /// Poll until `shutdown` resolves.
    ///
    /// `shutdown` is only observed while waiting between iterations, so an
    /// iteration that has started always completes. On shutdown the stopping
    /// message is written and the loop is not re-entered.
    ///
    /// # Errors
    ///
    /// The first read, decode or output failure ends the loop and is returned.
    pub async fn run<S, W, F>(
        &self,
        session: &S,
        characteristics: &SensorCharacteristics,
        out: &mut W,
        shutdown: F,
    ) -> Result<PollSummary>
    where
        S: GattSession + ?Sized,
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut summary = PollSummary::default();

        loop {
            let sample = self.poll_once(session, characteristics).await?;
            summary.iterations += 1;

            debug!(
                co2 = ?sample.co2.value(),
                temperature = ?sample.temperature.value(),
                "Sample {}",
                summary.iterations
            );

            writeln!(out, "{}", sample)?;
            out.flush()?;

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Read loop stopped after {} iterations", summary.iterations);
        writeln!(out, "Stopping read loop...")?;

        Ok(summary)
    }
}
