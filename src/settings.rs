//! Tuning command surface
//!
//! The presentation layer (web interface) funnels its two relay-relevant
//! commands through here and renders whatever status string comes back.
//! Errors are turned into status strings at this boundary; nothing
//! propagates past it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::encoder::EncoderController;
use crate::tuner::{ControlLines, Rx5808};

/// Commands accepted from the settings interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCommand {
    /// Tune to an exact channel-table frequency in MHz
    SetFrequency(u16),
    /// Stop-then-start the encoder subprocess
    RestartStream,
}

/// Settings executor over the tuner driver and the encoder controller
///
/// The driver mutex is the cross-task form of the protocol's exclusivity
/// invariant: one register transaction at a time, run to completion.
pub struct TunerSettings<L: ControlLines + Send + 'static> {
    driver: Arc<Mutex<Rx5808<L>>>,
    controller: Arc<EncoderController>,
}

impl<L: ControlLines + Send + 'static> TunerSettings<L> {
    pub fn new(driver: Rx5808<L>, controller: Arc<EncoderController>) -> Self {
        Self {
            driver: Arc::new(Mutex::new(driver)),
            controller,
        }
    }

    /// Shared handle to the driver, for status readouts elsewhere
    pub fn driver(&self) -> Arc<Mutex<Rx5808<L>>> {
        Arc::clone(&self.driver)
    }

    /// Execute one command and report a human-readable status string
    pub async fn execute(&self, command: SettingsCommand) -> String {
        match command {
            SettingsCommand::SetFrequency(mhz) => {
                // The driver's fixed settle sleeps must not stall the
                // runtime and are not cancellable once started.
                let driver = Arc::clone(&self.driver);
                let result =
                    tokio::task::spawn_blocking(move || driver.lock().set_frequency(mhz)).await;
                match result {
                    Ok(Ok(status)) => status,
                    Ok(Err(e)) => {
                        tracing::warn!(mhz, error = %e, "set frequency failed");
                        format!("error: {e}")
                    }
                    Err(e) => format!("error: tuner task failed: {e}"),
                }
            }
            SettingsCommand::RestartStream => match self.controller.restart().await {
                Ok(()) => "stream restarted".to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "stream restart failed");
                    format!("error: {e}")
                }
            },
        }
    }

    /// Currently tuned frequency as a display string
    pub async fn current_frequency(&self) -> String {
        let driver = Arc::clone(&self.driver);
        let result = tokio::task::spawn_blocking(move || driver.lock().frequency()).await;
        match result {
            Ok(Ok(frequency)) => frequency.to_string(),
            Ok(Err(e)) => format!("error: {e}"),
            Err(e) => format!("error: tuner task failed: {e}"),
        }
    }
}
