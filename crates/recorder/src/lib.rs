//! # Recorder
//!
//! Best-effort raw event recording.
//!
//! - `LogRecorder`: one structured log line per event
//! - `FileRecorder`: one JSON line per event appended to a file
//!
//! Recorders never see shaped payloads, only the event as accepted.

mod file;
mod log;

pub use self::file::{FileRecorder, FileRecorderConfig};
pub use self::log::LogRecorder;

use contracts::{EventRecorder, RecorderConfig, RecorderKind, RelayError, WorkOrderEvent};

/// Recorder built from configuration
pub enum ConfiguredRecorder {
    Log(LogRecorder),
    File(FileRecorder),
}

impl ConfiguredRecorder {
    /// Build the configured recorder, `None` when recording is disabled
    ///
    /// # Errors
    /// Returns an error when the file recorder cannot open its file.
    pub async fn from_config(config: &RecorderConfig) -> Result<Option<Self>, RelayError> {
        match config.kind {
            RecorderKind::None => Ok(None),
            RecorderKind::Log => Ok(Some(Self::Log(LogRecorder::new("log")))),
            RecorderKind::File => {
                let file_config = FileRecorderConfig::from_params(&config.params)
                    .map_err(|e| RelayError::recorder("file", e))?;
                let recorder = FileRecorder::open("file", file_config)
                    .await
                    .map_err(|e| RelayError::recorder("file", e.to_string()))?;
                Ok(Some(Self::File(recorder)))
            }
        }
    }
}

impl EventRecorder for ConfiguredRecorder {
    fn name(&self) -> &str {
        match self {
            Self::Log(r) => r.name(),
            Self::File(r) => r.name(),
        }
    }

    async fn record(&mut self, event: &WorkOrderEvent) -> Result<(), RelayError> {
        match self {
            Self::Log(r) => r.record(event).await,
            Self::File(r) => r.record(event).await,
        }
    }

    async fn flush(&mut self) -> Result<(), RelayError> {
        match self {
            Self::Log(r) => r.flush().await,
            Self::File(r) => r.flush().await,
        }
    }
}
