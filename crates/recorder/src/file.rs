//! FileRecorder - appends events as JSON lines

use contracts::{EventRecorder, RelayError, WorkOrderEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Configuration for FileRecorder
#[derive(Debug, Clone)]
pub struct FileRecorderConfig {
    /// Output file, created if missing
    pub path: PathBuf,
}

impl FileRecorderConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;
        Ok(Self { path })
    }
}

/// Recorder that appends one JSON object per line
pub struct FileRecorder {
    name: String,
    config: FileRecorderConfig,
    file: File,
}

impl FileRecorder {
    /// Open (or create) the output file in append mode
    pub async fn open(name: impl Into<String>, config: FileRecorderConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        let name = name.into();
        debug!(recorder = %name, path = %config.path.display(), "FileRecorder opened");

        Ok(Self { name, config, file })
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn encode(&self, event: &WorkOrderEvent) -> Result<Vec<u8>, RelayError> {
        let mut line = serde_json::to_vec(event)
            .map_err(|e| RelayError::recorder(&self.name, format!("json error: {e}")))?;
        line.push(b'\n');
        Ok(line)
    }
}

impl EventRecorder for FileRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_recorder_record",
        skip(self, event),
        fields(recorder = %self.name, work_order_id = %event.work_order_id)
    )]
    async fn record(&mut self, event: &WorkOrderEvent) -> Result<(), RelayError> {
        let line = self.encode(event)?;
        self.file
            .write_all(&line)
            .await
            .map_err(|e| RelayError::recorder(&self.name, e.to_string()))
    }

    #[instrument(name = "file_recorder_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), RelayError> {
        self.file
            .flush()
            .await
            .map_err(|e| RelayError::recorder(&self.name, e.to_string()))
    }
}
