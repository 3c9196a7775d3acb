//! Append-only record of every successful prediction.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use parking_lot::Mutex;
use radx_features::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::condition::Region;
use crate::diagnosis::DecisionSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// RFC 3339, UTC.
    pub timestamp: String,
    /// Base name of the uploaded file.
    pub image: String,
    pub region: Region,
    pub prediction: String,
    pub confidence: f64,
    pub features: FeatureVector,
    pub model_version: String,
    pub source: DecisionSource,
}

impl PredictionRecord {
    pub fn new(
        image_path: &Path,
        region: Region,
        prediction: &str,
        confidence: f64,
        features: FeatureVector,
        model_version: &str,
        source: DecisionSource,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            image: image_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            region,
            prediction: prediction.to_string(),
            confidence,
            features,
            model_version: model_version.to_string(),
            source,
        }
    }
}

struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    fn append(&self, record: &PredictionRecord) -> io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.lock().write_all(&line)
    }
}

/// Emits one `info` line per prediction and, optionally, a JSON line per
/// prediction to a file. Never reports failure to the caller.
#[derive(Default)]
pub struct PredictionLogger {
    sink: Option<JsonLinesSink>,
}

impl PredictionLogger {
    /// Log through the `log` facade only.
    pub fn facade_only() -> Self {
        Self { sink: None }
    }

    /// Also append JSON lines to `path`, creating it if needed.
    pub fn with_file(path: &Path) -> io::Result<Self> {
        Ok(Self {
            sink: Some(JsonLinesSink::open(path)?),
        })
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    pub fn record(&self, record: &PredictionRecord) {
        info!(
            "prediction logged: {} ({:.2}) for {} [{} via {}, model {}]",
            record.prediction,
            record.confidence,
            record.region,
            record.image,
            record.source,
            record.model_version
        );
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.append(record) {
                warn!("failed to append prediction to {}: {e}", sink.path.display());
            }
        }
    }
}

impl std::fmt::Debug for PredictionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionLogger")
            .field("log_path", &self.log_path())
            .finish()
    }
}
