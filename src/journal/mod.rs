//! # Command Journal Module
//!
//! Appends one JSON object per dispatched command to a JSON Lines file.
//!
//! ```text
//! {"timestamp":"2024-05-01T12:00:00.000+00:00","name":"pan_left","speed":7,"ok":true}
//! {"timestamp":"2024-05-01T12:00:01.250+00:00","name":"preset_recall","index":4,"ok":false,"error":"Failed to send preset_recall(4): timed out"}
//! ```
//!
//! The journal is a diagnostic aid: a failed write is logged and otherwise
//! ignored so it can never stop the dispatch loop.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::Command;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct JournalRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    command: &'a Command,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Append-only JSONL journal of dispatched commands
#[derive(Debug)]
pub struct CommandJournal {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl CommandJournal {
    /// Open (or create) the journal at `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or file cannot be created
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Journaling commands to {}", path.display());
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the outcome of one command
    pub fn record(&mut self, command: &Command, outcome: &Result<()>) {
        let record = JournalRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            command,
            ok: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
        };
        if let Err(e) = self.write_record(&record) {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    fn write_record(&mut self, record: &JournalRecord<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
