//! Log ingestion: turn a JSONL event log into an ordered list of records.
//!
//! Each non-blank line is an envelope whose `data` member holds one
//! [`EventRecord`]:
//!
//! ```text
//! {"data": {"timestamp": 100, "event_type": "insert", ...}}
//! ```
//!
//! Ingestion is all-or-nothing. A single undecodable line fails the whole
//! log; callers never see a partial timeline.

use std::{
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::EventRecord;

/// Errors that can occur while reading an event log.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {} at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("invalid event at {}:{line}: {source}\nline: {text}", path.display())]
    Decode {
        path: PathBuf,
        line: usize,
        text: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = core::result::Result<T, IngestError>;

/// The on-disk shape of one line.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    data: EventRecord,
}

/// Reads every event from the log at `path`, in file order.
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading event log");

    let file = fs::File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    parse_events(io::BufReader::new(file), path)
}

/// Decodes events from any line-oriented reader.
///
/// `path` is only used to label errors.
pub fn parse_events(reader: impl BufRead, path: &Path) -> Result<Vec<EventRecord>> {
    let mut events = Vec::new();
    let mut blank = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let number = idx + 1;
        let line = line.map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            line: number,
            source,
        })?;

        if line.trim().is_empty() {
            blank += 1;
            continue;
        }

        match serde_json::from_str::<Envelope>(&line) {
            Ok(envelope) => events.push(envelope.data),
            Err(source) => {
                warn!(path = %path.display(), line = number, error = %source, "undecodable event line");
                return Err(IngestError::Decode {
                    path: path.to_path_buf(),
                    line: number,
                    text: line,
                    source,
                });
            }
        }
    }

    if blank > 0 {
        debug!(path = %path.display(), blank, "skipped blank lines");
    }
    info!(path = %path.display(), events = events.len(), "event log loaded");

    Ok(events)
}
