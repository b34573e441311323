//! Error types for reading, exporting and replaying logs

use std::io;
use std::path::PathBuf;

use nmea_logger_core::{DecodeError, ScheduleError};
use thiserror::Error;

/// Failure reading a line of a log file. Both kinds end the reader.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Line {line}: read failed: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("Line {line}: not a log record: {source}")]
    Format {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Line {line}: cannot decode sentence: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported output format for {}, use .csv, .jsonl or .json", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Write failed: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Cannot serialize batch: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Error on send to websocket: {0}")]
    Send(#[from] axum::Error),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
