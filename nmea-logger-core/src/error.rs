//! Error types for sentence decoding and playback scheduling

use thiserror::Error;

/// Errors that can occur when decoding a sentence
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// `!xxVDM` / `!xxVDO` sentence with unreadable fragment fields
    #[error("Malformed sentence: {0}")]
    Malformed(String),

    /// Fragment count/number fields are not usable
    #[error("Invalid fragment {number} of {count}")]
    InvalidFragment { number: u32, count: u32 },

    /// The NMEA parser refused the sentence
    #[error("Cannot parse sentence: {0}")]
    Rejected(String),
}

/// Invalid playback speed or collection period
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScheduleError {
    #[error("Playback speed must be a positive number, got {0}")]
    InvalidSpeed(f64),

    #[error("Playback update period must be positive, got {0:?}")]
    InvalidPeriod(std::time::Duration),
}
