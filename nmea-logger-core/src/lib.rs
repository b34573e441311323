//! # NMEA Logger Core
//!
//! Platform-independent record model and AIS decoding for recorded NMEA logs.
//!
//! Sentence parsing itself is done by the `nmea-parser` crate; [`AisDecoder`]
//! adapts its output to the record model.
//!
//! This crate contains pure parsing and batching logic with **zero I/O
//! dependencies**. File access, compression, exporters and the websocket
//! viewer live in the `nmea-logger` crate.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  nmea-logger-core (no tokio/async deps)                      │
//! │  ├── decoder     (SentenceDecoder, nmea-parser adapter)      │
//! │  ├── record      (LoggerRecord, DecodedPacket, ...)          │
//! │  ├── cache       (static data per vessel)                    │
//! │  └── playback    (time-scaled batching state machine)        │
//! └──────────────────────────────────────────────────────────────┘
//!                              ▲
//!                 ┌────────────┴────────────┐
//!                 │  nmea-logger            │
//!                 │  (convert, dump, view)  │
//!                 └─────────────────────────┘
//! ```
//!
//! ## Supported Messages
//!
//! | Type                | Decoded as      |
//! |---------------------|-----------------|
//! | 1, 2, 3, 18, 19, 27 | Position report |
//! | 5, 24               | Static data     |
//! | other               | `Other`         |
//!
//! ## Example: Decoding a Sentence
//!
//! ```rust
//! use nmea_logger_core::{AisDecoder, DecodedPacket, SentenceDecoder};
//!
//! let mut decoder = AisDecoder::new();
//! let packet = decoder
//!     .decode("!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C")
//!     .unwrap();
//! match packet {
//!     Some(DecodedPacket::PositionReport(report)) => assert_eq!(report.user_id, 477553000),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod cache;
pub mod decoder;
pub mod error;
pub mod playback;
pub mod record;

// Re-export commonly used types
pub use cache::StaticDataCache;
pub use decoder::{AisDecoder, SentenceDecoder, MAX_BUFFERED_FRAGMENTS, MAX_FRAGMENTS};
pub use error::{DecodeError, ScheduleError};
pub use playback::{Flush, PlaybackBatcher, PlaybackRecord, PlaybackSchedule, PlaybackState};
pub use record::{
    DecodedPacket, Dimension, Eta, LoggerRecord, PositionReport, StaticData,
    StructuredRecord, VesselId,
};
