//! Time-scaled playback batching
//!
//! Pure state machine deciding when a batch of records is handed to the
//! viewer and how long to wait afterwards. The async controller in the
//! server crate owns the socket and the actual sleeping.
//!
//! A batch is anchored at the timestamp of its first record. When the next
//! record lies more than `period * speed` of recorded time past the anchor,
//! the batch is flushed and replay pauses for `dt / speed` of real time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::record::{DecodedPacket, PositionReport, StaticData, StructuredRecord};

/// Recorded seconds replayed per real second
pub const DEFAULT_SPEED: f64 = 60.0;

/// Real-time interval between flushes
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

// =============================================================================
// Wire records
// =============================================================================

/// One element of a batch message sent to the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackRecord {
    PositionReport {
        t: i64,
        #[serde(rename = "positionReport")]
        position_report: PositionReport,
    },
    #[serde(rename = "shipStaticData")]
    ShipStaticData {
        t: i64,
        #[serde(rename = "shipStaticData")]
        ship_static_data: StaticData,
    },
}

impl PlaybackRecord {
    /// Convert a pipeline record; packets the viewer does not draw yield `None`
    pub fn from_record(record: StructuredRecord) -> Option<Self> {
        let t = record.timestamp;
        match record.packet {
            DecodedPacket::PositionReport(position_report) => {
                Some(PlaybackRecord::PositionReport { t, position_report })
            }
            DecodedPacket::StaticData(ship_static_data) => {
                Some(PlaybackRecord::ShipStaticData { t, ship_static_data })
            }
            DecodedPacket::Other => None,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            PlaybackRecord::PositionReport { t, .. } => *t,
            PlaybackRecord::ShipStaticData { t, .. } => *t,
        }
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// Speed and collection window of one replay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSchedule {
    speed: f64,
    window_ms: f64,
}

impl PlaybackSchedule {
    pub fn new(speed: f64, period: Duration) -> Result<Self, ScheduleError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ScheduleError::InvalidSpeed(speed));
        }
        if period.is_zero() {
            return Err(ScheduleError::InvalidPeriod(period));
        }
        Ok(PlaybackSchedule {
            speed,
            window_ms: period.as_secs_f64() * speed * 1000.0,
        })
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Span of recorded time gathered into one batch, in milliseconds
    pub fn window_ms(&self) -> f64 {
        self.window_ms
    }

    /// Real time that corresponds to `dt_ms` of recorded time
    pub fn pause_for(&self, dt_ms: i64) -> Duration {
        let micros = dt_ms.max(0) as f64 * 1000.0 / self.speed;
        Duration::from_micros(micros as u64)
    }
}

impl Default for PlaybackSchedule {
    fn default() -> Self {
        PlaybackSchedule {
            speed: DEFAULT_SPEED,
            window_ms: DEFAULT_PERIOD.as_secs_f64() * DEFAULT_SPEED * 1000.0,
        }
    }
}

// =============================================================================
// Batcher
// =============================================================================

/// A batch ready to send, followed by a pause before the next record
#[derive(Debug, Clone, PartialEq)]
pub struct Flush {
    pub records: Vec<PlaybackRecord>,
    pub pause: Duration,
}

#[derive(Debug)]
pub struct PlaybackBatcher {
    schedule: PlaybackSchedule,
    batch: Vec<PlaybackRecord>,
}

impl PlaybackBatcher {
    pub fn new(schedule: PlaybackSchedule) -> Self {
        PlaybackBatcher {
            schedule,
            batch: Vec::new(),
        }
    }

    pub fn schedule(&self) -> &PlaybackSchedule {
        &self.schedule
    }

    /// Add a record, returning the previous batch if this record falls
    /// outside its window. The record itself always ends up in the current
    /// batch.
    pub fn push(&mut self, record: PlaybackRecord) -> Option<Flush> {
        let flush = match self.batch.first() {
            Some(anchor) => {
                let dt = record.timestamp() - anchor.timestamp();
                if dt as f64 > self.schedule.window_ms {
                    Some(Flush {
                        records: std::mem::take(&mut self.batch),
                        pause: self.schedule.pause_for(dt),
                    })
                } else {
                    None
                }
            }
            None => None,
        };
        self.batch.push(record);
        flush
    }

    /// Remaining records at end of input, `None` if there are none
    pub fn finish(&mut self) -> Option<Vec<PlaybackRecord>> {
        if self.batch.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.batch))
        }
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

// =============================================================================
// Connection state
// =============================================================================

/// Lifecycle of one viewer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Replaying,
    Draining,
    Closed,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Replaying => write!(f, "replaying"),
            PlaybackState::Draining => write!(f, "draining"),
            PlaybackState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(t: i64, vessel: u32) -> PlaybackRecord {
        PlaybackRecord::PositionReport {
            t,
            position_report: PositionReport {
                user_id: vessel,
                longitude: Some(1.0),
                latitude: Some(1.0),
                ..Default::default()
            },
        }
    }

    fn timestamps(records: &[PlaybackRecord]) -> Vec<i64> {
        records.iter().map(PlaybackRecord::timestamp).collect()
    }

    #[test]
    fn test_schedule_window() {
        let schedule = PlaybackSchedule::new(60.0, Duration::from_secs(1)).unwrap();
        assert_eq!(schedule.window_ms(), 60_000.0);
        assert_eq!(schedule, PlaybackSchedule::default());

        let schedule = PlaybackSchedule::new(4.0, Duration::from_millis(500)).unwrap();
        assert_eq!(schedule.window_ms(), 2_000.0);
    }

    #[test]
    fn test_schedule_rejects_invalid_values() {
        assert_eq!(
            PlaybackSchedule::new(0.0, Duration::from_secs(1)),
            Err(ScheduleError::InvalidSpeed(0.0))
        );
        assert!(PlaybackSchedule::new(f64::NAN, Duration::from_secs(1)).is_err());
        assert!(PlaybackSchedule::new(-2.0, Duration::from_secs(1)).is_err());
        assert_eq!(
            PlaybackSchedule::new(1.0, Duration::ZERO),
            Err(ScheduleError::InvalidPeriod(Duration::ZERO))
        );
    }

    #[test]
    fn test_pause_truncates_to_micros() {
        let schedule = PlaybackSchedule::new(60.0, Duration::from_secs(1)).unwrap();
        // 5200 * 1000 / 60 = 86666.67
        assert_eq!(schedule.pause_for(5200), Duration::from_micros(86_666));
        assert_eq!(schedule.pause_for(-5), Duration::ZERO);
    }

    #[test]
    fn test_dense_records_share_one_batch() {
        let mut batcher = PlaybackBatcher::new(PlaybackSchedule::default());
        assert_eq!(batcher.push(position(0, 1)), None);
        assert_eq!(batcher.push(position(100, 2)), None);
        assert_eq!(batcher.push(position(5200, 3)), None);

        let rest = batcher.finish().unwrap();
        assert_eq!(timestamps(&rest), vec![0, 100, 5200]);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_flush_when_window_exceeded() {
        let schedule = PlaybackSchedule::new(1.0, Duration::from_secs(1)).unwrap();
        let mut batcher = PlaybackBatcher::new(schedule);
        assert_eq!(batcher.push(position(0, 1)), None);
        assert_eq!(batcher.push(position(100, 1)), None);

        let flush = batcher.push(position(5200, 1)).unwrap();
        assert_eq!(timestamps(&flush.records), vec![0, 100]);
        assert_eq!(flush.pause, Duration::from_millis(5200));
        assert_eq!(batcher.len(), 1, "triggering record anchors the new batch");

        assert_eq!(timestamps(&batcher.finish().unwrap()), vec![5200]);
    }

    #[test]
    fn test_window_edge_joins_current_batch() {
        let schedule = PlaybackSchedule::new(1.0, Duration::from_secs(1)).unwrap();
        let mut batcher = PlaybackBatcher::new(schedule);
        batcher.push(position(0, 1));
        assert_eq!(batcher.push(position(1000, 1)), None);
        assert!(batcher.push(position(1001, 1)).is_some());
    }

    #[test]
    fn test_window_measured_from_anchor() {
        let schedule = PlaybackSchedule::new(1.0, Duration::from_secs(1)).unwrap();
        let mut batcher = PlaybackBatcher::new(schedule);
        batcher.push(position(0, 1));
        batcher.push(position(900, 1));
        // 1800 - 900 is inside the window, but 1800 - 0 is not
        let flush = batcher.push(position(1800, 1)).unwrap();
        assert_eq!(timestamps(&flush.records), vec![0, 900]);
        assert_eq!(flush.pause, Duration::from_millis(1800));
    }

    #[test]
    fn test_empty_input_has_no_batch() {
        let mut batcher = PlaybackBatcher::new(PlaybackSchedule::default());
        assert_eq!(batcher.finish(), None);
    }

    #[test]
    fn test_other_packets_are_not_replayed() {
        let record = StructuredRecord {
            timestamp: 1,
            packet: DecodedPacket::Other,
        };
        assert_eq!(PlaybackRecord::from_record(record), None);
    }

    #[test]
    fn test_record_wire_format() {
        let value = serde_json::to_value(position(42, 9)).unwrap();
        assert_eq!(value["type"], "positionReport");
        assert_eq!(value["t"], 42);
        assert_eq!(value["positionReport"]["UserID"], 9);
        assert_eq!(value["positionReport"]["Latitude"], 1.0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PlaybackState::Replaying.to_string(), "replaying");
        assert_eq!(PlaybackState::Closed.to_string(), "closed");
    }
}
