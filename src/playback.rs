//! Time-scaled replay of a recorded log to one viewer.
//!
//! One controller runs per viewer connection and owns everything it touches:
//! its own pipeline over its own file handle, its own batch and its own
//! socket. Nothing is shared between connections.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use nmea_logger_core::{
    PlaybackBatcher, PlaybackRecord, PlaybackSchedule, PlaybackState, StructuredRecord,
};
use tokio::sync::broadcast;

use crate::error::{PipelineError, PlaybackError};

/// Where replayed batches go
#[async_trait]
pub trait PlaybackSink: Send {
    /// Send one batch, already serialized as a JSON array
    async fn send_batch(&mut self, batch: String) -> Result<(), PlaybackError>;

    /// Resolves once the viewer has gone away. Must be cancel safe, it is
    /// raced against the pause between batches.
    async fn closed(&mut self);

    /// Close with a normal-closure status
    async fn close(&mut self) -> Result<(), PlaybackError>;
}

/// How a replay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Every record was sent
    Completed,
    /// The viewer closed the connection
    Disconnected,
    /// The server is shutting down
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub batches: usize,
    pub records: usize,
    pub end: PlaybackEnd,
}

pub struct PlaybackController<S> {
    sink: S,
    batcher: PlaybackBatcher,
    shutdown_rx: broadcast::Receiver<()>,
    state: PlaybackState,
    peer_closed: bool,
    batches: usize,
    records: usize,
}

impl<S: PlaybackSink> PlaybackController<S> {
    pub fn new(
        sink: S,
        schedule: PlaybackSchedule,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        PlaybackController {
            sink,
            batcher: PlaybackBatcher::new(schedule),
            shutdown_rx,
            state: PlaybackState::Idle,
            peer_closed: false,
            batches: 0,
            records: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Replay `records` and close the sink.
    ///
    /// The sink is closed on every path, unless the viewer already closed it.
    pub async fn run<I>(&mut self, records: I) -> Result<PlaybackSummary, PlaybackError>
    where
        I: IntoIterator<Item = Result<StructuredRecord, PipelineError>>,
        I::IntoIter: Send,
    {
        self.set_state(PlaybackState::Replaying);
        let result = self.replay(records.into_iter()).await;

        if !self.peer_closed {
            if let Err(e) = self.sink.close().await {
                debug!("Error closing websocket: {}", e);
            }
        }
        self.set_state(PlaybackState::Closed);

        result.map(|end| PlaybackSummary {
            batches: self.batches,
            records: self.records,
            end,
        })
    }

    async fn replay<I>(&mut self, records: I) -> Result<PlaybackEnd, PlaybackError>
    where
        I: Iterator<Item = Result<StructuredRecord, PipelineError>> + Send,
    {
        for record in records {
            let Some(record) = PlaybackRecord::from_record(record?) else {
                continue;
            };
            if let Some(flush) = self.batcher.push(record) {
                self.send(&flush.records).await?;
                if let Some(end) = self.pause(flush.pause).await {
                    return Ok(end);
                }
            }
        }

        self.set_state(PlaybackState::Draining);
        if let Some(rest) = self.batcher.finish() {
            self.send(&rest).await?;
        }
        Ok(PlaybackEnd::Completed)
    }

    async fn send(&mut self, records: &[PlaybackRecord]) -> Result<(), PlaybackError> {
        let message = serde_json::to_string(records)?;
        trace!("Sending batch of {} records", records.len());
        self.sink.send_batch(message).await?;
        self.batches += 1;
        self.records += records.len();
        Ok(())
    }

    /// Wait out the gap before the next batch. Returns early if the viewer
    /// leaves or the server shuts down.
    async fn pause(&mut self, duration: Duration) -> Option<PlaybackEnd> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => None,
            _ = self.sink.closed() => {
                self.peer_closed = true;
                Some(PlaybackEnd::Disconnected)
            },
            _ = self.shutdown_rx.recv() => {
                debug!("Shutdown of playback websocket");
                Some(PlaybackEnd::Shutdown)
            },
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        trace!("Playback {} -> {}", self.state, state);
        self.state = state;
    }
}
