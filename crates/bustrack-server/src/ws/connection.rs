//! Outbound side of one WebSocket client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bustrack_core::{SessionId, TrackerError};
use tokio::sync::mpsc;

/// A connected client as seen by the broadcast hub.
///
/// Frames are queued on a bounded channel drained by the connection's writer
/// task. Queuing never waits: when the queue is full or the writer has gone
/// away the frame is dropped for this client only.
#[derive(Debug)]
pub struct SubscriberConnection {
    /// Connection id. Also the registry key if this client logs in as a publisher.
    pub id: SessionId,
    tx: mpsc::Sender<Arc<String>>,
    connected_at: Instant,
    dropped: AtomicU64,
}

impl SubscriberConnection {
    /// Wrap the sending half of a connection's outbound queue.
    #[must_use]
    pub fn new(id: SessionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::SubscriberUnreachable`] if the queue is full or
    /// closed. The frame is discarded and the drop counter incremented.
    pub fn send(&self, frame: Arc<String>) -> Result<(), TrackerError> {
        self.tx.try_send(frame).map_err(|_| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            TrackerError::SubscriberUnreachable(self.id.clone())
        })
    }

    /// Frames discarded so far.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
