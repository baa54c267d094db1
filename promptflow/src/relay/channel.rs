//! The output channel an event relay writes frames onto.

use super::OutwardEvent;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Returned when a frame can no longer be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event channel closed")]
pub struct ChannelClosed;

/// Writing half of a bounded frame channel.
///
/// After the first failed write the channel is considered broken and every
/// later write fails without touching the underlying queue.
#[derive(Debug)]
pub struct EventChannel {
    tx: mpsc::Sender<Bytes>,
    broken: bool,
}

/// Reading half of a frame channel, handed to the transport.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Bytes>,
}

impl EventChannel {
    /// Creates a channel holding up to `capacity` unread frames (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                broken: false,
            },
            EventReceiver { rx },
        )
    }

    /// Encodes and writes one event, waiting for room if the reader is behind.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] if the reader is gone or an earlier write failed.
    pub async fn send(&mut self, event: &OutwardEvent) -> Result<(), ChannelClosed> {
        if self.broken {
            return Err(ChannelClosed);
        }
        if self.tx.send(event.encode()).await.is_err() {
            self.broken = true;
            return Err(ChannelClosed);
        }
        Ok(())
    }

    /// Resolves once the reader has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    /// Closes the channel. The reader sees end of stream after draining.
    pub fn close(self) {
        drop(self);
    }
}

impl EventReceiver {
    /// Receives the next frame, or `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Converts the receiver into a stream of frames.
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<Bytes> {
        ReceiverStream::new(self.rx)
    }
}
