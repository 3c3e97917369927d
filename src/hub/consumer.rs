//! Consumer-side stream handle

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::hub::store::ChannelHub;

/// One registered consumer's view of a channel
///
/// Yields chunks in publish order, starting with the first chunk published
/// after registration. Deregistration is scoped: dropping the handle removes
/// the queue from the channel and queues the matching encoder release, so
/// cleanup happens on every exit path of the serving task. A leaked handle
/// would keep the encoder alive indefinitely.
pub struct ConsumerStream {
    id: u64,
    channel: Arc<ChannelHub>,
    rx: mpsc::UnboundedReceiver<Bytes>,
    release_tx: mpsc::UnboundedSender<()>,
}

impl std::fmt::Debug for ConsumerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerStream")
            .field("id", &self.id)
            .field("channel", &self.channel.name())
            .finish_non_exhaustive()
    }
}

impl ConsumerStream {
    pub(super) fn new(
        id: u64,
        channel: Arc<ChannelHub>,
        rx: mpsc::UnboundedReceiver<Bytes>,
        release_tx: mpsc::UnboundedSender<()>,
    ) -> Self {
        Self {
            id,
            channel,
            rx,
            release_tx,
        }
    }

    /// Consumer id, unique within the channel
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the channel this consumer is registered on
    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Wait for the next chunk
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Take a chunk if one is already queued
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ConsumerStream {
    fn drop(&mut self) {
        self.channel.detach(self.id);
        tracing::info!(
            channel = %self.channel.name(),
            consumer = self.id,
            "consumer deregistered"
        );

        // The matching encoder release may stop the subprocess, which has to
        // await; hand it to the hub's release worker.
        if self.release_tx.send(()).is_err() {
            tracing::warn!(
                consumer = self.id,
                "release worker gone, encoder refcount not decremented"
            );
        }
    }
}
