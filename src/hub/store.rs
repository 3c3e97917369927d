//! Channel hubs and the stream hub

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::encoder::EncoderController;
use crate::error::{Error, Result};
use crate::hub::config::ChannelConfig;
use crate::hub::consumer::ConsumerStream;

/// Per-channel consumer set
///
/// The registry is a plain mutex-guarded map: registration and removal are
/// short critical sections called from different request contexts, and
/// removal must also work from a synchronous `Drop`.
pub struct ChannelHub {
    config: ChannelConfig,
    consumers: Mutex<HashMap<u64, mpsc::UnboundedSender<Bytes>>>,
    next_consumer_id: AtomicU64,
}

impl ChannelHub {
    fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            consumers: Mutex::new(HashMap::new()),
            next_consumer_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Replicate a chunk to every registered consumer queue, in call order
    ///
    /// A consumer whose receiver is gone is pruned here; its failure never
    /// affects delivery to the others.
    pub fn publish(&self, chunk: Bytes) {
        let mut consumers = self.consumers.lock();
        consumers.retain(|id, tx| {
            if tx.send(chunk.clone()).is_ok() {
                true
            } else {
                tracing::trace!(
                    channel = %self.config.name,
                    consumer = id,
                    "pruning closed consumer queue"
                );
                false
            }
        });
    }

    /// Number of currently registered consumers
    pub fn consumer_count(&self) -> usize {
        self.consumers.lock().len()
    }

    pub(super) fn attach(&self) -> (u64, mpsc::UnboundedReceiver<Bytes>) {
        let id = self.next_consumer_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.consumers.lock().insert(id, tx);
        (id, rx)
    }

    /// Remove a consumer queue; returns whether it was still registered
    pub(super) fn detach(&self, id: u64) -> bool {
        self.consumers.lock().remove(&id).is_some()
    }
}

/// All channels of one stream group plus the group's encoder controller
pub struct StreamHub {
    channels: HashMap<String, Arc<ChannelHub>>,
    controller: Arc<EncoderController>,
    release_tx: mpsc::UnboundedSender<()>,
}

impl StreamHub {
    /// Build the hub and spawn its release worker
    ///
    /// Consumer deregistration happens in `Drop`, which cannot await; drops
    /// queue a release and the worker applies it to the controller. Must be
    /// called from within a tokio runtime.
    pub fn new(
        configs: impl IntoIterator<Item = ChannelConfig>,
        controller: Arc<EncoderController>,
    ) -> Arc<Self> {
        let channels = configs
            .into_iter()
            .map(|config| {
                let name = config.name.clone();
                (name, Arc::new(ChannelHub::new(config)))
            })
            .collect();

        let (release_tx, mut release_rx) = mpsc::unbounded_channel::<()>();
        let release_controller = Arc::clone(&controller);
        tokio::spawn(async move {
            while release_rx.recv().await.is_some() {
                if let Err(e) = release_controller.release().await {
                    tracing::error!(error = %e, "consumer release failed");
                }
            }
        });

        Arc::new(Self {
            channels,
            controller,
            release_tx,
        })
    }

    /// Register a consumer on a channel
    ///
    /// Acquires the encoder first: if the subprocess cannot start, no stream
    /// can ever begin and the registration fails outright. Never rejects on
    /// consumer count; admission limits belong to the caller.
    pub async fn subscribe(&self, channel: &str) -> Result<ConsumerStream> {
        let hub = self
            .channel(channel)
            .ok_or_else(|| Error::ChannelNotFound(channel.to_string()))?;

        self.controller.acquire().await?;

        let (id, rx) = hub.attach();
        tracing::info!(channel, consumer = id, "consumer registered");
        Ok(ConsumerStream::new(id, hub, rx, self.release_tx.clone()))
    }

    /// Look up a channel by name
    pub fn channel(&self, name: &str) -> Option<Arc<ChannelHub>> {
        self.channels.get(name).cloned()
    }

    /// Iterate all channels
    pub fn channels(&self) -> impl Iterator<Item = &Arc<ChannelHub>> {
        self.channels.values()
    }

    /// Total registered consumers across all channels
    ///
    /// This is the number admission control compares against a max-clients
    /// limit before calling [`subscribe`](Self::subscribe).
    pub fn total_consumers(&self) -> usize {
        self.channels.values().map(|hub| hub.consumer_count()).sum()
    }

    pub fn controller(&self) -> &Arc<EncoderController> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::encoder::{EncoderCommand, EncoderConfig};

    fn test_hub() -> Arc<StreamHub> {
        let controller = Arc::new(EncoderController::new(EncoderConfig::new(
            EncoderCommand::new("sleep").arg("30"),
        )));
        StreamHub::new(
            [
                ChannelConfig::new("video", "127.0.0.1:0".parse().unwrap()),
                ChannelConfig::new("audio", "127.0.0.1:0".parse().unwrap()),
            ],
            controller,
        )
    }

    /// Give the release worker a beat to drain queued releases.
    async fn settle_releases() {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    #[tokio::test]
    async fn test_fan_out_preserves_order() {
        let hub = test_hub();
        let video = hub.channel("video").unwrap();

        let mut a = hub.subscribe("video").await.unwrap();
        let mut b = hub.subscribe("video").await.unwrap();

        for chunk in [b"one".as_slice(), b"two", b"three"] {
            video.publish(Bytes::copy_from_slice(chunk));
        }

        for consumer in [&mut a, &mut b] {
            assert_eq!(consumer.recv().await.unwrap(), Bytes::from_static(b"one"));
            assert_eq!(consumer.recv().await.unwrap(), Bytes::from_static(b"two"));
            assert_eq!(consumer.recv().await.unwrap(), Bytes::from_static(b"three"));
        }

        drop(a);
        drop(b);
        settle_releases().await;
        assert_eq!(hub.controller().active_consumers().await, 0);
    }

    #[tokio::test]
    async fn test_late_joiner_sees_only_later_chunks() {
        let hub = test_hub();
        let video = hub.channel("video").unwrap();

        let mut early = hub.subscribe("video").await.unwrap();
        video.publish(Bytes::from_static(b"before"));

        let mut late = hub.subscribe("video").await.unwrap();
        video.publish(Bytes::from_static(b"after"));

        assert_eq!(early.recv().await.unwrap(), Bytes::from_static(b"before"));
        assert_eq!(early.recv().await.unwrap(), Bytes::from_static(b"after"));
        assert_eq!(late.recv().await.unwrap(), Bytes::from_static(b"after"));

        drop(early);
        drop(late);
        settle_releases().await;
    }

    #[tokio::test]
    async fn test_subscribe_drives_encoder_lifecycle() {
        let hub = test_hub();
        assert!(!hub.controller().is_running().await);

        let video_consumer = hub.subscribe("video").await.unwrap();
        assert!(hub.controller().is_running().await);
        assert_eq!(hub.controller().stats().starts(), 1);

        // Audio consumer of the same group reuses the running encoder.
        let audio_consumer = hub.subscribe("audio").await.unwrap();
        assert_eq!(hub.controller().stats().starts(), 1);
        assert_eq!(hub.total_consumers(), 2);

        drop(video_consumer);
        drop(audio_consumer);
        settle_releases().await;

        assert!(!hub.controller().is_running().await);
        assert_eq!(hub.controller().stats().stops(), 1);
        assert_eq!(hub.total_consumers(), 0);
    }

    #[tokio::test]
    async fn test_drop_deregisters_exactly_once() {
        let hub = test_hub();
        let video = hub.channel("video").unwrap();

        let a = hub.subscribe("video").await.unwrap();
        let _b = hub.subscribe("video").await.unwrap();
        assert_eq!(video.consumer_count(), 2);

        // Dropping one guard removes one registration, once.
        drop(a);
        settle_releases().await;
        assert_eq!(video.consumer_count(), 1);
        assert_eq!(hub.controller().active_consumers().await, 1);

        // Detaching an id that was never registered is a no-op.
        assert!(!video.detach(9999));
        assert_eq!(video.consumer_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_survives_closed_consumer_queue() {
        let hub = test_hub();
        let video = hub.channel("video").unwrap();

        let mut kept = hub.subscribe("video").await.unwrap();
        let dropped = hub.subscribe("video").await.unwrap();
        drop(dropped);

        video.publish(Bytes::from_static(b"chunk"));
        assert_eq!(kept.recv().await.unwrap(), Bytes::from_static(b"chunk"));

        drop(kept);
        settle_releases().await;
    }

    #[tokio::test]
    async fn test_unknown_channel_rejected() {
        let hub = test_hub();
        let err = hub.subscribe("telemetry").await.unwrap_err();
        assert!(matches!(err, Error::ChannelNotFound(_)));
        assert!(!hub.controller().is_running().await);
    }
}
