//! Ingest acceptor loop
//!
//! State machine per channel: Listening -> Connected -> chunk loop ->
//! Disconnected -> Listening. The loop only exits on the process-wide
//! shutdown flag.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::encoder::EncoderController;
use crate::error::Result;
use crate::hub::ChannelHub;

/// Acceptor tuning knobs
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Upper bound on a single producer read
    pub read_chunk_size: usize,

    /// Poll interval for producer reads; keeps the loop responsive to the
    /// shutdown flag without busy-spinning
    pub poll_interval: Duration,

    /// Delay before restarting the encoder after producer loss
    pub restart_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 1024,
            poll_interval: Duration::from_millis(100),
            restart_delay: Duration::from_millis(250),
        }
    }
}

impl IngestConfig {
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }
}

/// Owns a channel's listening endpoint and its producer connection
///
/// Deliberately single-producer: one connection is accepted at a time and a
/// second attempt while one is active sits in the OS backlog. A new
/// connection supersedes a dropped one once the loop re-accepts.
pub struct IngestAcceptor {
    listener: TcpListener,
    channel: Arc<ChannelHub>,
    controller: Arc<EncoderController>,
    config: IngestConfig,
    shutdown: watch::Receiver<bool>,
}

impl IngestAcceptor {
    /// Bind the channel's configured listen endpoint
    pub async fn bind(
        channel: Arc<ChannelHub>,
        controller: Arc<EncoderController>,
        config: IngestConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(channel.config().listen_addr).await?;
        tracing::info!(
            channel = %channel.name(),
            addr = %listener.local_addr()?,
            "ingest listening"
        );

        Ok(Self {
            listener,
            channel,
            controller,
            config,
            shutdown,
        })
    }

    /// Actual bound address (relevant when configured with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until shutdown
    pub async fn run(mut self) {
        loop {
            if *self.shutdown.borrow() {
                break;
            }

            tracing::info!(channel = %self.channel.name(), "waiting for producer");

            let socket = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        tracing::info!(
                            channel = %self.channel.name(),
                            peer = %peer,
                            "producer connected"
                        );
                        socket
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to accept producer");
                        continue;
                    }
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        // Shutdown sender gone; treat as shutdown.
                        break;
                    }
                    continue;
                }
            };

            self.pump(socket).await;

            if *self.shutdown.borrow() {
                break;
            }

            // Producer lost. Restart the encoder only if someone is still
            // watching; with no consumers there is no reason to re-run it.
            let consumers = self.controller.active_consumers().await;
            if consumers > 0 {
                tracing::info!(
                    channel = %self.channel.name(),
                    consumers,
                    "producer lost with consumers attached, restarting encoder"
                );
                tokio::time::sleep(self.config.restart_delay).await;
                if let Err(e) = self.controller.restart().await {
                    tracing::error!(error = %e, "encoder restart failed");
                }
            } else {
                tracing::info!(
                    channel = %self.channel.name(),
                    "producer lost, no consumers, back to listening"
                );
            }
        }

        tracing::info!(channel = %self.channel.name(), "ingest loop stopped");
    }

    /// Chunk loop: read bounded chunks and publish each non-empty one
    async fn pump(&mut self, mut socket: TcpStream) {
        let mut buf = vec![0u8; self.config.read_chunk_size];

        loop {
            if *self.shutdown.borrow() {
                return;
            }

            match timeout(self.config.poll_interval, socket.read(&mut buf)).await {
                // Poll tick; re-check the shutdown flag.
                Err(_) => continue,
                // Zero-length read is orderly producer shutdown.
                Ok(Ok(0)) => {
                    tracing::info!(channel = %self.channel.name(), "producer closed connection");
                    return;
                }
                Ok(Ok(n)) => self.channel.publish(Bytes::copy_from_slice(&buf[..n])),
                Ok(Err(e)) => {
                    tracing::warn!(
                        channel = %self.channel.name(),
                        error = %e,
                        "producer read failed"
                    );
                    return;
                }
            }
        }
    }
}
