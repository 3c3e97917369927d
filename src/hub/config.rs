//! Channel configuration

use std::net::SocketAddr;

/// Default boundary token between multipart MJPEG frames
pub const DEFAULT_BOUNDARY: &str = "rx5808-stream-frame-boundary";

/// One logical media channel (e.g. "video" or "audio")
///
/// Immutable after startup; the ingest endpoint and the encoder pipeline
/// parameters both derive from it.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Channel name, used as the subscription key
    pub name: String,

    /// Loopback endpoint the encoder connects to for this channel
    pub listen_addr: SocketAddr,

    /// Multipart boundary token (MJPEG channels only)
    pub boundary: Option<String>,

    /// Output framerate fraction handed to the encoder pipeline
    pub output_framerate: Option<String>,

    /// Output bitrate in kbit/s handed to the encoder pipeline
    pub output_bitrate: Option<u32>,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, listen_addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            listen_addr,
            boundary: None,
            output_framerate: None,
            output_bitrate: None,
        }
    }

    /// Set the multipart boundary token
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Set the output framerate fraction
    pub fn output_framerate(mut self, framerate: impl Into<String>) -> Self {
        self.output_framerate = Some(framerate.into());
        self
    }

    /// Set the output bitrate
    pub fn output_bitrate(mut self, kbits: u32) -> Self {
        self.output_bitrate = Some(kbits);
        self
    }
}
