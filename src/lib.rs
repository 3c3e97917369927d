//! RX5808 FPV receiver streaming relay
//!
//! Relays the continuous byte stream of an external encoder process (MJPEG
//! video and optionally MP3 audio) to any number of independently-paced
//! consumers, and tunes the RX5808 receiver module over its three-wire
//! register protocol.
//!
//! # Architecture
//!
//! ```text
//!  gst-launch pipeline ──TCP loopback──► IngestAcceptor ──► ChannelHub
//!        ▲                                                     │ fan-out
//!        │ start/stop/restart                                  ▼
//!  EncoderController ◄── acquire/release ────────────── ConsumerStream(s)
//!        ▲                                                     │
//!        │ restart-stream                                      ▼
//!  TunerSettings ──set-frequency──► Rx5808 driver        HTTP responses
//!                                       │                 (external layer)
//!                                       ▼
//!                            data/select/clock lines
//! ```
//!
//! The HTTP layer is an external collaborator: per stream request it calls
//! [`StreamHub::subscribe`], forwards chunks from the returned
//! [`ConsumerStream`] as the response body, and relies on the handle's drop
//! to deregister on every exit path. Admission control and page rendering
//! live there, not here.

pub mod encoder;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod settings;
pub mod tuner;

pub use encoder::{EncoderCommand, EncoderConfig, EncoderController, GstPipeline};
pub use error::{Error, Result};
pub use hub::{ChannelConfig, ConsumerStream, StreamHub};
pub use ingest::{IngestAcceptor, IngestConfig};
pub use settings::{SettingsCommand, TunerSettings};
pub use tuner::{Rx5808, TunedFrequency};
