//! Crate-wide error type
//!
//! Hardware and subprocess failures are handled at the component that owns
//! the resource; only the conditions a caller can act on surface here.

use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the relay core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested frequency has no exact match in the channel table.
    ///
    /// The tuner only locks onto the 48 table entries; there is no
    /// interpolation or nearest-neighbor fallback.
    #[error("unknown frequency: {0}MHz is not in the channel table")]
    UnknownFrequency(u16),

    /// The encoder subprocess could not be started.
    ///
    /// Fatal for the registration attempt that triggered it: no stream can
    /// ever begin for that consumer.
    #[error("failed to launch encoder process: {0}")]
    EncoderLaunch(#[source] io::Error),

    /// A release was issued without a matching acquire.
    ///
    /// This is a programming error in the caller, never clamped silently.
    #[error("consumer released without a matching acquire")]
    ConsumerCountUnderflow,

    /// Subscription to a channel name the hub does not carry.
    #[error("no such channel: {0:?}")]
    ChannelNotFound(String),

    /// A register transaction exceeded its deadline.
    ///
    /// Not expected in normal operation; keeps a wedged control-line
    /// implementation from blocking the caller forever.
    #[error("register transaction exceeded its deadline")]
    TransactionTimeout,

    /// No `/dev/video*` capture device was found.
    #[error("no /dev/video* capture device found")]
    NoVideoDevice,

    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
