//! Stream fan-out hub
//!
//! The hub replicates every chunk read from a channel's producer to all of
//! that channel's registered consumers, and ties consumer registration to
//! the encoder lifecycle.
//!
//! # Architecture
//!
//! ```text
//!                         Arc<StreamHub>
//!                ┌──────────────────────────────┐
//!                │ channels: name -> ChannelHub │
//!                │ controller: EncoderController│
//!                └───────────────┬──────────────┘
//!                                │ publish(chunk)
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!   [ConsumerStream]      [ConsumerStream]      [ConsumerStream]
//!   unbounded queue       unbounded queue       unbounded queue
//!          │                     │                     │
//!          ▼                     ▼                     ▼
//!     HTTP response         HTTP response         HTTP response
//! ```
//!
//! # Delivery contract
//!
//! Each consumer receives an independent copy of every chunk published
//! after its registration, in publish order. Queues are unbounded: a slow
//! consumer buffers instead of stalling the producer, and no backpressure
//! flows upstream. Admission control (a max-clients limit) is the caller's
//! policy; the hub never rejects a registration.
//!
//! `bytes::Bytes` is reference-counted, so the per-consumer copies share
//! one allocation.

pub mod config;
pub mod consumer;
pub mod store;

pub use config::{ChannelConfig, DEFAULT_BOUNDARY};
pub use consumer::ConsumerStream;
pub use store::{ChannelHub, StreamHub};
