//! RX5808 tuner control
//!
//! Bit-serial access to the receiver module's 20-bit register space over
//! three control lines, plus the static channel table that maps register
//! values to frequencies.
//!
//! # Architecture
//!
//! ```text
//!    Rx5808<L: ControlLines>
//!   ┌──────────────────────────┐
//!   │ read_register(addr)      │      data  ──┐
//!   │ write_register(addr, v)  │──►   select ─┼──► receiver module
//!   │ set_frequency(mhz)       │      clock ──┘
//!   │ frequency()              │
//!   └────────────┬─────────────┘
//!                │ exact match
//!                ▼
//!      channels::CHANNEL_TABLE (48 entries, 6 bands)
//! ```
//!
//! # Exclusivity
//!
//! The protocol shares three physical lines and is not reentrant. Every
//! transaction takes `&mut self`, so a single driver value can never run two
//! transactions at once; wrap the driver in a mutex to share it across tasks.

pub mod channels;
pub mod lines;
pub mod protocol;
pub mod sim;

pub use channels::{mhz_for_register, register_for_mhz, Band, ChannelEntry, CHANNEL_TABLE};
pub use lines::{ControlLines, Direction};
pub use protocol::{Rx5808, TunedFrequency};
pub use sim::BenchTuner;
