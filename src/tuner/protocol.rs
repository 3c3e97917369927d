//! Bit-serial register protocol driver
//!
//! Implements the three-wire protocol of the receiver's synthesizer chip:
//! chip-select framing, 4 address bits, a read/write discriminator bit and
//! 20 data bits, all least-significant-bit first. The chip's internal shift
//! register samples on clock edges, so every line transition is followed by
//! a minimum settle delay. That delay is a hardware timing contract, not a
//! tuning knob.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::tuner::channels;
use crate::tuner::lines::{ControlLines, Direction};

/// Minimum settle time after every individual line transition
pub const SETTLE: Duration = Duration::from_micros(1);

/// Deadline for one full register transaction
///
/// A transaction is ~150 line transitions and normally completes in well
/// under a millisecond; the deadline only bounds a wedged line
/// implementation.
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_millis(100);

/// Synthesizer register A (channel selection)
pub const CHANNEL_REGISTER: u8 = 0x01;

/// Synthesizer configuration register (reference divider / step)
pub const SYNTH_REGISTER: u8 = 0x08;

/// Reference frequency register
pub const REFERENCE_REGISTER: u8 = 0x00;

/// Default value written to [`SYNTH_REGISTER`] before tuning
pub const SYNTH_DEFAULT: u32 = 0x3F40;

const ADDRESS_BITS: u8 = 4;
const DATA_BITS: u8 = 20;

/// Result of decoding the channel register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunedFrequency {
    /// Register value matched a channel table entry
    Mhz(u16),
    /// Register value is not in the table; carries the raw 20-bit value
    Unknown(u32),
}

impl std::fmt::Display for TunedFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TunedFrequency::Mhz(mhz) => write!(f, "{}MHz", mhz),
            TunedFrequency::Unknown(raw) => write!(f, "unknown (0x{:05X})", raw),
        }
    }
}

/// RX5808 receiver driver
///
/// Owns its control lines; `&mut self` on every transaction enforces the
/// one-transaction-at-a-time invariant at compile time. Transactions are
/// not cancellable once started and must run to completion.
pub struct Rx5808<L: ControlLines> {
    lines: L,
}

impl<L: ControlLines> Rx5808<L> {
    /// Create a driver over the given control lines
    pub fn new(lines: L) -> Self {
        Self { lines }
    }

    /// Consume the driver and return the control lines
    pub fn into_lines(self) -> L {
        self.lines
    }

    /// Read a 20-bit register
    pub fn read_register(&mut self, address: u8) -> Result<u32> {
        let deadline = Instant::now() + TRANSACTION_TIMEOUT;

        // Discriminator bit 0 = read.
        self.open_frame(address, false, deadline)?;

        self.lines.data_direction(Direction::Input);
        self.settle();

        let mut value: u32 = 0;
        for i in 0..DATA_BITS {
            if self.read_bit(deadline)? {
                value |= 1 << i;
            }
        }

        self.drive_select(true);
        self.lines.data_direction(Direction::Output);
        self.settle();
        self.close_frame();

        Ok(value)
    }

    /// Write a 20-bit register
    pub fn write_register(&mut self, address: u8, value: u32) -> Result<()> {
        let deadline = Instant::now() + TRANSACTION_TIMEOUT;

        // Discriminator bit 1 = write.
        self.open_frame(address, true, deadline)?;

        let mut bits = value;
        for _ in 0..DATA_BITS {
            self.send_bit(bits & 1 != 0, deadline)?;
            bits >>= 1;
        }

        self.drive_select(true);
        self.close_frame();

        Ok(())
    }

    /// Decode the currently tuned frequency from the channel register
    pub fn frequency(&mut self) -> Result<TunedFrequency> {
        let raw = self.read_register(CHANNEL_REGISTER)?;
        Ok(match channels::mhz_for_register(raw) {
            Some(mhz) => TunedFrequency::Mhz(mhz),
            None => TunedFrequency::Unknown(raw),
        })
    }

    /// Tune the receiver to an exact channel table frequency
    ///
    /// Writes the synthesizer defaults to register 0x08, then the looked-up
    /// channel value to register 0x01. The two writes are not transactional:
    /// if the second fails the tuner is left with defaults applied but the
    /// old channel selected. Callers must not assume rollback.
    pub fn set_frequency(&mut self, mhz: u16) -> Result<String> {
        let register =
            channels::register_for_mhz(mhz).ok_or(Error::UnknownFrequency(mhz))?;

        tracing::info!(mhz, register = %format_args!("0x{:05X}", register), "tuning receiver");

        self.write_register(SYNTH_REGISTER, SYNTH_DEFAULT)?;
        self.write_register(CHANNEL_REGISTER, register)?;

        Ok(format!("tuned to {}MHz (0x{:05X})", mhz, register))
    }

    /// Read back the synthesizer configuration and reference registers
    pub fn synth_settings(&mut self) -> Result<(u32, u32)> {
        let settings = self.read_register(SYNTH_REGISTER)?;
        let reference = self.read_register(REFERENCE_REGISTER)?;
        Ok((settings, reference))
    }

    /// Select-high then select-low to start a frame, clock out the address
    /// bits LSB-first and the read/write discriminator.
    fn open_frame(&mut self, address: u8, write: bool, deadline: Instant) -> Result<()> {
        self.drive_select(true);
        self.drive_select(false);

        for i in 0..ADDRESS_BITS {
            self.send_bit(address & (1 << i) != 0, deadline)?;
        }
        self.send_bit(write, deadline)?;

        Ok(())
    }

    /// Leave all three lines low between transactions
    fn close_frame(&mut self) {
        self.drive_select(false);
        self.drive_clock(false);
        self.drive_data(false);
    }

    /// Clock one bit out: clock low, present data, rising edge, clock low
    fn send_bit(&mut self, bit: bool, deadline: Instant) -> Result<()> {
        self.check_deadline(deadline)?;
        self.drive_clock(false);
        self.drive_data(bit);
        self.drive_clock(true);
        self.drive_clock(false);
        Ok(())
    }

    /// Clock one bit in, sampling after the rising edge
    fn read_bit(&mut self, deadline: Instant) -> Result<bool> {
        self.check_deadline(deadline)?;
        self.drive_clock(false);
        self.drive_clock(true);
        Ok(self.lines.read_data())
    }

    fn check_deadline(&self, deadline: Instant) -> Result<()> {
        if Instant::now() > deadline {
            return Err(Error::TransactionTimeout);
        }
        Ok(())
    }

    fn drive_select(&mut self, high: bool) {
        self.lines.set_select(high);
        self.settle();
    }

    fn drive_clock(&mut self, high: bool) {
        self.lines.set_clock(high);
        self.settle();
    }

    fn drive_data(&mut self, high: bool) {
        self.lines.set_data(high);
        self.settle();
    }

    fn settle(&self) {
        thread::sleep(SETTLE);
    }
}
