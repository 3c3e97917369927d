//! Hardware control-line abstraction
//!
//! The driver talks to the receiver through three digital lines. On a
//! Raspberry Pi these are plain GPIO pins; in tests they are simulated.

/// Direction of the shared data line
///
/// The line is driven by us while clocking out address and write data, and
/// switched to input while clocking register contents back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Data line is read by us (register reads)
    Input,
    /// Data line is driven by us (default)
    Output,
}

/// Three-wire bit-level I/O used by the register protocol
///
/// Implementations only need to set levels and report the data line level;
/// all framing and timing lives in [`Rx5808`](crate::tuner::Rx5808).
pub trait ControlLines {
    /// Drive the data line high or low (only meaningful in output mode)
    fn set_data(&mut self, high: bool);

    /// Drive the chip-select line high or low (the chip listens while low)
    fn set_select(&mut self, high: bool);

    /// Drive the clock line high or low
    fn set_clock(&mut self, high: bool);

    /// Switch the data line between output and input mode
    fn data_direction(&mut self, direction: Direction);

    /// Sample the data line (only meaningful in input mode)
    fn read_data(&mut self) -> bool;
}
