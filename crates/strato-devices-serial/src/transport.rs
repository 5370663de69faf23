//! The outside-world end of a serial channel.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Parity::None => "N",
            Parity::Odd => "O",
            Parity::Even => "E",
        })
    }
}

/// Line settings programmed by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParameters {
    pub baud: u32,
    pub parity: Parity,
    pub data_bits: u8,
    pub stop_bits: u8,
}

/// Byte sink/source a serial channel is wired to (a pty, a socket, a log file...).
///
/// Inbound bytes are delivered by the owner calling `Escc::receive`, gated on
/// `Escc::can_receive`.
pub trait SerialTransport {
    /// Transmits one byte written by the guest.
    fn write(&mut self, byte: u8);

    /// Called whenever the guest reprograms the line settings.
    fn set_parameters(&mut self, _params: &LineParameters) {}

    /// Called after the guest consumed a received byte; the transport may deliver the next one.
    fn accept_input(&mut self) {}
}
