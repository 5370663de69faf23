use std::fmt;

use strato_devices_input::ByteQueue;

use super::params::derive_line_parameters;
use super::regs::*;
use crate::config::ChannelRole;
use crate::transport::{LineParameters, SerialTransport};

/// Per-channel keyboard/mouse FIFO size.
pub const SERIO_QUEUE_SIZE: usize = 256;

/// Channel selector. The discriminant is the channel's index in the controller, which matches
/// the address bit that selects it (B is at the lower address).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    B = 0,
    A = 1,
}

impl ChannelId {
    pub fn other(self) -> Self {
        match self {
            ChannelId::A => ChannelId::B,
            ChannelId::B => ChannelId::A,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        if index & 1 == 0 {
            ChannelId::B
        } else {
            ChannelId::A
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelId::A => "a",
            ChannelId::B => "b",
        })
    }
}

/// Interrupt bookkeeping of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptState {
    pub rx_pending: bool,
    pub tx_pending: bool,
    pub rx_under_service: bool,
    pub tx_under_service: bool,
}

pub(crate) struct Channel {
    pub(crate) id: ChannelId,
    pub(crate) role: ChannelRole,
    pub(crate) disabled: bool,
    pub(crate) clock: u32,
    /// Register selected by the last WR0 write; 0 means the next control access hits WR0/RR0.
    pub(crate) reg: u8,
    pub(crate) wregs: [u8; SERIAL_REGS],
    pub(crate) rregs: [u8; SERIAL_REGS],
    pub(crate) intr: InterruptState,
    pub(crate) rx: u8,
    pub(crate) tx: u8,
    pub(crate) queue: ByteQueue,
    /// Set by the Sun "set LEDs" command; the next byte is the LED mask.
    pub(crate) led_mode: bool,
    pub(crate) caps_lock_mode: u8,
    pub(crate) num_lock_mode: u8,
    pub(crate) transport: Option<Box<dyn SerialTransport>>,
}

impl Channel {
    pub(crate) fn new(id: ChannelId, role: ChannelRole, disabled: bool, clock: u32) -> Self {
        let mut chn = Self {
            id,
            role,
            disabled,
            clock,
            reg: 0,
            wregs: [0; SERIAL_REGS],
            rregs: [0; SERIAL_REGS],
            intr: InterruptState::default(),
            rx: 0,
            tx: 0,
            queue: ByteQueue::new(SERIO_QUEUE_SIZE),
            led_mode: false,
            caps_lock_mode: 0,
            num_lock_mode: 0,
            transport: None,
        };
        chn.reset();
        chn
    }

    /// Hardware reset of the channel registers. Does not touch the IRQ line.
    pub(crate) fn reset(&mut self) {
        self.reg = 0;
        self.wregs = [0; SERIAL_REGS];
        self.rregs = [0; SERIAL_REGS];

        // 1x clock, 1 stop bit, no parity.
        self.wregs[W_TXCTRL1] = TXCTRL1_1STOP;
        self.wregs[W_MINTR] = MINTR_RST_ALL;
        // Sync-mode TX clock from TRxC.
        self.wregs[W_CLOCK] = CLOCK_TRXC;
        self.wregs[W_MISC2] = MISC2_PLLDIS;
        self.wregs[W_EXTINT] =
            EXTINT_DCD | EXTINT_SYNCINT | EXTINT_CTSINT | EXTINT_TXUNDRN | EXTINT_BRKINT;

        let mut status = Status::TXEMPTY | Status::TXUNDRN;
        if self.disabled {
            status |= Status::DCD | Status::SYNC | Status::CTS;
        }
        self.rregs[R_STATUS] = status.bits();
        self.rregs[R_SPEC] = SPEC_BITS8 | SPEC_ALLSENT;

        self.rx = 0;
        self.tx = 0;
        self.intr = InterruptState::default();
        self.led_mode = false;
        self.caps_lock_mode = 0;
        self.num_lock_mode = 0;
        self.queue.clear();
    }

    pub(crate) fn status(&self) -> Status {
        Status::from_bits_retain(self.rregs[R_STATUS])
    }

    pub(crate) fn set_status(&mut self, bits: Status) {
        self.rregs[R_STATUS] |= bits.bits();
    }

    pub(crate) fn clear_status(&mut self, bits: Status) {
        self.rregs[R_STATUS] &= !bits.bits();
    }

    pub(crate) fn status_hi(&self) -> bool {
        self.wregs[W_MINTR] & MINTR_STATUSHI != 0
    }

    /// Whether this channel alone would assert the shared interrupt line.
    pub(crate) fn wants_irq(&self) -> bool {
        let intr = self.wregs[W_INTR];
        let rx_mode = intr & INTR_RXMODEMSK;

        (intr & INTR_TXINT != 0 && self.intr.tx_pending)
            || ((rx_mode == INTR_RXINT1ST || rx_mode == INTR_RXINTALL) && self.intr.rx_pending)
            || (self.wregs[W_EXTINT] & EXTINT_BRKINT != 0 && self.status().contains(Status::BRK))
    }

    pub(crate) fn line_parameters(&self) -> LineParameters {
        derive_line_parameters(&self.wregs, self.clock)
    }

    /// Pushes the current line settings to the transport of a serial-role channel.
    pub(crate) fn update_parameters(&mut self) {
        if self.role != ChannelRole::Serial {
            return;
        }
        let params = self.line_parameters();
        if let Some(transport) = self.transport.as_mut() {
            tracing::trace!(
                chn = %self.id,
                baud = params.baud,
                parity = %params.parity,
                data_bits = params.data_bits,
                stop_bits = params.stop_bits,
                "escc update parameters"
            );
            transport.set_parameters(&params);
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("disabled", &self.disabled)
            .field("reg", &self.reg)
            .field("wregs", &self.wregs)
            .field("rregs", &self.rregs)
            .field("intr", &self.intr)
            .field("rx", &self.rx)
            .field("tx", &self.tx)
            .field("queue_len", &self.queue.len())
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
