//! Zilog Z85C30 (ESCC) dual-channel serial controller.
//!
//! The controller exposes two byte-wide ports (control, data) per channel. Address bit
//! `it_shift` selects the port and bit `it_shift + 1` the channel, channel B first. Most
//! registers are reached indirectly: a control write with a non-zero pointer field selects the
//! register that the *next* control access targets, after which the pointer returns to 0.
//!
//! Either channel can also act as a Sun keyboard or mouse (see [`sun`]), in which case data
//! reads drain a per-channel FIFO fed by host input events.

mod channel;
mod intr;
mod params;
pub mod regs;
mod snapshot;
pub mod sun;

use std::fmt;

use strato_platform::{IrqLine, MmioHandler, NoIrq};

use crate::config::{ChannelRole, EsccConfig, EsccConfigError};
use crate::transport::{LineParameters, SerialTransport};
use regs::*;

pub use channel::{ChannelId, InterruptState, SERIO_QUEUE_SIZE};
pub(crate) use channel::Channel;
pub use params::derive_line_parameters;

const SERIAL_CTRL: u64 = 0;
const SERIAL_DATA: u64 = 1;

pub struct Escc {
    config: EsccConfig,
    /// Indexed by [`ChannelId::index`].
    pub(crate) chn: [Channel; 2],
    irq: Box<dyn IrqLine>,
    irq_level: bool,
}

impl Escc {
    pub fn new(config: EsccConfig) -> Result<Self, EsccConfigError> {
        config.validate()?;
        let clock = config.frequency / 2;
        let chn = [
            Channel::new(ChannelId::B, config.chn_b, config.disabled, clock),
            Channel::new(ChannelId::A, config.chn_a, config.disabled, clock),
        ];
        Ok(Self {
            config,
            chn,
            irq: Box::new(NoIrq),
            irq_level: false,
        })
    }

    pub fn config(&self) -> &EsccConfig {
        &self.config
    }

    pub fn set_irq_line(&mut self, irq: impl IrqLine + 'static) {
        self.irq = Box::new(irq);
        self.update_irq();
    }

    pub fn irq_level(&self) -> bool {
        self.irq_level
    }

    /// Connects a byte transport to `id`. The current line settings are pushed immediately.
    pub fn attach_transport(&mut self, id: ChannelId, transport: Box<dyn SerialTransport>) {
        let chn = &mut self.chn[id.index()];
        chn.transport = Some(transport);
        chn.update_parameters();
    }

    pub fn detach_transport(&mut self, id: ChannelId) -> Option<Box<dyn SerialTransport>> {
        self.chn[id.index()].transport.take()
    }

    pub fn role(&self, id: ChannelId) -> ChannelRole {
        self.chn[id.index()].role
    }

    /// Current value of read register `reg` of channel `id`, without side effects.
    pub fn read_register(&self, id: ChannelId, reg: usize) -> u8 {
        self.chn[id.index()].rregs[reg]
    }

    /// Current value of write register `reg` of channel `id`.
    pub fn write_register(&self, id: ChannelId, reg: usize) -> u8 {
        self.chn[id.index()].wregs[reg]
    }

    /// Register the next control-port access of channel `id` targets (0 = WR0/RR0).
    pub fn register_pointer(&self, id: ChannelId) -> u8 {
        self.chn[id.index()].reg
    }

    pub fn interrupt_state(&self, id: ChannelId) -> InterruptState {
        self.chn[id.index()].intr
    }

    pub fn line_parameters(&self, id: ChannelId) -> LineParameters {
        self.chn[id.index()].line_parameters()
    }

    /// Bytes waiting in the keyboard/mouse FIFO of channel `id`.
    pub fn queued_bytes(&self, id: ChannelId) -> Vec<u8> {
        self.chn[id.index()].queue.to_vec()
    }

    /// Hardware reset of both channels.
    pub fn reset(&mut self) {
        tracing::trace!("escc reset");
        for chn in &mut self.chn {
            chn.reset();
        }
        self.update_irq();
    }

    pub fn reset_channel(&mut self, id: ChannelId) {
        tracing::trace!(chn = %id, "escc channel reset");
        self.chn[id.index()].reset();
        self.update_irq();
    }

    fn decode(&self, offset: u64) -> (ChannelId, u64) {
        let shift = self.config.it_shift;
        let port = (offset >> shift) & 1;
        let channel = ChannelId::from_index(((offset >> (shift + 1)) & 1) as usize);
        (channel, port)
    }

    /// Byte read at `offset` within the controller window.
    pub fn read_u8(&mut self, offset: u64) -> u8 {
        let (id, port) = self.decode(offset);
        match port {
            SERIAL_CTRL => {
                let chn = &mut self.chn[id.index()];
                let reg = chn.reg;
                let val = chn.rregs[usize::from(reg)];
                tracing::trace!(chn = %id, reg, val, "escc ctrl read");
                chn.reg = 0;
                val
            }
            _ => self.read_data(id),
        }
    }

    fn read_data(&mut self, id: ChannelId) -> u8 {
        self.chn[id.index()].clear_status(Status::RXAV);
        self.clr_rxint(id);

        let val = match self.chn[id.index()].role {
            ChannelRole::Keyboard | ChannelRole::Mouse => self.get_queue(id),
            ChannelRole::Serial => self.chn[id.index()].rx,
        };
        tracing::trace!(chn = %id, val, "escc data read");

        if let Some(transport) = self.chn[id.index()].transport.as_mut() {
            transport.accept_input();
        }
        val
    }

    /// Byte write at `offset` within the controller window.
    pub fn write_u8(&mut self, offset: u64, val: u8) {
        let (id, port) = self.decode(offset);
        match port {
            SERIAL_CTRL => self.write_ctrl(id, val),
            _ => self.write_data(id, val),
        }
    }

    fn write_ctrl(&mut self, id: ChannelId, val: u8) {
        let reg = usize::from(self.chn[id.index()].reg);
        tracing::trace!(chn = %id, reg, val, "escc ctrl write");

        let mut newreg = 0;
        match reg {
            W_CMD => {
                newreg = val & CMD_PTR_MASK;
                match val & CMD_CMD_MASK {
                    CMD_HI => newreg |= CMD_HI,
                    CMD_CLR_TXINT => self.clr_txint(id),
                    CMD_CLR_IUS => self.clear_ius(id),
                    _ => {}
                }
            }
            W_TXCTRL1 | W_TXCTRL2 => {
                let chn = &mut self.chn[id.index()];
                chn.wregs[reg] = val;
                chn.update_parameters();
            }
            W_BRGLO | W_BRGHI => {
                let chn = &mut self.chn[id.index()];
                chn.wregs[reg] = val;
                chn.rregs[reg] = val;
                chn.update_parameters();
            }
            // Reset codes leave the writing channel's pointer alone.
            W_MINTR => match val & MINTR_RST_MASK {
                MINTR_RST_B => return self.reset_channel(ChannelId::B),
                MINTR_RST_A => return self.reset_channel(ChannelId::A),
                MINTR_RST_ALL => return self.reset(),
                _ => self.chn[id.index()].wregs[reg] = val,
            },
            _ => self.chn[id.index()].wregs[reg] = val,
        }

        let chn = &mut self.chn[id.index()];
        chn.reg = if chn.reg == 0 { newreg } else { 0 };
    }

    fn write_data(&mut self, id: ChannelId, val: u8) {
        tracing::trace!(chn = %id, val, "escc data write");
        let chn = &mut self.chn[id.index()];
        chn.tx = val;

        if chn.wregs[W_TXCTRL2] & TXCTRL2_TXEN != 0 {
            match chn.role {
                ChannelRole::Keyboard => {
                    if !chn.disabled {
                        self.handle_kbd_command(id, val);
                    }
                }
                ChannelRole::Serial | ChannelRole::Mouse => {
                    if let Some(transport) = chn.transport.as_mut() {
                        transport.write(val);
                    }
                }
            }
        }

        let chn = &mut self.chn[id.index()];
        chn.set_status(Status::TXEMPTY);
        chn.rregs[R_SPEC] |= SPEC_ALLSENT;
        self.set_txint(id);
    }

    /// Whether channel `id` can take another inbound byte.
    pub fn can_receive(&self, id: ChannelId) -> bool {
        !self.chn[id.index()].status().contains(Status::RXAV)
    }

    /// Delivers an inbound byte from the transport side.
    pub fn receive(&mut self, id: ChannelId, byte: u8) {
        tracing::trace!(chn = %id, byte, "escc receive byte");
        let chn = &mut self.chn[id.index()];
        chn.set_status(Status::RXAV);
        chn.rx = byte;
        self.set_rxint(id);
    }

    /// Signals a break condition on the line.
    pub fn receive_break(&mut self, id: ChannelId) {
        tracing::trace!(chn = %id, "escc receive break");
        self.chn[id.index()].set_status(Status::BRK);
        self.update_irq();
    }

    pub(crate) fn clear_queue(&mut self, id: ChannelId) {
        self.chn[id.index()].queue.clear();
    }

    pub(crate) fn put_queue(&mut self, id: ChannelId, byte: u8) {
        if !self.chn[id.index()].queue.push(byte) {
            tracing::trace!(chn = %id, byte, "escc queue full, dropping byte");
            return;
        }
        tracing::trace!(chn = %id, byte, "escc put queue");
        self.receive(id, 0);
    }

    fn get_queue(&mut self, id: ChannelId) -> u8 {
        let queue = &mut self.chn[id.index()].queue;
        if queue.is_empty() {
            return 0;
        }
        let byte = queue.pop();
        let more = !queue.is_empty();
        tracing::trace!(chn = %id, byte, "escc get queue");
        if more {
            self.receive(id, 0);
        }
        byte
    }
}

impl MmioHandler for Escc {
    fn read(&mut self, offset: u64, size: usize) -> u64 {
        assert_eq!(size, 1, "ESCC registers are byte-wide (size {size})");
        assert!(
            offset < self.config.window_size(),
            "ESCC access at {offset:#x} outside its window"
        );
        u64::from(self.read_u8(offset))
    }

    fn write(&mut self, offset: u64, size: usize, value: u64) {
        assert_eq!(size, 1, "ESCC registers are byte-wide (size {size})");
        assert!(
            offset < self.config.window_size(),
            "ESCC access at {offset:#x} outside its window"
        );
        assert!(value <= 0xff, "ESCC write value {value:#x} wider than a byte");
        self.write_u8(offset, value as u8);
    }
}

impl fmt::Debug for Escc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escc")
            .field("config", &self.config)
            .field("chn_b", &self.chn[0])
            .field("chn_a", &self.chn[1])
            .field("irq_level", &self.irq_level)
            .finish_non_exhaustive()
    }
}
