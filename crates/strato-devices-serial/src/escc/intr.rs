//! Interrupt arbitration between the two channels.
//!
//! RR3 (pending bits) lives in channel A and RR2 (the status-modified vector) in channel B,
//! whichever channel raised the condition. A received character always outranks a transmit
//! interrupt of the same channel: a TX interrupt is only latched under service while no RX
//! interrupt is.

use super::channel::ChannelId;
use super::regs::*;
use super::Escc;

impl Escc {
    /// Recomputes the shared interrupt line from both channels.
    pub(crate) fn update_irq(&mut self) {
        let level = self.chn[0].wants_irq() || self.chn[1].wants_irq();
        if level != self.irq_level {
            tracing::trace!(level, "escc irq");
        }
        self.irq_level = level;
        self.irq.set_level(level);
    }

    fn set_vector(&mut self, rx_a: u8) {
        self.chn[ChannelId::B.index()].rregs[R_IVEC] = rx_a;
    }

    fn set_pending(&mut self, bits: IntrPending) {
        self.chn[ChannelId::A.index()].rregs[R_INTR] |= bits.bits();
    }

    fn clear_pending(&mut self, bits: IntrPending) {
        self.chn[ChannelId::A.index()].rregs[R_INTR] &= !bits.bits();
    }

    fn no_interrupt_vector(&self, id: ChannelId) -> u8 {
        if self.chn[id.index()].status_hi() {
            IVEC_HINOINT
        } else {
            IVEC_LONOINT
        }
    }

    pub(crate) fn set_rxint(&mut self, id: ChannelId) {
        let chn = &mut self.chn[id.index()];
        chn.intr.rx_pending = true;
        chn.intr.rx_under_service = true;
        let hi = chn.status_hi();

        match id {
            ChannelId::A => {
                self.set_pending(IntrPending::RXINTA);
                self.set_vector(if hi { IVEC_HIRXINTA } else { IVEC_LORXINTA });
            }
            ChannelId::B => {
                self.set_pending(IntrPending::RXINTB);
                self.set_vector(if hi { IVEC_HIRXINTB } else { IVEC_LORXINTB });
            }
        }
        self.update_irq();
    }

    pub(crate) fn set_txint(&mut self, id: ChannelId) {
        let chn = &mut self.chn[id.index()];
        chn.intr.tx_pending = true;
        if !chn.intr.rx_under_service {
            chn.intr.tx_under_service = true;
            let hi = chn.status_hi();
            let tx_enabled = chn.wregs[W_INTR] & INTR_TXINT != 0;

            match id {
                ChannelId::A => {
                    if tx_enabled {
                        self.set_pending(IntrPending::TXINTA);
                    }
                    self.set_vector(if hi { IVEC_HITXINTA } else { IVEC_LOTXINTA });
                }
                ChannelId::B => {
                    self.set_vector(IVEC_TXINTB);
                    if tx_enabled {
                        self.set_pending(IntrPending::TXINTB);
                    }
                }
            }
        }
        self.update_irq();
    }

    pub(crate) fn clr_rxint(&mut self, id: ChannelId) {
        let chn = &mut self.chn[id.index()];
        chn.intr.rx_pending = false;
        chn.intr.rx_under_service = false;

        let vector = self.no_interrupt_vector(id);
        self.set_vector(vector);
        self.clear_pending(match id {
            ChannelId::A => IntrPending::RXINTA,
            ChannelId::B => IntrPending::RXINTB,
        });

        if self.chn[id.index()].intr.tx_pending {
            self.set_txint(id);
        }
        self.update_irq();
    }

    pub(crate) fn clr_txint(&mut self, id: ChannelId) {
        let chn = &mut self.chn[id.index()];
        chn.intr.tx_pending = false;
        chn.intr.tx_under_service = false;

        let vector = self.no_interrupt_vector(id);
        self.set_vector(vector);
        self.clear_pending(match id {
            ChannelId::A => IntrPending::TXINTA,
            ChannelId::B => IntrPending::TXINTB,
        });

        if self.chn[id.index()].intr.rx_pending {
            self.set_rxint(id);
        }
        self.update_irq();
    }

    /// WR0 "reset highest IUS": drops the highest-priority under-service latch, letting a
    /// pending TX interrupt through once RX service ends.
    pub(crate) fn clear_ius(&mut self, id: ChannelId) {
        let chn = &mut self.chn[id.index()];
        if chn.intr.rx_under_service {
            chn.intr.rx_under_service = false;
            if chn.intr.tx_pending {
                self.set_txint(id);
            }
        } else if chn.intr.tx_under_service {
            chn.intr.tx_under_service = false;
        }
        self.update_irq();
    }
}
