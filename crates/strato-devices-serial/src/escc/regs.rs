//! Z85C30 register numbers and bit definitions.
//!
//! `W_*` are write registers (WRn), `R_*` read registers (RRn). Each register's bits follow its
//! number.

use bitflags::bitflags;

pub const SERIAL_REGS: usize = 16;

pub const W_CMD: usize = 0;
pub const CMD_PTR_MASK: u8 = 0x07;
pub const CMD_CMD_MASK: u8 = 0x38;
pub const CMD_HI: u8 = 0x08;
pub const CMD_CLR_TXINT: u8 = 0x28;
pub const CMD_CLR_IUS: u8 = 0x38;
pub const W_INTR: usize = 1;
pub const INTR_INTALL: u8 = 0x01;
pub const INTR_TXINT: u8 = 0x02;
pub const INTR_RXMODEMSK: u8 = 0x18;
pub const INTR_RXINT1ST: u8 = 0x08;
pub const INTR_RXINTALL: u8 = 0x10;
pub const W_IVEC: usize = 2;
pub const W_RXCTRL: usize = 3;
pub const RXCTRL_RXEN: u8 = 0x01;
pub const W_TXCTRL1: usize = 4;
pub const TXCTRL1_PAREN: u8 = 0x01;
pub const TXCTRL1_PAREV: u8 = 0x02;
pub const TXCTRL1_1STOP: u8 = 0x04;
pub const TXCTRL1_2STOP: u8 = 0x0c;
pub const TXCTRL1_STPMSK: u8 = 0x0c;
pub const TXCTRL1_CLK1X: u8 = 0x00;
pub const TXCTRL1_CLK16X: u8 = 0x40;
pub const TXCTRL1_CLK32X: u8 = 0x80;
pub const TXCTRL1_CLK64X: u8 = 0xc0;
pub const TXCTRL1_CLKMSK: u8 = 0xc0;
pub const W_TXCTRL2: usize = 5;
pub const TXCTRL2_TXEN: u8 = 0x08;
pub const TXCTRL2_BITMSK: u8 = 0x60;
pub const TXCTRL2_5BITS: u8 = 0x00;
pub const TXCTRL2_7BITS: u8 = 0x20;
pub const TXCTRL2_6BITS: u8 = 0x40;
pub const TXCTRL2_8BITS: u8 = 0x60;
pub const W_SYNC1: usize = 6;
pub const W_SYNC2: usize = 7;
pub const W_TXBUF: usize = 8;
pub const W_MINTR: usize = 9;
pub const MINTR_STATUSHI: u8 = 0x10;
pub const MINTR_RST_MASK: u8 = 0xc0;
pub const MINTR_RST_B: u8 = 0x40;
pub const MINTR_RST_A: u8 = 0x80;
pub const MINTR_RST_ALL: u8 = 0xc0;
pub const W_MISC1: usize = 10;
pub const W_CLOCK: usize = 11;
pub const CLOCK_TRXC: u8 = 0x08;
pub const W_BRGLO: usize = 12;
pub const W_BRGHI: usize = 13;
pub const W_MISC2: usize = 14;
pub const MISC2_PLLDIS: u8 = 0x30;
pub const W_EXTINT: usize = 15;
pub const EXTINT_DCD: u8 = 0x08;
pub const EXTINT_SYNCINT: u8 = 0x10;
pub const EXTINT_CTSINT: u8 = 0x20;
pub const EXTINT_TXUNDRN: u8 = 0x40;
pub const EXTINT_BRKINT: u8 = 0x80;

pub const R_STATUS: usize = 0;
pub const R_SPEC: usize = 1;
pub const SPEC_ALLSENT: u8 = 0x01;
pub const SPEC_BITS8: u8 = 0x06;
pub const R_IVEC: usize = 2;
pub const IVEC_TXINTB: u8 = 0x00;
pub const IVEC_LONOINT: u8 = 0x06;
pub const IVEC_LORXINTA: u8 = 0x0c;
pub const IVEC_LORXINTB: u8 = 0x04;
pub const IVEC_LOTXINTA: u8 = 0x08;
pub const IVEC_HINOINT: u8 = 0x60;
pub const IVEC_HIRXINTA: u8 = 0x30;
pub const IVEC_HIRXINTB: u8 = 0x20;
pub const IVEC_HITXINTA: u8 = 0x10;
pub const R_INTR: usize = 3;
pub const R_BRGLO: usize = 12;
pub const R_BRGHI: usize = 13;

bitflags! {
    /// RR0: transmit/receive buffer and external status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const RXAV = 0x01;
        const ZERO = 0x02;
        const TXEMPTY = 0x04;
        const DCD = 0x08;
        const SYNC = 0x10;
        const CTS = 0x20;
        const TXUNDRN = 0x40;
        const BRK = 0x80;
    }
}

bitflags! {
    /// RR3: interrupt pending bits. Only readable through channel A.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntrPending: u8 {
        const EXTINTB = 0x01;
        const TXINTB = 0x02;
        const RXINTB = 0x04;
        const EXTINTA = 0x08;
        const TXINTA = 0x10;
        const RXINTA = 0x20;
    }
}
