use super::regs::*;
use crate::transport::{LineParameters, Parity};

/// Computes the async line settings programmed into WR4/WR5/WR12/WR13.
///
/// `clock` is the channel's baud rate generator input in Hz.
pub fn derive_line_parameters(wregs: &[u8; SERIAL_REGS], clock: u32) -> LineParameters {
    let txctrl1 = wregs[W_TXCTRL1];

    let parity = if txctrl1 & TXCTRL1_PAREN != 0 {
        if txctrl1 & TXCTRL1_PAREV != 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    } else {
        Parity::None
    };

    let stop_bits = if txctrl1 & TXCTRL1_STPMSK == TXCTRL1_2STOP {
        2
    } else {
        1
    };

    let data_bits = match wregs[W_TXCTRL2] & TXCTRL2_BITMSK {
        TXCTRL2_5BITS => 5,
        TXCTRL2_7BITS => 7,
        TXCTRL2_6BITS => 6,
        _ => 8,
    };

    let divisor = (u32::from(wregs[W_BRGLO]) | (u32::from(wregs[W_BRGHI]) << 8)) + 2;
    let speed = clock / divisor;
    let baud = match txctrl1 & TXCTRL1_CLKMSK {
        TXCTRL1_CLK1X => speed,
        TXCTRL1_CLK16X => speed / 16,
        TXCTRL1_CLK32X => speed / 32,
        _ => speed / 64,
    };

    LineParameters {
        baud,
        parity,
        data_bits,
        stop_bits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wregs(txctrl1: u8, txctrl2: u8, lo: u8, hi: u8) -> [u8; SERIAL_REGS] {
        let mut w = [0u8; SERIAL_REGS];
        w[W_TXCTRL1] = txctrl1;
        w[W_TXCTRL2] = txctrl2;
        w[W_BRGLO] = lo;
        w[W_BRGHI] = hi;
        w
    }

    #[test]
    fn baud_divisor_and_clock_multiplier() {
        let p = derive_line_parameters(&wregs(TXCTRL1_CLK1X, 0, 0x0e, 0), 4_915_200);
        assert_eq!(p.baud, 307_200);

        let p = derive_line_parameters(&wregs(TXCTRL1_CLK16X, 0, 0x0e, 0), 4_915_200);
        assert_eq!(p.baud, 307_200 / 16);

        let p = derive_line_parameters(&wregs(TXCTRL1_CLK64X, 0, 0x0e, 0), 4_915_200);
        assert_eq!(p.baud, 4_800);
    }

    #[test]
    fn framing_fields() {
        let p = derive_line_parameters(
            &wregs(TXCTRL1_PAREN | TXCTRL1_PAREV | TXCTRL1_2STOP, TXCTRL2_7BITS, 0, 1),
            1_000_000,
        );
        assert_eq!(p.parity, Parity::Even);
        assert_eq!(p.stop_bits, 2);
        assert_eq!(p.data_bits, 7);
        assert_eq!(p.baud, 1_000_000 / 258);

        let p = derive_line_parameters(&wregs(TXCTRL1_PAREN | TXCTRL1_1STOP, TXCTRL2_6BITS, 0, 0), 1);
        assert_eq!(p.parity, Parity::Odd);
        assert_eq!(p.stop_bits, 1);
        assert_eq!(p.data_bits, 6);
    }
}
