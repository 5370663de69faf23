use std::cell::{Cell, RefCell};
use std::rc::Rc;

use strato_devices_serial::escc::regs::*;
use strato_devices_serial::{
    ChannelId, Escc, EsccConfig, EsccConfigError, LineParameters, Parity, SerialTransport,
};
use strato_platform::MmioHandler;

const B_CTRL: u64 = 0;
const A_CTRL: u64 = 4;
const A_DATA: u64 = 6;

#[derive(Default, Clone)]
struct Recorder {
    written: Rc<RefCell<Vec<u8>>>,
    params: Rc<RefCell<Vec<LineParameters>>>,
    accepted: Rc<Cell<u32>>,
}

impl SerialTransport for Recorder {
    fn write(&mut self, byte: u8) {
        self.written.borrow_mut().push(byte);
    }

    fn set_parameters(&mut self, params: &LineParameters) {
        self.params.borrow_mut().push(*params);
    }

    fn accept_input(&mut self) {
        self.accepted.set(self.accepted.get() + 1);
    }
}

fn write_reg(escc: &mut Escc, ctrl: u64, reg: u8, val: u8) {
    escc.write_u8(ctrl, reg);
    escc.write_u8(ctrl, val);
}

#[test]
fn reset_status_bits() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    assert_eq!(escc.read_u8(A_CTRL), 0x44);
    assert_eq!(escc.read_u8(B_CTRL), 0x44);
    assert_eq!(escc.read_register(ChannelId::A, R_SPEC), SPEC_BITS8 | SPEC_ALLSENT);

    let mut disabled = Escc::new(EsccConfig::sun_keyboard_mouse(4_915_200, 1, true)).unwrap();
    assert_eq!(disabled.read_u8(A_CTRL), 0x7c);
    assert_eq!(disabled.read_u8(B_CTRL), 0x7c);
}

#[test]
fn rejects_invalid_config() {
    let mut config = EsccConfig::default();
    config.frequency = 0;
    assert_eq!(Escc::new(config).unwrap_err(), EsccConfigError::ZeroFrequency);

    let mut config = EsccConfig::default();
    config.it_shift = 40;
    assert!(matches!(
        Escc::new(config).unwrap_err(),
        EsccConfigError::ItShiftTooLarge { it_shift: 40, .. }
    ));
}

#[test]
fn register_pointer_is_single_shot() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    escc.write_u8(A_CTRL, 0x02);
    assert_eq!(escc.register_pointer(ChannelId::A), 2);
    assert_eq!(escc.register_pointer(ChannelId::B), 0);

    escc.read_u8(A_CTRL);
    assert_eq!(escc.register_pointer(ChannelId::A), 0);

    // Point-high selects registers 8..15.
    escc.write_u8(A_CTRL, CMD_HI | 0x04);
    assert_eq!(escc.register_pointer(ChannelId::A), 12);
    escc.write_u8(A_CTRL, 0x0e);
    assert_eq!(escc.register_pointer(ChannelId::A), 0);
    assert_eq!(escc.write_register(ChannelId::A, W_BRGLO), 0x0e);
    assert_eq!(escc.read_register(ChannelId::A, R_BRGLO), 0x0e);
}

#[test]
fn baud_rate_follows_generator_and_clock_mode() {
    let mut escc = Escc::new(EsccConfig::serial(9_830_400, 1)).unwrap();
    let recorder = Recorder::default();
    escc.attach_transport(ChannelId::A, Box::new(recorder.clone()));
    assert_eq!(recorder.params.borrow().len(), 1, "attach pushes current settings");

    write_reg(&mut escc, A_CTRL, W_TXCTRL2 as u8, TXCTRL2_8BITS);
    write_reg(&mut escc, A_CTRL, W_BRGLO as u8, 0x0e);
    let last = *recorder.params.borrow().last().unwrap();
    assert_eq!(
        last,
        LineParameters {
            baud: 307_200,
            parity: Parity::None,
            data_bits: 8,
            stop_bits: 1,
        }
    );

    write_reg(
        &mut escc,
        A_CTRL,
        W_TXCTRL1 as u8,
        TXCTRL1_CLK16X | TXCTRL1_2STOP | TXCTRL1_PAREN | TXCTRL1_PAREV,
    );
    write_reg(&mut escc, A_CTRL, W_TXCTRL2 as u8, TXCTRL2_7BITS);
    let last = *recorder.params.borrow().last().unwrap();
    assert_eq!(last.baud, 19_200);
    assert_eq!(last.parity, Parity::Even);
    assert_eq!(last.stop_bits, 2);
    assert_eq!(last.data_bits, 7);
    assert_eq!(escc.line_parameters(ChannelId::A), last);
}

#[test]
fn transport_sees_writes_only_with_transmitter_enabled() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    let recorder = Recorder::default();
    escc.attach_transport(ChannelId::A, Box::new(recorder.clone()));

    escc.write_u8(A_DATA, b'x');
    assert!(recorder.written.borrow().is_empty());

    write_reg(&mut escc, A_CTRL, W_TXCTRL2 as u8, TXCTRL2_TXEN | TXCTRL2_8BITS);
    escc.write_u8(A_DATA, b'o');
    escc.write_u8(A_DATA, b'k');
    assert_eq!(*recorder.written.borrow(), b"ok");

    escc.receive(ChannelId::A, b'!');
    assert_eq!(escc.read_u8(A_DATA), b'!');
    assert_eq!(recorder.accepted.get(), 1);

    assert!(escc.detach_transport(ChannelId::A).is_some());
    escc.write_u8(A_DATA, b'?');
    assert_eq!(*recorder.written.borrow(), b"ok");
}

#[test]
fn mmio_byte_accesses() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    MmioHandler::write(&mut escc, A_CTRL, 1, 0x0c);
    MmioHandler::write(&mut escc, A_CTRL, 1, 0x42);
    assert_eq!(escc.write_register(ChannelId::A, W_BRGLO), 0x42);
    assert_eq!(MmioHandler::read(&mut escc, A_CTRL, 1), 0x44);
}

#[test]
#[should_panic]
fn mmio_rejects_wide_access() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    MmioHandler::read(&mut escc, A_CTRL, 2);
}

#[test]
#[should_panic]
fn mmio_rejects_offset_outside_window() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    MmioHandler::write(&mut escc, 8, 1, 0);
}

#[test]
fn reset_code_leaves_writer_pointer_latched() {
    let mut escc = Escc::new(EsccConfig::default()).unwrap();
    write_reg(&mut escc, A_CTRL, W_BRGLO as u8, 0x0e);

    escc.write_u8(B_CTRL, W_MINTR as u8);
    assert_eq!(escc.register_pointer(ChannelId::B), W_MINTR as u8);
    escc.write_u8(B_CTRL, MINTR_RST_A);

    assert_eq!(escc.register_pointer(ChannelId::B), W_MINTR as u8);
    assert_eq!(escc.register_pointer(ChannelId::A), 0);
    assert_eq!(escc.write_register(ChannelId::A, W_BRGLO), 0, "channel A was reset");

    // The latched pointer is consumed by the next access.
    escc.write_u8(B_CTRL, MINTR_STATUSHI);
    assert_eq!(escc.register_pointer(ChannelId::B), 0);
    assert_eq!(escc.write_register(ChannelId::B, W_MINTR), MINTR_STATUSHI);
}
