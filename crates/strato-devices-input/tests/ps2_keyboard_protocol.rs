use std::cell::Cell;
use std::rc::Rc;

use strato_devices_input::{InputEvent, InputSink, Ps2Keyboard, QKeyCode};

fn pending(kbd: &Ps2Keyboard) -> Vec<u8> {
    kbd.queue().to_vec()
}

#[test]
fn reset_command_queues_ack_and_power_on_reply() {
    let mut kbd = Ps2Keyboard::new();
    kbd.write_data(0xEE);
    kbd.write_data(0xF5);
    assert!(!kbd.scan_enabled());

    kbd.write_data(0xFF);
    assert_eq!(pending(&kbd), vec![0xFA, 0xAA], "reset replaces anything queued");
    assert!(kbd.scan_enabled());
    assert_eq!(kbd.scancode_set(), 2);
    assert_eq!(kbd.leds(), 0);

    assert_eq!(kbd.read_data(), 0xFA);
    assert_eq!(kbd.read_data(), 0xAA);
    assert!(kbd.queue().is_empty());

    // Nothing else is pending once the reply is consumed.
    let mut queue = kbd.queue().clone();
    assert_eq!(queue.pop(), 0x00);
}

#[test]
fn empty_read_repeats_last_byte_without_raising_irq() {
    let irq = Rc::new(Cell::new(false));
    let mut kbd = Ps2Keyboard::new();
    kbd.set_irq_line(irq.clone());

    kbd.write_data(0xEE);
    assert_eq!(kbd.read_data(), 0xEE);
    assert!(!irq.get());

    assert_eq!(kbd.read_data(), 0xEE);
    assert_eq!(kbd.read_data(), 0xEE);
    assert!(!irq.get(), "stale reads must not touch the IRQ line");
}

#[test]
fn resend_and_unknown_commands() {
    let mut kbd = Ps2Keyboard::new();
    kbd.write_data(0x05);
    kbd.write_data(0x00);
    kbd.write_data(0x99);
    assert_eq!(pending(&kbd), vec![0xFE, 0xFA, 0xFA]);
}

#[test]
fn set_rate_consumes_one_argument() {
    let mut kbd = Ps2Keyboard::new();
    kbd.write_data(0xF3);
    // 0xFF here is the typematic argument, not a reset.
    kbd.write_data(0xFF);
    assert_eq!(pending(&kbd), vec![0xFA, 0xFA]);
}

#[test]
fn set3_uses_its_own_table() {
    let mut kbd = Ps2Keyboard::new();
    kbd.write_data(0xF0);
    kbd.write_data(3);
    while !kbd.queue().is_empty() {
        kbd.read_data();
    }

    // Escape: PC keycode 0x01 maps to 0x08 in set 3 and 0x76 in set 2.
    kbd.handle_event(&InputEvent::Key {
        qcode: QKeyCode::Esc,
        down: true,
    });
    assert_eq!(pending(&kbd), vec![0x08]);
}

#[test]
fn pause_passes_prefix_through_untranslated() {
    let mut kbd = Ps2Keyboard::new();
    kbd.key_event(QKeyCode::Pause, true);
    assert_eq!(pending(&kbd), vec![0xE1, 0x14, 0x77]);
}
