use std::cell::RefCell;
use std::rc::Rc;

use strato_devices_input::{InputAxis, InputEvent, InputSink, MouseButton, MouseButtons, QKeyCode};
use strato_devices_serial::escc::regs::*;
use strato_devices_serial::{sun_keycode, ChannelId, Escc, EsccConfig, SunKeyboard, SunMouse};

// Keyboard on A, mouse on B, it_shift = 1.
const B_DATA: u64 = 2;
const A_CTRL: u64 = 4;
const A_DATA: u64 = 6;

fn sun_escc(disabled: bool) -> Escc {
    let mut escc = Escc::new(EsccConfig::sun_keyboard_mouse(4_915_200, 1, disabled)).unwrap();
    escc.write_u8(A_CTRL, W_TXCTRL2 as u8);
    escc.write_u8(A_CTRL, TXCTRL2_TXEN | TXCTRL2_8BITS);
    escc
}

fn drain(escc: &mut Escc, data: u64) -> Vec<u8> {
    let mut out = Vec::new();
    while escc.read_u8(data - 2) & 0x01 != 0 {
        out.push(escc.read_u8(data));
    }
    out
}

#[test]
fn keyboard_reset_reports_type4() {
    let mut escc = sun_escc(false);
    escc.write_u8(A_DATA, 0x01);
    assert_ne!(escc.read_u8(A_CTRL) & 0x01, 0, "RX available");
    assert_eq!(drain(&mut escc, A_DATA), vec![0xff, 0x04, 0x7f]);
    assert!(escc.queued_bytes(ChannelId::A).is_empty());
}

#[test]
fn keyboard_layout_query() {
    let mut escc = sun_escc(false);
    escc.key_event(QKeyCode::A, true);
    escc.write_u8(A_DATA, 0x0f);
    assert_eq!(escc.queued_bytes(ChannelId::A), vec![0xfe, 0x21], "layout reply replaces queue");
}

#[test]
fn led_command_swallows_its_argument() {
    let mut escc = sun_escc(false);
    escc.write_u8(A_DATA, 0x0e);
    // LED mask that happens to look like the reset command.
    escc.write_u8(A_DATA, 0x01);
    assert!(escc.queued_bytes(ChannelId::A).is_empty());
    escc.write_u8(A_DATA, 0x01);
    assert_eq!(escc.queued_bytes(ChannelId::A), vec![0xff, 0x04, 0x7f]);
}

#[test]
fn disabled_keyboard_ignores_commands() {
    let mut escc = sun_escc(true);
    escc.write_u8(A_DATA, 0x01);
    assert!(escc.queued_bytes(ChannelId::A).is_empty());
}

#[test]
fn key_press_and_release() {
    let mut escc = sun_escc(false);
    let code = sun_keycode(QKeyCode::A).unwrap();
    escc.key_event(QKeyCode::A, true);
    escc.key_event(QKeyCode::A, false);
    assert_eq!(escc.queued_bytes(ChannelId::A), vec![code, code | 0x80]);
}

#[test]
fn repeated_caps_lock_press_emits_once() {
    let mut escc = sun_escc(false);
    let code = sun_keycode(QKeyCode::CapsLock).unwrap();
    escc.key_event(QKeyCode::CapsLock, true);
    escc.key_event(QKeyCode::CapsLock, true);
    assert_eq!(escc.queued_bytes(ChannelId::A), vec![code]);
}

#[test]
fn caps_lock_full_toggle_cycle() {
    let mut escc = sun_escc(false);
    let code = sun_keycode(QKeyCode::CapsLock).unwrap();
    for down in [true, false, true, false] {
        escc.key_event(QKeyCode::CapsLock, down);
    }
    assert_eq!(escc.queued_bytes(ChannelId::A), vec![code, code | 0x80]);
}

#[test]
fn keys_without_sun_code_are_dropped() {
    let mut escc = sun_escc(false);
    escc.key_event(QKeyCode::Pause, true);
    assert!(escc.queued_bytes(ChannelId::A).is_empty());
}

#[test]
fn mouse_packet_layout() {
    let mut escc = sun_escc(false);
    escc.mouse_event(5, 3, 0, MouseButtons::LEFT);
    assert_eq!(drain(&mut escc, B_DATA), vec![0x83, 5, 0xfd, 0, 0]);

    escc.mouse_event(500, -500, 0, MouseButtons::RIGHT | MouseButtons::MIDDLE);
    assert_eq!(escc.queued_bytes(ChannelId::B), vec![0x84, 127, 127, 0, 0]);
}

#[test]
fn sinks_route_host_events() {
    let escc = Rc::new(RefCell::new(sun_escc(false)));
    let mut kbd = SunKeyboard::new(escc.clone());
    let mut mouse = SunMouse::new(escc.clone());

    kbd.handle_event(&InputEvent::Key {
        qcode: QKeyCode::Esc,
        down: true,
    });
    assert_eq!(
        escc.borrow().queued_bytes(ChannelId::A),
        vec![sun_keycode(QKeyCode::Esc).unwrap()]
    );

    mouse.handle_event(&InputEvent::Rel {
        axis: InputAxis::X,
        value: 2,
    });
    mouse.handle_event(&InputEvent::Rel {
        axis: InputAxis::X,
        value: 3,
    });
    mouse.handle_event(&InputEvent::Button {
        button: MouseButton::Left,
        down: true,
    });
    assert!(escc.borrow().queued_bytes(ChannelId::B).is_empty(), "nothing before sync");

    mouse.sync();
    mouse.sync();
    assert_eq!(escc.borrow().queued_bytes(ChannelId::B), vec![0x83, 5, 0, 0, 0]);
}

#[test]
fn mouse_accumulator_saturates() {
    let escc = Rc::new(RefCell::new(sun_escc(false)));
    let mut mouse = SunMouse::new(escc.clone());

    for _ in 0..3 {
        mouse.handle_event(&InputEvent::Rel {
            axis: InputAxis::X,
            value: i32::MAX,
        });
    }
    mouse.handle_event(&InputEvent::Rel {
        axis: InputAxis::Y,
        value: i32::MIN,
    });
    mouse.sync();

    // dy = i32::MIN goes up, which the packet reports as +127.
    assert_eq!(escc.borrow().queued_bytes(ChannelId::B), vec![0x87, 127, 127, 0, 0]);
}
