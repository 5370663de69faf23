use std::cell::Cell;
use std::rc::Rc;

use strato_devices_input::{
    InputAxis, InputEvent, InputSink, MouseProtocol, Ps2Keyboard, Ps2Mouse, QKeyCode,
};
use strato_io_snapshot::io::state::{IoSnapshot, SnapshotError, SnapshotWriter};

#[test]
fn keyboard_snapshot_restores_pending_command_and_queue() {
    let mut kbd = Ps2Keyboard::new();
    kbd.write_data(0xF0);
    kbd.write_data(3);
    kbd.key_event(QKeyCode::A, true);
    kbd.write_data(0xED);
    assert_eq!(kbd.read_data(), 0xFA);

    let snap = kbd.save_state();

    let irq = Rc::new(Cell::new(false));
    let leds = Rc::new(Cell::new(0xFFu8));
    let mut restored = Ps2Keyboard::new();
    restored.set_irq_line(irq.clone());
    restored.set_led_callback({
        let leds = leds.clone();
        move |mask| leds.set(mask)
    });
    restored.load_state(&snap).expect("keyboard snapshot should load");

    assert!(irq.get(), "pending bytes must re-assert the IRQ after load");
    assert_eq!(leds.get(), 0, "LED state is pushed to the host after load");
    assert_eq!(restored.scancode_set(), 3);
    assert_eq!(restored.queue().to_vec(), kbd.queue().to_vec());

    // The SET_LEDS argument is still expected.
    restored.write_data(0x02);
    assert_eq!(restored.leds(), 0x02);
    assert_eq!(leds.get(), 0x02);
}

#[test]
fn keyboard_snapshot_rejects_oversized_queue() {
    const TAG_QUEUE: u16 = 1;

    let mut w = SnapshotWriter::new(Ps2Keyboard::DEVICE_ID, Ps2Keyboard::DEVICE_VERSION);
    w.field_bytes(TAG_QUEUE, vec![0; 16]);

    let mut kbd = Ps2Keyboard::new();
    let err = kbd
        .load_state(&w.finish())
        .expect_err("queue larger than the device depth");
    assert_eq!(
        err,
        SnapshotError::InvalidFieldEncoding("keyboard queue overflow")
    );
}

#[test]
fn mouse_snapshot_preserves_protocol_and_unsent_motion() {
    let mut mouse = Ps2Mouse::new();
    for rate in [200, 200, 80] {
        mouse.write_data(0xF3);
        mouse.write_data(rate);
    }
    mouse.write_data(0xF4);
    while !mouse.queue().is_empty() {
        mouse.read_data();
    }
    mouse.write_data(0xF0);
    mouse.read_data();
    mouse.handle_event(&InputEvent::Rel {
        axis: InputAxis::X,
        value: 40,
    });

    let snap = mouse.save_state();
    let mut restored = Ps2Mouse::new();
    restored.load_state(&snap).expect("mouse snapshot should load");

    assert_eq!(restored.protocol(), MouseProtocol::ImEx);
    assert_eq!(restored.status(), mouse.status());
    assert_eq!(restored.pending_motion(), (40, 0, 0));
    assert_eq!(restored.save_state(), snap);
}

#[test]
fn mouse_snapshot_rejects_unknown_type() {
    const TAG_TYPE: u16 = 8;

    let mut w = SnapshotWriter::new(Ps2Mouse::DEVICE_ID, Ps2Mouse::DEVICE_VERSION);
    w.field_u8(TAG_TYPE, 2);

    let err = Ps2Mouse::new()
        .load_state(&w.finish())
        .expect_err("mouse type 2 does not exist");
    assert_eq!(err, SnapshotError::InvalidFieldEncoding("invalid mouse type"));
}
