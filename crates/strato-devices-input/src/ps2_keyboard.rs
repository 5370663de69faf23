use std::fmt;

use strato_io_snapshot::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};
use strato_platform::{IrqLine, NoIrq};

use crate::byte_queue::ByteQueue;
use crate::input::{InputEvent, InputSink};
use crate::keymap::QKeyCode;
use crate::scancode::{push_pc_sequence, SET2_RAW, SET3_RAW};

/// Ring size of the PS/2 output buffer.
pub const PS2_QUEUE_SIZE: usize = 16;
/// One slot is kept free, so the device holds at most this many pending bytes.
pub const PS2_QUEUE_DEPTH: usize = PS2_QUEUE_SIZE - 1;

const KBD_CMD_SET_LEDS: u8 = 0xED;
const KBD_CMD_ECHO: u8 = 0xEE;
const KBD_CMD_SCANCODE: u8 = 0xF0;
const KBD_CMD_GET_ID: u8 = 0xF2;
const KBD_CMD_SET_RATE: u8 = 0xF3;
const KBD_CMD_ENABLE: u8 = 0xF4;
const KBD_CMD_RESET_DISABLE: u8 = 0xF5;
const KBD_CMD_RESET_ENABLE: u8 = 0xF6;
const KBD_CMD_RESET: u8 = 0xFF;

pub const KBD_REPLY_POR: u8 = 0xAA;
pub const KBD_REPLY_ID: u8 = 0xAB;
pub const KBD_REPLY_ACK: u8 = 0xFA;
pub const KBD_REPLY_RESEND: u8 = 0xFE;

/// Command whose argument byte is expected next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpectingData {
    LedState,
    Typematic,
    ScancodeSet,
}

impl ExpectingData {
    fn command(self) -> u8 {
        match self {
            ExpectingData::LedState => KBD_CMD_SET_LEDS,
            ExpectingData::Typematic => KBD_CMD_SET_RATE,
            ExpectingData::ScancodeSet => KBD_CMD_SCANCODE,
        }
    }

    fn from_command(cmd: u8) -> Option<Self> {
        match cmd {
            KBD_CMD_SET_LEDS => Some(ExpectingData::LedState),
            KBD_CMD_SET_RATE => Some(ExpectingData::Typematic),
            KBD_CMD_SCANCODE => Some(ExpectingData::ScancodeSet),
            _ => None,
        }
    }
}

/// PS/2 keyboard attached to one port of a keyboard controller.
///
/// Bytes written by the guest are commands (or command arguments); host key events are turned
/// into scancodes and queued for the guest to read through [`Ps2Keyboard::read_data`]. The IRQ
/// line is held high while the output queue is non-empty.
pub struct Ps2Keyboard {
    queue: ByteQueue,
    expecting_data: Option<ExpectingData>,
    scan_enabled: bool,
    translate: bool,
    scancode_set: u8,
    leds: u8,
    irq: Box<dyn IrqLine>,
    led_callback: Option<Box<dyn FnMut(u8)>>,
}

impl Ps2Keyboard {
    pub fn new() -> Self {
        Self {
            queue: ByteQueue::with_depth(PS2_QUEUE_SIZE, PS2_QUEUE_DEPTH),
            expecting_data: None,
            scan_enabled: false,
            translate: false,
            scancode_set: 2,
            leds: 0,
            irq: Box::new(NoIrq),
            led_callback: None,
        }
    }

    pub fn set_irq_line(&mut self, irq: impl IrqLine + 'static) {
        self.irq = Box::new(irq);
        self.irq.set_level(!self.queue.is_empty());
    }

    /// Registers a host callback that receives the LED mask whenever the guest changes it.
    pub fn set_led_callback(&mut self, callback: impl FnMut(u8) + 'static) {
        self.led_callback = Some(Box::new(callback));
    }

    pub fn scancode_set(&self) -> u8 {
        self.scancode_set
    }

    pub fn leds(&self) -> u8 {
        self.leds
    }

    pub fn scan_enabled(&self) -> bool {
        self.scan_enabled
    }

    pub fn translation(&self) -> bool {
        self.translate
    }

    pub fn queue(&self) -> &ByteQueue {
        &self.queue
    }

    /// Selects whether the controller translates scancodes itself (raw set-1 codes are emitted).
    pub fn set_translation(&mut self, translate: bool) {
        tracing::trace!(translate, "ps2 keyboard set translation");
        self.translate = translate;
    }

    pub fn reset(&mut self) {
        tracing::trace!("ps2 keyboard reset");
        self.expecting_data = None;
        self.queue.clear();
        self.irq.set_level(false);
        self.scan_enabled = false;
        self.translate = false;
        self.scancode_set = 2;
    }

    fn queue_byte(&mut self, byte: u8) {
        if self.queue.push(byte) {
            tracing::trace!(byte, "ps2 keyboard queue");
            self.irq.set_level(true);
        } else {
            tracing::trace!(byte, "ps2 keyboard queue full, dropping byte");
        }
    }

    /// Reads the data port.
    ///
    /// With nothing pending the previously delivered byte is returned again and the IRQ line is
    /// left alone.
    pub fn read_data(&mut self) -> u8 {
        if self.queue.is_empty() {
            return self.queue.last_read();
        }
        let byte = self.queue.pop();
        self.irq.set_level(false);
        self.irq.set_level(!self.queue.is_empty());
        byte
    }

    /// Queues one PC keycode (bit 7 = release), converting to the active scancode set.
    pub fn put_keycode(&mut self, keycode: u8) {
        tracing::trace!(keycode, "ps2 keyboard put keycode");
        let mut code = keycode;
        if !self.translate && keycode < 0xE0 && self.scancode_set > 1 {
            if keycode & 0x80 != 0 {
                self.queue_byte(0xF0);
            }
            match self.scancode_set {
                2 => code = SET2_RAW[usize::from(keycode & 0x7f)],
                3 => code = SET3_RAW[usize::from(keycode & 0x7f)],
                _ => {}
            }
        }
        self.queue_byte(code);
    }

    /// Queues the scancodes for a host key edge.
    pub fn key_event(&mut self, qcode: QKeyCode, down: bool) {
        let mut seq = Vec::with_capacity(3);
        push_pc_sequence(&mut seq, qcode, down);
        for keycode in seq {
            self.put_keycode(keycode);
        }
    }

    fn reset_keyboard(&mut self) {
        self.scan_enabled = true;
        self.scancode_set = 2;
        self.set_leds(0);
    }

    fn set_leds(&mut self, leds: u8) {
        tracing::trace!(leds, "ps2 keyboard set leds");
        self.leds = leds;
        if let Some(cb) = self.led_callback.as_mut() {
            cb(leds);
        }
    }

    /// Handles a byte written by the guest to the data port.
    pub fn write_data(&mut self, byte: u8) {
        tracing::trace!(byte, "ps2 keyboard write");
        if let Some(expecting) = self.expecting_data.take() {
            self.handle_data_byte(expecting, byte);
            return;
        }

        match byte {
            0x00 => self.queue_byte(KBD_REPLY_ACK),
            0x05 => self.queue_byte(KBD_REPLY_RESEND),
            KBD_CMD_GET_ID => {
                // MF2 AT keyboard.
                self.queue_byte(KBD_REPLY_ACK);
                self.queue_byte(KBD_REPLY_ID);
                self.queue_byte(if self.translate { 0x41 } else { 0x83 });
            }
            KBD_CMD_ECHO => self.queue_byte(KBD_CMD_ECHO),
            KBD_CMD_ENABLE => {
                self.scan_enabled = true;
                self.queue_byte(KBD_REPLY_ACK);
            }
            KBD_CMD_SCANCODE | KBD_CMD_SET_LEDS | KBD_CMD_SET_RATE => {
                self.expecting_data = ExpectingData::from_command(byte);
                self.queue_byte(KBD_REPLY_ACK);
            }
            KBD_CMD_RESET_DISABLE => {
                self.reset_keyboard();
                self.scan_enabled = false;
                self.queue_byte(KBD_REPLY_ACK);
            }
            KBD_CMD_RESET_ENABLE => {
                self.reset_keyboard();
                self.scan_enabled = true;
                self.queue_byte(KBD_REPLY_ACK);
            }
            KBD_CMD_RESET => {
                self.queue.clear();
                self.reset_keyboard();
                self.queue_byte(KBD_REPLY_ACK);
                self.queue_byte(KBD_REPLY_POR);
            }
            _ => self.queue_byte(KBD_REPLY_ACK),
        }
    }

    fn handle_data_byte(&mut self, expecting: ExpectingData, byte: u8) {
        match expecting {
            ExpectingData::ScancodeSet => {
                if byte == 0 {
                    match self.scancode_set {
                        1 => self.put_keycode(0x43),
                        2 => self.put_keycode(0x41),
                        3 => self.put_keycode(0x3f),
                        _ => {}
                    }
                } else {
                    if (1..=3).contains(&byte) {
                        self.scancode_set = byte;
                    }
                    self.queue_byte(KBD_REPLY_ACK);
                }
            }
            ExpectingData::LedState => {
                self.set_leds(byte);
                self.queue_byte(KBD_REPLY_ACK);
            }
            ExpectingData::Typematic => self.queue_byte(KBD_REPLY_ACK),
        }
    }
}

impl Default for Ps2Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ps2Keyboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ps2Keyboard")
            .field("queue", &self.queue)
            .field("expecting_data", &self.expecting_data)
            .field("scan_enabled", &self.scan_enabled)
            .field("translate", &self.translate)
            .field("scancode_set", &self.scancode_set)
            .field("leds", &self.leds)
            .finish_non_exhaustive()
    }
}

impl InputSink for Ps2Keyboard {
    fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::Key { qcode, down } = *event {
            self.key_event(qcode, down);
        }
    }
}

impl IoSnapshot for Ps2Keyboard {
    const DEVICE_ID: [u8; 4] = *b"PS2K";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        const TAG_QUEUE: u16 = 1;
        const TAG_LAST_READ: u16 = 2;
        const TAG_WRITE_CMD: u16 = 3;
        const TAG_SCAN_ENABLED: u16 = 4;
        const TAG_TRANSLATE: u16 = 5;
        const TAG_SCANCODE_SET: u16 = 6;
        const TAG_LEDS: u16 = 7;

        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_bytes(TAG_QUEUE, self.queue.to_vec());
        w.field_u8(TAG_LAST_READ, self.queue.last_read());
        if let Some(expecting) = self.expecting_data {
            w.field_u8(TAG_WRITE_CMD, expecting.command());
        }
        w.field_bool(TAG_SCAN_ENABLED, self.scan_enabled);
        w.field_bool(TAG_TRANSLATE, self.translate);
        w.field_u8(TAG_SCANCODE_SET, self.scancode_set);
        w.field_u8(TAG_LEDS, self.leds);
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        const TAG_QUEUE: u16 = 1;
        const TAG_LAST_READ: u16 = 2;
        const TAG_WRITE_CMD: u16 = 3;
        const TAG_SCAN_ENABLED: u16 = 4;
        const TAG_TRANSLATE: u16 = 5;
        const TAG_SCANCODE_SET: u16 = 6;
        const TAG_LEDS: u16 = 7;

        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        let expecting_data = match r.u8(TAG_WRITE_CMD)? {
            None => None,
            Some(cmd) => Some(
                ExpectingData::from_command(cmd)
                    .ok_or(SnapshotError::InvalidFieldEncoding("invalid keyboard command"))?,
            ),
        };
        let scancode_set = r.u8(TAG_SCANCODE_SET)?.unwrap_or(2);
        if !(1..=3).contains(&scancode_set) {
            return Err(SnapshotError::InvalidFieldEncoding("invalid scancode set"));
        }
        let queued = r.bytes(TAG_QUEUE).unwrap_or(&[]);
        let last_read = r.u8(TAG_LAST_READ)?.unwrap_or(0);
        if !self.queue.restore(queued, last_read) {
            return Err(SnapshotError::InvalidFieldEncoding("keyboard queue overflow"));
        }

        self.expecting_data = expecting_data;
        self.scan_enabled = r.bool(TAG_SCAN_ENABLED)?.unwrap_or(false);
        self.translate = r.bool(TAG_TRANSLATE)?.unwrap_or(false);
        self.scancode_set = scancode_set;
        self.set_leds(r.u8(TAG_LEDS)?.unwrap_or(0));
        self.irq.set_level(!self.queue.is_empty());
        Ok(())
    }
}
