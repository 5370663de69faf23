use std::fmt;

use bitflags::bitflags;
use strato_io_snapshot::io::state::{
    IoSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};
use strato_platform::{IrqLine, NoIrq};

use crate::byte_queue::ByteQueue;
use crate::input::{InputAxis, InputEvent, InputSink, MouseButton, MouseButtons};
use crate::ps2_keyboard::{PS2_QUEUE_DEPTH, PS2_QUEUE_SIZE};

const AUX_SET_SCALE11: u8 = 0xE6;
const AUX_SET_SCALE21: u8 = 0xE7;
const AUX_SET_RES: u8 = 0xE8;
const AUX_GET_SCALE: u8 = 0xE9;
const AUX_SET_STREAM: u8 = 0xEA;
const AUX_POLL: u8 = 0xEB;
const AUX_RESET_WRAP: u8 = 0xEC;
const AUX_SET_WRAP: u8 = 0xEE;
const AUX_SET_REMOTE: u8 = 0xF0;
const AUX_GET_TYPE: u8 = 0xF2;
const AUX_SET_SAMPLE: u8 = 0xF3;
const AUX_ENABLE_DEV: u8 = 0xF4;
const AUX_DISABLE_DEV: u8 = 0xF5;
const AUX_SET_DEFAULT: u8 = 0xF6;
const AUX_RESET: u8 = 0xFF;

pub const AUX_ACK: u8 = 0xFA;

/// Stream-mode packets stop once the queue holds this many bytes.
const SYNC_QUEUE_LIMIT: usize = PS2_QUEUE_SIZE - 4;

bitflags! {
    /// Status byte reported by `GET_SCALE` (0xE9).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseStatus: u8 {
        const SCALE21 = 0x10;
        const ENABLED = 0x20;
        const REMOTE = 0x40;
    }
}

/// Packet format negotiated with the guest driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseProtocol {
    /// Plain 3-byte packets.
    #[default]
    Ps2,
    /// IntelliMouse: 4th byte carries the wheel.
    ImPs2,
    /// IntelliMouse Explorer: 4th byte carries a 4-bit wheel and buttons 4/5.
    ImEx,
}

impl MouseProtocol {
    /// Device id returned by `GET_TYPE`.
    pub fn id(self) -> u8 {
        match self {
            MouseProtocol::Ps2 => 0,
            MouseProtocol::ImPs2 => 3,
            MouseProtocol::ImEx => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(MouseProtocol::Ps2),
            3 => Some(MouseProtocol::ImPs2),
            4 => Some(MouseProtocol::ImEx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpectingData {
    Resolution,
    SampleRate,
}

impl ExpectingData {
    fn command(self) -> u8 {
        match self {
            ExpectingData::Resolution => AUX_SET_RES,
            ExpectingData::SampleRate => AUX_SET_SAMPLE,
        }
    }

    fn from_command(cmd: u8) -> Option<Self> {
        match cmd {
            AUX_SET_RES => Some(ExpectingData::Resolution),
            AUX_SET_SAMPLE => Some(ExpectingData::SampleRate),
            _ => None,
        }
    }
}

/// PS/2 mouse with IntelliMouse wheel extensions.
pub struct Ps2Mouse {
    queue: ByteQueue,
    expecting_data: Option<ExpectingData>,
    status: MouseStatus,
    resolution: u8,
    sample_rate: u8,
    wrap: bool,
    protocol: MouseProtocol,
    detect_state: u8,
    dx: i32,
    dy: i32,
    dz: i32,
    buttons: MouseButtons,
    irq: Box<dyn IrqLine>,
}

impl Ps2Mouse {
    pub fn new() -> Self {
        Self {
            queue: ByteQueue::with_depth(PS2_QUEUE_SIZE, PS2_QUEUE_DEPTH),
            expecting_data: None,
            status: MouseStatus::empty(),
            resolution: 0,
            sample_rate: 0,
            wrap: false,
            protocol: MouseProtocol::Ps2,
            detect_state: 0,
            dx: 0,
            dy: 0,
            dz: 0,
            buttons: MouseButtons::empty(),
            irq: Box::new(NoIrq),
        }
    }

    pub fn set_irq_line(&mut self, irq: impl IrqLine + 'static) {
        self.irq = Box::new(irq);
        self.irq.set_level(!self.queue.is_empty());
    }

    pub fn status(&self) -> MouseStatus {
        self.status
    }

    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    pub fn sample_rate(&self) -> u8 {
        self.sample_rate
    }

    pub fn wrap_mode(&self) -> bool {
        self.wrap
    }

    pub fn protocol(&self) -> MouseProtocol {
        self.protocol
    }

    pub fn buttons(&self) -> MouseButtons {
        self.buttons
    }

    /// Motion not yet reported to the guest.
    pub fn pending_motion(&self) -> (i32, i32, i32) {
        (self.dx, self.dy, self.dz)
    }

    pub fn queue(&self) -> &ByteQueue {
        &self.queue
    }

    pub fn reset(&mut self) {
        tracing::trace!("ps2 mouse reset");
        self.expecting_data = None;
        self.queue.clear();
        self.irq.set_level(false);
        self.status = MouseStatus::empty();
        self.resolution = 0;
        self.sample_rate = 0;
        self.wrap = false;
        self.protocol = MouseProtocol::Ps2;
        self.detect_state = 0;
        self.dx = 0;
        self.dy = 0;
        self.dz = 0;
        self.buttons = MouseButtons::empty();
    }

    fn queue_byte(&mut self, byte: u8) {
        if self.queue.push(byte) {
            tracing::trace!(byte, "ps2 mouse queue");
            self.irq.set_level(true);
        } else {
            tracing::trace!(byte, "ps2 mouse queue full, dropping byte");
        }
    }

    /// Reads the data port; see [`crate::Ps2Keyboard::read_data`] for the empty-queue behavior.
    pub fn read_data(&mut self) -> u8 {
        if self.queue.is_empty() {
            return self.queue.last_read();
        }
        let byte = self.queue.pop();
        self.irq.set_level(false);
        self.irq.set_level(!self.queue.is_empty());
        byte
    }

    fn send_packet(&mut self) {
        let dx = self.dx.clamp(-127, 127);
        let dy = self.dy.clamp(-127, 127);
        let mut dz = self.dz;

        let b = 0x08
            | (u8::from(dx < 0) << 4)
            | (u8::from(dy < 0) << 5)
            | (self.buttons.bits() & 0x07);
        self.queue_byte(b);
        self.queue_byte(dx as u8);
        self.queue_byte(dy as u8);

        match self.protocol {
            MouseProtocol::Ps2 => {}
            MouseProtocol::ImPs2 => {
                dz = dz.clamp(-127, 127);
                self.queue_byte(dz as u8);
            }
            MouseProtocol::ImEx => {
                dz = dz.clamp(-7, 7);
                let b = (dz as u8 & 0x0f) | ((self.buttons.bits() & 0x18) << 1);
                self.queue_byte(b);
            }
        }

        tracing::trace!(dx, dy, dz, buttons = self.buttons.bits(), "ps2 mouse packet");
        self.dx -= dx;
        self.dy -= dy;
        self.dz -= dz;
    }

    /// Emits stream-mode packets for the accumulated motion.
    ///
    /// Large deltas are split across several packets, as long as the queue has room; whatever
    /// does not fit stays accumulated for the next sync.
    pub fn flush_motion(&mut self) {
        if !self.status.contains(MouseStatus::ENABLED) || self.status.contains(MouseStatus::REMOTE)
        {
            return;
        }
        while self.queue.len() < SYNC_QUEUE_LIMIT {
            self.send_packet();
            if self.dx == 0 && self.dy == 0 && self.dz == 0 {
                break;
            }
        }
    }

    /// Nudges the pointer by one unit so that a driver waiting for movement wakes up.
    pub fn fake_event(&mut self) {
        tracing::trace!("ps2 mouse fake event");
        self.dx = self.dx.saturating_add(1);
        self.flush_motion();
    }

    fn host_event(&mut self, event: &InputEvent) {
        if !self.status.contains(MouseStatus::ENABLED) {
            return;
        }
        match *event {
            InputEvent::Rel {
                axis: InputAxis::X,
                value,
            } => self.dx = self.dx.saturating_add(value),
            InputEvent::Rel {
                axis: InputAxis::Y,
                value,
            } => self.dy = self.dy.saturating_sub(value),
            InputEvent::Button { button, down } => {
                if down {
                    self.buttons |= button.mask();
                    match button {
                        MouseButton::WheelUp => self.dz = self.dz.saturating_sub(1),
                        MouseButton::WheelDown => self.dz = self.dz.saturating_add(1),
                        _ => {}
                    }
                } else {
                    self.buttons.remove(button.mask());
                }
            }
            InputEvent::Key { .. } => {}
        }
    }

    /// Handles a byte written by the guest to the mouse.
    pub fn write_data(&mut self, byte: u8) {
        tracing::trace!(byte, "ps2 mouse write");
        if let Some(expecting) = self.expecting_data.take() {
            self.handle_data_byte(expecting, byte);
            return;
        }

        if self.wrap {
            if byte == AUX_RESET_WRAP {
                self.wrap = false;
                self.queue_byte(AUX_ACK);
                return;
            } else if byte != AUX_RESET {
                self.queue_byte(byte);
                return;
            }
        }

        match byte {
            AUX_SET_SCALE11 => {
                self.status.remove(MouseStatus::SCALE21);
                self.queue_byte(AUX_ACK);
            }
            AUX_SET_SCALE21 => {
                self.status.insert(MouseStatus::SCALE21);
                self.queue_byte(AUX_ACK);
            }
            AUX_SET_STREAM => {
                self.status.remove(MouseStatus::REMOTE);
                self.queue_byte(AUX_ACK);
            }
            AUX_SET_WRAP => {
                self.wrap = true;
                self.queue_byte(AUX_ACK);
            }
            AUX_SET_REMOTE => {
                self.status.insert(MouseStatus::REMOTE);
                self.queue_byte(AUX_ACK);
            }
            AUX_GET_TYPE => {
                self.queue_byte(AUX_ACK);
                self.queue_byte(self.protocol.id());
            }
            AUX_SET_RES | AUX_SET_SAMPLE => {
                self.expecting_data = ExpectingData::from_command(byte);
                self.queue_byte(AUX_ACK);
            }
            AUX_GET_SCALE => {
                self.queue_byte(AUX_ACK);
                self.queue_byte(self.status.bits());
                self.queue_byte(self.resolution);
                self.queue_byte(self.sample_rate);
            }
            AUX_POLL => {
                self.queue_byte(AUX_ACK);
                self.send_packet();
            }
            AUX_ENABLE_DEV => {
                self.status.insert(MouseStatus::ENABLED);
                self.queue_byte(AUX_ACK);
            }
            AUX_DISABLE_DEV => {
                self.status.remove(MouseStatus::ENABLED);
                self.queue_byte(AUX_ACK);
            }
            AUX_SET_DEFAULT => {
                self.sample_rate = 100;
                self.resolution = 2;
                self.status = MouseStatus::empty();
                self.queue_byte(AUX_ACK);
            }
            AUX_RESET => {
                self.sample_rate = 100;
                self.resolution = 2;
                self.status = MouseStatus::empty();
                self.protocol = MouseProtocol::Ps2;
                self.queue_byte(AUX_ACK);
                self.queue_byte(0xAA);
                self.queue_byte(self.protocol.id());
            }
            _ => tracing::debug!(byte, "ps2 mouse: ignoring unknown command"),
        }
    }

    fn handle_data_byte(&mut self, expecting: ExpectingData, byte: u8) {
        match expecting {
            ExpectingData::SampleRate => {
                self.sample_rate = byte;
                self.detect_protocol(byte);
                self.queue_byte(AUX_ACK);
            }
            ExpectingData::Resolution => {
                self.resolution = byte;
                self.queue_byte(AUX_ACK);
            }
        }
    }

    /// Recognizes the IntelliMouse sample-rate knock sequences (200,100,80 and 200,200,80).
    fn detect_protocol(&mut self, rate: u8) {
        self.detect_state = match (self.detect_state, rate) {
            (1, 100) => 2,
            (1, 200) => 3,
            (2, 80) => {
                self.protocol = MouseProtocol::ImPs2;
                0
            }
            (3, 80) => {
                self.protocol = MouseProtocol::ImEx;
                0
            }
            (0, 200) => 1,
            _ => 0,
        };
        tracing::trace!(rate, state = self.detect_state, "ps2 mouse detect");
    }
}

impl Default for Ps2Mouse {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ps2Mouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ps2Mouse")
            .field("queue", &self.queue)
            .field("expecting_data", &self.expecting_data)
            .field("status", &self.status)
            .field("resolution", &self.resolution)
            .field("sample_rate", &self.sample_rate)
            .field("wrap", &self.wrap)
            .field("protocol", &self.protocol)
            .field("detect_state", &self.detect_state)
            .field("delta", &(self.dx, self.dy, self.dz))
            .field("buttons", &self.buttons)
            .finish_non_exhaustive()
    }
}

impl InputSink for Ps2Mouse {
    fn handle_event(&mut self, event: &InputEvent) {
        self.host_event(event);
    }

    fn sync(&mut self) {
        self.flush_motion();
    }
}

impl IoSnapshot for Ps2Mouse {
    const DEVICE_ID: [u8; 4] = *b"PS2M";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        const TAG_QUEUE: u16 = 1;
        const TAG_LAST_READ: u16 = 2;
        const TAG_WRITE_CMD: u16 = 3;
        const TAG_STATUS: u16 = 4;
        const TAG_RESOLUTION: u16 = 5;
        const TAG_SAMPLE_RATE: u16 = 6;
        const TAG_WRAP: u16 = 7;
        const TAG_TYPE: u16 = 8;
        const TAG_DETECT_STATE: u16 = 9;
        const TAG_DX: u16 = 10;
        const TAG_DY: u16 = 11;
        const TAG_DZ: u16 = 12;
        const TAG_BUTTONS: u16 = 13;

        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_bytes(TAG_QUEUE, self.queue.to_vec());
        w.field_u8(TAG_LAST_READ, self.queue.last_read());
        if let Some(expecting) = self.expecting_data {
            w.field_u8(TAG_WRITE_CMD, expecting.command());
        }
        w.field_u8(TAG_STATUS, self.status.bits());
        w.field_u8(TAG_RESOLUTION, self.resolution);
        w.field_u8(TAG_SAMPLE_RATE, self.sample_rate);
        w.field_bool(TAG_WRAP, self.wrap);
        w.field_u8(TAG_TYPE, self.protocol.id());
        w.field_u8(TAG_DETECT_STATE, self.detect_state);
        w.field_i32(TAG_DX, self.dx);
        w.field_i32(TAG_DY, self.dy);
        w.field_i32(TAG_DZ, self.dz);
        w.field_u8(TAG_BUTTONS, self.buttons.bits());
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        const TAG_QUEUE: u16 = 1;
        const TAG_LAST_READ: u16 = 2;
        const TAG_WRITE_CMD: u16 = 3;
        const TAG_STATUS: u16 = 4;
        const TAG_RESOLUTION: u16 = 5;
        const TAG_SAMPLE_RATE: u16 = 6;
        const TAG_WRAP: u16 = 7;
        const TAG_TYPE: u16 = 8;
        const TAG_DETECT_STATE: u16 = 9;
        const TAG_DX: u16 = 10;
        const TAG_DY: u16 = 11;
        const TAG_DZ: u16 = 12;
        const TAG_BUTTONS: u16 = 13;

        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        let expecting_data = match r.u8(TAG_WRITE_CMD)? {
            None => None,
            Some(cmd) => Some(
                ExpectingData::from_command(cmd)
                    .ok_or(SnapshotError::InvalidFieldEncoding("invalid mouse command"))?,
            ),
        };
        let protocol = MouseProtocol::from_id(r.u8(TAG_TYPE)?.unwrap_or(0))
            .ok_or(SnapshotError::InvalidFieldEncoding("invalid mouse type"))?;
        let detect_state = r.u8(TAG_DETECT_STATE)?.unwrap_or(0);
        if detect_state > 3 {
            return Err(SnapshotError::InvalidFieldEncoding("invalid detect state"));
        }
        let queued = r.bytes(TAG_QUEUE).unwrap_or(&[]);
        let last_read = r.u8(TAG_LAST_READ)?.unwrap_or(0);
        if !self.queue.restore(queued, last_read) {
            return Err(SnapshotError::InvalidFieldEncoding("mouse queue overflow"));
        }

        self.expecting_data = expecting_data;
        self.status = MouseStatus::from_bits_truncate(r.u8(TAG_STATUS)?.unwrap_or(0));
        self.resolution = r.u8(TAG_RESOLUTION)?.unwrap_or(0);
        self.sample_rate = r.u8(TAG_SAMPLE_RATE)?.unwrap_or(0);
        self.wrap = r.bool(TAG_WRAP)?.unwrap_or(false);
        self.protocol = protocol;
        self.detect_state = detect_state;
        self.dx = r.i32(TAG_DX)?.unwrap_or(0);
        self.dy = r.i32(TAG_DY)?.unwrap_or(0);
        self.dz = r.i32(TAG_DZ)?.unwrap_or(0);
        self.buttons = MouseButtons::from_bits_truncate(r.u8(TAG_BUTTONS)?.unwrap_or(0));
        self.irq.set_level(!self.queue.is_empty());
        Ok(())
    }
}
