//! Sun type-4 keyboard and Mouse Systems mouse protocols carried over ESCC channels.

use std::cell::RefCell;
use std::rc::Rc;

use strato_devices_input::{InputAxis, InputEvent, InputSink, MouseButton, MouseButtons, QKeyCode};

use super::channel::ChannelId;
use super::Escc;
use crate::config::ChannelRole;

const SKBD_CMD_RESET: u8 = 0x01;
const SKBD_CMD_LAYOUT: u8 = 0x07;
const SKBD_CMD_SET_LEDS: u8 = 0x0e;
const SKBD_CMD_LAYOUT2: u8 = 0x0f;

const SKBD_REPLY_RESET: u8 = 0xff;
const SKBD_REPLY_LAYOUT: u8 = 0xfe;
const SKBD_TYPE4: u8 = 0x04;
const SKBD_IDLE: u8 = 0x7f;

/// Key release flag in a Sun keycode.
pub const SUN_KEY_UP: u8 = 0x80;

/// Sun keycode for a host key, if the keyboard has one.
pub fn sun_keycode(code: QKeyCode) -> Option<u8> {
    use QKeyCode::*;

    let keycode = match code {
        Stop => 1,
        Again => 3,
        F1 => 5,
        F2 => 6,
        F10 => 7,
        F3 => 8,
        F11 => 9,
        F4 => 10,
        F12 => 11,
        F5 => 12,
        AltR | AltGr => 13,
        F6 => 14,
        F7 => 16,
        F8 => 17,
        F9 => 18,
        Alt => 19,
        Up => 20,
        SysRq => 21,
        Print => 22,
        ScrollLock => 23,
        Left => 24,
        Props => 25,
        Undo => 26,
        Down => 27,
        Right => 28,
        Esc => 29,
        Digit1 => 30,
        Digit2 => 31,
        Digit3 => 32,
        Digit4 => 33,
        Digit5 => 34,
        Digit6 => 35,
        Digit7 => 36,
        Digit8 => 37,
        Digit9 => 38,
        Digit0 => 39,
        Minus => 40,
        Equal => 41,
        GraveAccent => 42,
        Backspace => 43,
        Insert => 44,
        KpDivide => 46,
        Asterisk | KpMultiply => 47,
        Front => 49,
        KpDecimal => 50,
        Copy => 51,
        Home => 52,
        Tab => 53,
        Q => 54,
        W => 55,
        E => 56,
        R => 57,
        T => 58,
        Y => 59,
        U => 60,
        I => 61,
        O => 62,
        P => 63,
        BracketLeft => 64,
        BracketRight => 65,
        Delete => 66,
        Compose => 67,
        Kp7 => 68,
        Kp8 => 69,
        Kp9 => 70,
        KpSubtract => 71,
        Open => 72,
        Paste => 73,
        End => 74,
        Ctrl | CtrlR => 76,
        A => 77,
        S => 78,
        D => 79,
        F => 80,
        G => 81,
        H => 82,
        J => 83,
        K => 84,
        L => 85,
        Semicolon => 86,
        Apostrophe => 87,
        Backslash => 88,
        Ret => 89,
        KpEnter => 90,
        Kp4 => 91,
        Kp5 => 92,
        Kp6 => 93,
        Kp0 => 94,
        Find => 95,
        PgUp => 96,
        Cut => 97,
        NumLock => 98,
        Shift => 99,
        Z => 100,
        X => 101,
        C => 102,
        V => 103,
        B => 104,
        N => 105,
        M => 106,
        Comma => 107,
        Dot => 108,
        Slash => 109,
        ShiftR => 110,
        Lf => 111,
        Kp1 => 112,
        Kp2 => 113,
        Kp3 => 114,
        Help => 118,
        CapsLock => 119,
        MetaL => 120,
        Spc => 121,
        MetaR => 122,
        PgDn => 123,
        Less => 124,
        KpAdd => 125,
        AltGrR | Menu | Pause => return None,
    };
    Some(keycode)
}

/// Edge filter for the lock keys, which a Sun keyboard reports as toggles.
///
/// The first press goes out as a make and the second release as a break; the edges in between
/// are swallowed, as are repeated presses or releases. `mode` walks 0 -> 1 -> 3 -> 2 -> 0.
fn lock_toggle_passes(mode: &mut u8, down: bool) -> bool {
    let (next, passes) = match (*mode, down) {
        (0, true) => (1, true),
        (1, false) => (3, false),
        (3, true) => (2, false),
        (2, false) => (0, true),
        (unchanged, _) => (unchanged, false),
    };
    *mode = next;
    passes
}

impl Escc {
    fn channel_with_role(&self, role: ChannelRole) -> Option<ChannelId> {
        [ChannelId::A, ChannelId::B]
            .into_iter()
            .find(|id| self.chn[id.index()].role == role)
    }

    /// Command byte written by the guest to a keyboard-role channel.
    pub(crate) fn handle_kbd_command(&mut self, id: ChannelId, val: u8) {
        tracing::trace!(chn = %id, val, "escc kbd command");
        let chn = &mut self.chn[id.index()];
        if chn.led_mode {
            chn.led_mode = false;
            return;
        }
        match val {
            SKBD_CMD_RESET => {
                self.clear_queue(id);
                self.put_queue(id, SKBD_REPLY_RESET);
                self.put_queue(id, SKBD_TYPE4);
                self.put_queue(id, SKBD_IDLE);
            }
            SKBD_CMD_SET_LEDS => chn.led_mode = true,
            SKBD_CMD_LAYOUT | SKBD_CMD_LAYOUT2 => {
                let layout = self.config.keyboard_layout;
                self.clear_queue(id);
                self.put_queue(id, SKBD_REPLY_LAYOUT);
                self.put_queue(id, layout);
            }
            _ => tracing::debug!(chn = %id, val, "escc: ignoring unknown keyboard command"),
        }
    }

    /// Host key edge for the keyboard-role channel.
    pub fn key_event(&mut self, qcode: QKeyCode, down: bool) {
        let Some(id) = self.channel_with_role(ChannelRole::Keyboard) else {
            tracing::debug!(%qcode, "escc: no keyboard channel, dropping key");
            return;
        };
        tracing::trace!(chn = %id, %qcode, down, "escc sunkbd event in");

        let chn = &mut self.chn[id.index()];
        let passes = match qcode {
            QKeyCode::CapsLock => lock_toggle_passes(&mut chn.caps_lock_mode, down),
            QKeyCode::NumLock => lock_toggle_passes(&mut chn.num_lock_mode, down),
            _ => true,
        };
        if !passes {
            tracing::trace!(chn = %id, %qcode, down, "escc sunkbd dropping duplicate lock edge");
            return;
        }

        let Some(mut keycode) = sun_keycode(qcode) else {
            tracing::debug!(%qcode, "escc: key has no Sun keycode");
            return;
        };
        if !down {
            keycode |= SUN_KEY_UP;
        }
        tracing::trace!(chn = %id, keycode, "escc sunkbd event out");
        self.put_queue(id, keycode);
    }

    /// Queues one 5-byte Mouse Systems packet on the mouse-role channel.
    ///
    /// `dy` grows downwards, as reported by the host; the packet carries it inverted. `dz` is
    /// accepted for symmetry with other pointer devices but the protocol has no wheel.
    pub fn mouse_event(&mut self, dx: i32, dy: i32, dz: i32, buttons: MouseButtons) {
        let Some(id) = self.channel_with_role(ChannelRole::Mouse) else {
            tracing::debug!("escc: no mouse channel, dropping motion");
            return;
        };
        tracing::trace!(chn = %id, dx, dy, dz, buttons = buttons.bits(), "escc sunmouse event");

        // Start byte; button bits are active low.
        let mut start = 0x87;
        if buttons.contains(MouseButtons::LEFT) {
            start ^= 0x04;
        }
        if buttons.contains(MouseButtons::MIDDLE) {
            start ^= 0x02;
        }
        if buttons.contains(MouseButtons::RIGHT) {
            start ^= 0x01;
        }

        self.put_queue(id, start);
        self.put_queue(id, dx.clamp(-127, 127) as u8);
        self.put_queue(id, dy.saturating_neg().clamp(-127, 127) as u8);
        // Second motion report, unused.
        self.put_queue(id, 0);
        self.put_queue(id, 0);
    }
}

/// Routes host keyboard events to the keyboard-role channel of a shared controller.
#[derive(Debug, Clone)]
pub struct SunKeyboard {
    escc: Rc<RefCell<Escc>>,
}

impl SunKeyboard {
    pub fn new(escc: Rc<RefCell<Escc>>) -> Self {
        Self { escc }
    }
}

impl InputSink for SunKeyboard {
    fn handle_event(&mut self, event: &InputEvent) {
        if let InputEvent::Key { qcode, down } = *event {
            self.escc.borrow_mut().key_event(qcode, down);
        }
    }
}

/// Accumulates host pointer events and emits one packet per sync.
#[derive(Debug, Clone)]
pub struct SunMouse {
    escc: Rc<RefCell<Escc>>,
    dx: i32,
    dy: i32,
    dz: i32,
    buttons: MouseButtons,
    dirty: bool,
}

impl SunMouse {
    pub fn new(escc: Rc<RefCell<Escc>>) -> Self {
        Self {
            escc,
            dx: 0,
            dy: 0,
            dz: 0,
            buttons: MouseButtons::empty(),
            dirty: false,
        }
    }
}

impl InputSink for SunMouse {
    fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Rel {
                axis: InputAxis::X,
                value,
            } => self.dx = self.dx.saturating_add(value),
            InputEvent::Rel {
                axis: InputAxis::Y,
                value,
            } => self.dy = self.dy.saturating_add(value),
            InputEvent::Button { button, down } => {
                match (button, down) {
                    (MouseButton::WheelUp, true) => self.dz = self.dz.saturating_sub(1),
                    (MouseButton::WheelDown, true) => self.dz = self.dz.saturating_add(1),
                    _ => {}
                }
                self.buttons.set(button.mask(), down);
            }
            InputEvent::Key { .. } => return,
        }
        self.dirty = true;
    }

    fn sync(&mut self) {
        if !self.dirty {
            return;
        }
        self.escc
            .borrow_mut()
            .mouse_event(self.dx, self.dy, self.dz, self.buttons);
        self.dx = 0;
        self.dy = 0;
        self.dz = 0;
        self.dirty = false;
    }
}
