//! Host input events and their delivery to emulated devices.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::keymap::QKeyCode;

bitflags! {
    /// Mouse button state as carried in PS/2 and Sun mouse packets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 0x01;
        const RIGHT = 0x02;
        const MIDDLE = 0x04;
        const SIDE = 0x08;
        const EXTRA = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    Side,
    Extra,
}

impl MouseButton {
    /// Bit in [`MouseButtons`] for this button. Wheel "buttons" have none.
    pub fn mask(self) -> MouseButtons {
        match self {
            MouseButton::Left => MouseButtons::LEFT,
            MouseButton::Middle => MouseButtons::MIDDLE,
            MouseButton::Right => MouseButtons::RIGHT,
            MouseButton::Side => MouseButtons::SIDE,
            MouseButton::Extra => MouseButtons::EXTRA,
            MouseButton::WheelUp | MouseButton::WheelDown => MouseButtons::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { qcode: QKeyCode, down: bool },
    /// Relative motion. Positive Y points down, as reported by host windowing systems.
    Rel { axis: InputAxis, value: i32 },
    Button { button: MouseButton, down: bool },
}

impl InputEvent {
    pub fn is_keyboard(&self) -> bool {
        matches!(self, InputEvent::Key { .. })
    }
}

/// Consumer of host input events.
///
/// Events arrive one at a time; `sync` marks the end of a batch that belongs together (for
/// example an X and a Y motion plus a button change) and is where pointer devices emit packets.
pub trait InputSink {
    fn handle_event(&mut self, event: &InputEvent);

    fn sync(&mut self) {}
}

pub type SharedInputSink = Rc<RefCell<dyn InputSink>>;

/// Fans host events out to the keyboards and pointers attached to a machine.
#[derive(Default)]
pub struct InputRouter {
    keyboards: Vec<SharedInputSink>,
    pointers: Vec<SharedInputSink>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyboard(&mut self, sink: SharedInputSink) {
        self.keyboards.push(sink);
    }

    pub fn add_pointer(&mut self, sink: SharedInputSink) {
        self.pointers.push(sink);
    }

    pub fn send(&self, event: &InputEvent) {
        let sinks = if event.is_keyboard() {
            &self.keyboards
        } else {
            &self.pointers
        };
        for sink in sinks {
            sink.borrow_mut().handle_event(event);
        }
    }

    pub fn send_key(&self, qcode: QKeyCode, down: bool) {
        self.send(&InputEvent::Key { qcode, down });
    }

    pub fn sync(&self) {
        for sink in self.keyboards.iter().chain(&self.pointers) {
            sink.borrow_mut().sync();
        }
    }
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("keyboards", &self.keyboards.len())
            .field("pointers", &self.pointers.len())
            .finish()
    }
}
