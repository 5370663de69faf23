//! PS/2 keyboard and mouse models plus the host input plumbing shared with other input devices.

#![forbid(unsafe_code)]

pub mod byte_queue;
pub mod input;
pub mod keymap;
pub mod ps2_keyboard;
pub mod ps2_mouse;
pub mod scancode;

pub use byte_queue::ByteQueue;
pub use input::{
    InputAxis, InputEvent, InputRouter, InputSink, MouseButton, MouseButtons, SharedInputSink,
};
pub use keymap::{QKeyCode, UnknownQKeyCode};
pub use ps2_keyboard::Ps2Keyboard;
pub use ps2_mouse::{MouseProtocol, MouseStatus, Ps2Mouse};
