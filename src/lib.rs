//! Emulated serial and input devices: a dual-channel ESCC with Sun keyboard/mouse modes and the
//! PS/2 keyboard and mouse, sharing one host input-event model.
//!
//! The device models live in the member crates; this crate re-exports them under one roof.

#![forbid(unsafe_code)]

pub use strato_devices_input as input;
pub use strato_devices_serial as serial;
pub use strato_io_snapshot as io_snapshot;
pub use strato_platform as platform;
