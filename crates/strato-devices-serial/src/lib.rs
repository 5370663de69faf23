//! Serial controllers: the dual-channel ESCC with its Sun keyboard/mouse modes.
#![forbid(unsafe_code)]

pub mod config;
pub mod escc;
pub mod transport;

pub use config::{ChannelRole, EsccConfig, EsccConfigError};
pub use escc::sun::{sun_keycode, SunKeyboard, SunMouse};
pub use escc::{derive_line_parameters, ChannelId, Escc, InterruptState};
pub use transport::{LineParameters, Parity, SerialTransport};
