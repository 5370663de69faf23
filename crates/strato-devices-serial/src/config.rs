use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported register stride shift.
pub const MAX_IT_SHIFT: u32 = 16;

/// Default Sun layout id reported by the keyboard (US English).
pub const SUN_LAYOUT_US: u8 = 0x21;

/// What a channel is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Plain UART connected to a [`crate::SerialTransport`].
    #[default]
    Serial,
    /// Sun type-4 keyboard.
    Keyboard,
    /// Sun (Mouse Systems) mouse.
    Mouse,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EsccConfigError {
    #[error("ESCC input clock frequency must be non-zero")]
    ZeroFrequency,

    #[error("ESCC it_shift {it_shift} exceeds the maximum of {max}")]
    ItShiftTooLarge { it_shift: u32, max: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsccConfig {
    /// Input clock in Hz. Each channel's baud rate generator runs at half of it.
    pub frequency: u32,
    /// Registers are `1 << it_shift` bytes apart.
    pub it_shift: u32,
    /// Marks both channels administratively disabled (modem lines report as asserted and the
    /// keyboard ignores commands).
    pub disabled: bool,
    pub chn_a: ChannelRole,
    pub chn_b: ChannelRole,
    pub keyboard_layout: u8,
}

impl Default for EsccConfig {
    fn default() -> Self {
        Self::serial(4_915_200, 1)
    }
}

impl EsccConfig {
    /// Two plain UARTs.
    pub fn serial(frequency: u32, it_shift: u32) -> Self {
        Self {
            frequency,
            it_shift,
            disabled: false,
            chn_a: ChannelRole::Serial,
            chn_b: ChannelRole::Serial,
            keyboard_layout: SUN_LAYOUT_US,
        }
    }

    /// Sun workstation wiring: keyboard on channel A, mouse on channel B.
    pub fn sun_keyboard_mouse(frequency: u32, it_shift: u32, disabled: bool) -> Self {
        Self {
            frequency,
            it_shift,
            disabled,
            chn_a: ChannelRole::Keyboard,
            chn_b: ChannelRole::Mouse,
            keyboard_layout: SUN_LAYOUT_US,
        }
    }

    pub fn validate(&self) -> Result<(), EsccConfigError> {
        if self.frequency == 0 {
            return Err(EsccConfigError::ZeroFrequency);
        }
        if self.it_shift > MAX_IT_SHIFT {
            return Err(EsccConfigError::ItShiftTooLarge {
                it_shift: self.it_shift,
                max: MAX_IT_SHIFT,
            });
        }
        Ok(())
    }

    /// Size of the MMIO window in bytes.
    pub fn window_size(&self) -> u64 {
        4u64 << self.it_shift
    }
}
