//! PC keyboard scancode translation.
//!
//! Host keys are first turned into set-1 style "PC keycodes" (bit 7 = release, `0xE0` prefix for
//! grey keys). The keyboard device then optionally maps those onto raw set-2/set-3 codes using
//! [`SET2_RAW`] / [`SET3_RAW`].

use crate::keymap::QKeyCode;

/// Prefix for the extended ("grey") keys.
pub const SCANCODE_EMUL0: u8 = 0xE0;
/// Prefix used only by the Pause key.
pub const SCANCODE_EMUL1: u8 = 0xE1;
/// Release bit in a PC keycode.
pub const SCANCODE_UP: u8 = 0x80;

const GREY: u16 = 0x80;

/// PC keycode -> raw scancode set 2.
pub static SET2_RAW: [u8; 128] = [
    0, 118, 22, 30, 38, 37, 46, 54, 61, 62, 70, 69, 78, 85, 102, 13, //
    21, 29, 36, 45, 44, 53, 60, 67, 68, 77, 84, 91, 90, 20, 28, 27, //
    35, 43, 52, 51, 59, 66, 75, 76, 82, 14, 18, 93, 26, 34, 33, 42, //
    50, 49, 58, 65, 73, 74, 89, 124, 17, 41, 88, 5, 6, 4, 12, 3, //
    11, 2, 10, 1, 9, 119, 126, 108, 117, 125, 123, 107, 115, 116, 121, 105, //
    114, 122, 112, 113, 127, 96, 97, 120, 7, 15, 23, 31, 39, 47, 55, 63, //
    71, 79, 86, 94, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 87, 111, //
    19, 25, 57, 81, 83, 92, 95, 98, 99, 100, 101, 103, 104, 106, 109, 110,
];

/// PC keycode -> raw scancode set 3.
pub static SET3_RAW: [u8; 128] = [
    0, 8, 22, 30, 38, 37, 46, 54, 61, 62, 70, 69, 78, 85, 102, 13, //
    21, 29, 36, 45, 44, 53, 60, 67, 68, 77, 84, 91, 90, 17, 28, 27, //
    35, 43, 52, 51, 59, 66, 75, 76, 82, 14, 18, 92, 26, 34, 33, 42, //
    50, 49, 58, 65, 73, 74, 89, 126, 25, 41, 20, 7, 15, 23, 31, 39, //
    47, 2, 63, 71, 79, 118, 95, 108, 117, 125, 132, 107, 115, 116, 124, 105, //
    114, 122, 112, 113, 127, 96, 97, 86, 94, 15, 23, 31, 39, 47, 55, 63, //
    71, 79, 86, 94, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 87, 111, //
    19, 25, 57, 81, 83, 92, 95, 98, 99, 100, 101, 103, 104, 106, 109, 110,
];

/// PC keycode for `code`, with [`GREY`] marking keys that need the `0xE0` prefix.
/// Returns 0 for keys that have no PC equivalent.
fn pc_keycode(code: QKeyCode) -> u16 {
    use QKeyCode::*;

    match code {
        Shift => 0x2a,
        ShiftR => 0x36,
        Alt => 0x38,
        AltR => 0xb8,
        AltGr => 0x64,
        AltGrR => 0xe4,
        Ctrl => 0x1d,
        CtrlR => 0x9d,
        Menu | Compose => 0xdd,
        Esc => 0x01,
        Digit1 => 0x02,
        Digit2 => 0x03,
        Digit3 => 0x04,
        Digit4 => 0x05,
        Digit5 => 0x06,
        Digit6 => 0x07,
        Digit7 => 0x08,
        Digit8 => 0x09,
        Digit9 => 0x0a,
        Digit0 => 0x0b,
        Minus => 0x0c,
        Equal => 0x0d,
        Backspace => 0x0e,
        Tab => 0x0f,
        Q => 0x10,
        W => 0x11,
        E => 0x12,
        R => 0x13,
        T => 0x14,
        Y => 0x15,
        U => 0x16,
        I => 0x17,
        O => 0x18,
        P => 0x19,
        BracketLeft => 0x1a,
        BracketRight => 0x1b,
        Ret => 0x1c,
        A => 0x1e,
        S => 0x1f,
        D => 0x20,
        F => 0x21,
        G => 0x22,
        H => 0x23,
        J => 0x24,
        K => 0x25,
        L => 0x26,
        Semicolon => 0x27,
        Apostrophe => 0x28,
        GraveAccent => 0x29,
        Backslash => 0x2b,
        Z => 0x2c,
        X => 0x2d,
        C => 0x2e,
        V => 0x2f,
        B => 0x30,
        N => 0x31,
        M => 0x32,
        Comma => 0x33,
        Dot => 0x34,
        Slash => 0x35,
        Asterisk | KpMultiply => 0x37,
        Spc => 0x39,
        CapsLock => 0x3a,
        F1 => 0x3b,
        F2 => 0x3c,
        F3 => 0x3d,
        F4 => 0x3e,
        F5 => 0x3f,
        F6 => 0x40,
        F7 => 0x41,
        F8 => 0x42,
        F9 => 0x43,
        F10 => 0x44,
        NumLock => 0x45,
        ScrollLock => 0x46,
        KpDivide => 0xb5,
        KpSubtract => 0x4a,
        KpAdd => 0x4e,
        KpEnter => 0x9c,
        KpDecimal => 0x53,
        SysRq => 0x54,
        Kp0 => 0x52,
        Kp1 => 0x4f,
        Kp2 => 0x50,
        Kp3 => 0x51,
        Kp4 => 0x4b,
        Kp5 => 0x4c,
        Kp6 => 0x4d,
        Kp7 => 0x47,
        Kp8 => 0x48,
        Kp9 => 0x49,
        Less => 0x56,
        F11 => 0x57,
        F12 => 0x58,
        Print => 0xb7,
        Home => 0xc7,
        PgUp => 0xc9,
        PgDn => 0xd1,
        End => 0xcf,
        Left => 0xcb,
        Up => 0xc8,
        Down => 0xd0,
        Right => 0xcd,
        Insert => 0xd2,
        Delete => 0xd3,
        MetaL => 0xdb,
        MetaR => 0xdc,
        Stop | Again | Props | Undo | Front | Copy | Open | Paste | Find | Cut | Lf | Help
        | Pause => 0,
    }
}

/// Appends the PC keycode sequence for a key edge to `out`.
///
/// Keys without a PC keycode produce nothing.
pub fn push_pc_sequence(out: &mut Vec<u8>, code: QKeyCode, down: bool) {
    let up = if down { 0 } else { SCANCODE_UP };

    if code == QKeyCode::Pause {
        out.extend_from_slice(&[SCANCODE_EMUL1, 0x1d | up, 0x45 | up]);
        return;
    }

    let keycode = pc_keycode(code);
    if keycode == 0 {
        return;
    }
    if keycode & GREY != 0 {
        out.push(SCANCODE_EMUL0);
    }
    out.push((keycode & 0x7f) as u8 | up);
}

/// Convenience wrapper around [`push_pc_sequence`].
pub fn pc_sequence(code: QKeyCode, down: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(3);
    push_pc_sequence(&mut out, code, down);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_grey_keys() {
        assert_eq!(pc_sequence(QKeyCode::A, true), vec![0x1e]);
        assert_eq!(pc_sequence(QKeyCode::A, false), vec![0x9e]);
        assert_eq!(pc_sequence(QKeyCode::Right, true), vec![0xe0, 0x4d]);
        assert_eq!(pc_sequence(QKeyCode::CtrlR, false), vec![0xe0, 0x9d]);
    }

    #[test]
    fn pause_uses_emul1_prefix() {
        assert_eq!(pc_sequence(QKeyCode::Pause, true), vec![0xe1, 0x1d, 0x45]);
        assert_eq!(pc_sequence(QKeyCode::Pause, false), vec![0xe1, 0x9d, 0xc5]);
    }

    #[test]
    fn sun_only_keys_are_silent() {
        assert!(pc_sequence(QKeyCode::Stop, true).is_empty());
    }

    #[test]
    fn raw_tables_map_letter_a() {
        assert_eq!(SET2_RAW[0x1e], 0x1c);
        assert_eq!(SET3_RAW[0x1e], 0x1c);
    }
}
