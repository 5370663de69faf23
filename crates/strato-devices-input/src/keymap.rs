//! Layout-independent host key identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown qcode name {0:?}")]
pub struct UnknownQKeyCode(pub String);

macro_rules! qkeycodes {
    ($($variant:ident => $name:literal,)*) => {
        /// Host key identifier, named after the physical key rather than the symbol it produces.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum QKeyCode {
            $($variant,)*
        }

        impl QKeyCode {
            pub const ALL: &'static [QKeyCode] = &[$(QKeyCode::$variant,)*];

            /// Lowercase qcode name, e.g. `"caps_lock"`.
            pub fn name(self) -> &'static str {
                match self {
                    $(QKeyCode::$variant => $name,)*
                }
            }
        }
    };
}

qkeycodes! {
    Shift => "shift",
    ShiftR => "shift_r",
    Alt => "alt",
    AltR => "alt_r",
    AltGr => "altgr",
    AltGrR => "altgr_r",
    Ctrl => "ctrl",
    CtrlR => "ctrl_r",
    Menu => "menu",
    Esc => "esc",
    Digit1 => "1",
    Digit2 => "2",
    Digit3 => "3",
    Digit4 => "4",
    Digit5 => "5",
    Digit6 => "6",
    Digit7 => "7",
    Digit8 => "8",
    Digit9 => "9",
    Digit0 => "0",
    Minus => "minus",
    Equal => "equal",
    Backspace => "backspace",
    Tab => "tab",
    Q => "q",
    W => "w",
    E => "e",
    R => "r",
    T => "t",
    Y => "y",
    U => "u",
    I => "i",
    O => "o",
    P => "p",
    BracketLeft => "bracket_left",
    BracketRight => "bracket_right",
    Ret => "ret",
    A => "a",
    S => "s",
    D => "d",
    F => "f",
    G => "g",
    H => "h",
    J => "j",
    K => "k",
    L => "l",
    Semicolon => "semicolon",
    Apostrophe => "apostrophe",
    GraveAccent => "grave_accent",
    Backslash => "backslash",
    Z => "z",
    X => "x",
    C => "c",
    V => "v",
    B => "b",
    N => "n",
    M => "m",
    Comma => "comma",
    Dot => "dot",
    Slash => "slash",
    Asterisk => "asterisk",
    Spc => "spc",
    CapsLock => "caps_lock",
    F1 => "f1",
    F2 => "f2",
    F3 => "f3",
    F4 => "f4",
    F5 => "f5",
    F6 => "f6",
    F7 => "f7",
    F8 => "f8",
    F9 => "f9",
    F10 => "f10",
    NumLock => "num_lock",
    ScrollLock => "scroll_lock",
    KpDivide => "kp_divide",
    KpMultiply => "kp_multiply",
    KpSubtract => "kp_subtract",
    KpAdd => "kp_add",
    KpEnter => "kp_enter",
    KpDecimal => "kp_decimal",
    SysRq => "sysrq",
    Kp0 => "kp_0",
    Kp1 => "kp_1",
    Kp2 => "kp_2",
    Kp3 => "kp_3",
    Kp4 => "kp_4",
    Kp5 => "kp_5",
    Kp6 => "kp_6",
    Kp7 => "kp_7",
    Kp8 => "kp_8",
    Kp9 => "kp_9",
    Less => "less",
    F11 => "f11",
    F12 => "f12",
    Print => "print",
    Home => "home",
    PgUp => "pgup",
    PgDn => "pgdn",
    End => "end",
    Left => "left",
    Up => "up",
    Down => "down",
    Right => "right",
    Insert => "insert",
    Delete => "delete",
    Stop => "stop",
    Again => "again",
    Props => "props",
    Undo => "undo",
    Front => "front",
    Copy => "copy",
    Open => "open",
    Paste => "paste",
    Find => "find",
    Cut => "cut",
    Lf => "lf",
    Help => "help",
    MetaL => "meta_l",
    MetaR => "meta_r",
    Compose => "compose",
    Pause => "pause",
}

impl fmt::Display for QKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QKeyCode {
    type Err = UnknownQKeyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QKeyCode::ALL
            .iter()
            .copied()
            .find(|code| code.name() == s)
            .ok_or_else(|| UnknownQKeyCode(s.to_string()))
    }
}
