use bitflags::bitflags;

/// Key identifier as reported by the host window, in Qt key numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawKeyCode(pub u32);

impl RawKeyCode {
    pub const SPACE: Self = Self(0x20);
    pub const ESCAPE: Self = Self(0x0100_0000);
    pub const TAB: Self = Self(0x0100_0001);
    pub const BACKSPACE: Self = Self(0x0100_0003);
    pub const RETURN: Self = Self(0x0100_0004);
    pub const INSERT: Self = Self(0x0100_0006);
    pub const DELETE: Self = Self(0x0100_0007);
    pub const HOME: Self = Self(0x0100_0010);
    pub const END: Self = Self(0x0100_0011);
    pub const LEFT: Self = Self(0x0100_0012);
    pub const UP: Self = Self(0x0100_0013);
    pub const RIGHT: Self = Self(0x0100_0014);
    pub const DOWN: Self = Self(0x0100_0015);
    pub const PAGE_UP: Self = Self(0x0100_0016);
    pub const PAGE_DOWN: Self = Self(0x0100_0017);
    pub const SHIFT: Self = Self(0x0100_0020);
    pub const CONTROL: Self = Self(0x0100_0021);
    pub const META: Self = Self(0x0100_0022);
    pub const ALT: Self = Self(0x0100_0023);
    pub const F1: Self = Self(0x0100_0030);

    /// Function key `F{n}` for `n` in `1..=12`.
    pub const fn function(n: u32) -> Option<Self> {
        if n >= 1 && n <= 12 {
            Some(Self(Self::F1.0 + n - 1))
        } else {
            None
        }
    }

    /// Letters use their uppercase ASCII value, digits their ASCII value.
    pub const fn from_ascii(ch: char) -> Option<Self> {
        match ch {
            'a'..='z' => Some(Self(ch as u32 - 0x20)),
            'A'..='Z' | '0'..='9' | ' ' => Some(Self(ch as u32)),
            _ => None,
        }
    }
}

/// Exits full-screen presentation and releases canvas focus.
pub const ESCAPE_KEY: RawKeyCode = RawKeyCode::ESCAPE;
/// Flips between full-screen and windowed presentation (F10).
pub const TOGGLE_FULLSCREEN_KEY: RawKeyCode = RawKeyCode(0x0100_0039);

pub const DEFAULT_KEY_CODE_OFFSET: i32 = 32;

/// Key identifier as seen by the running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey(pub u32);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 0x0200_0000;
        const CONTROL = 0x0400_0000;
        const ALT = 0x0800_0000;
        const META = 0x1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: KeyEventKind,
    pub code: GameKey,
    pub modifiers: Modifiers,
}

impl InputEvent {
    pub fn key_down(code: GameKey, modifiers: Modifiers) -> Self {
        Self {
            kind: KeyEventKind::KeyDown,
            code,
            modifiers,
        }
    }
}

/// Translation from host key codes to game key codes.
///
/// Implementations must be total: every raw code maps to some game key, even
/// if nothing in the game ever asks for it.
pub trait KeyMap: Send + Sync {
    fn map(&self, raw: RawKeyCode) -> GameKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetKeyMap {
    offset: i32,
}

impl OffsetKeyMap {
    pub const fn new(offset: i32) -> Self {
        Self { offset }
    }
}

impl Default for OffsetKeyMap {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CODE_OFFSET)
    }
}

impl KeyMap for OffsetKeyMap {
    fn map(&self, raw: RawKeyCode) -> GameKey {
        GameKey(raw.0.wrapping_add_signed(self.offset))
    }
}
