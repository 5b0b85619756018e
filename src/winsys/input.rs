pub use crate::Result;

use crate::geometry::Pos;
use crate::window::Timestamp;
use crate::window::Window;

use std::collections::HashSet;
use std::convert::TryFrom;
use std::hash::Hash;
use std::hash::Hasher;

use anyhow::anyhow;

#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, strum::EnumIter)]
pub enum Modifier {
    Ctrl = 1 << 0,
    Shift = 1 << 1,
    Alt = 1 << 2,
    Super = 1 << 3,
    NumLock = 1 << 4,
    CapsLock = 1 << 5,
    ScrollLock = 1 << 6,
}

impl Modifier {
    /// Lock modifiers are masked out of event state before binding lookup
    /// unless a binding names them explicitly.
    pub fn is_lock(&self) -> bool {
        matches!(
            self,
            Modifier::NumLock | Modifier::CapsLock | Modifier::ScrollLock
        )
    }
}

impl TryFrom<&str> for Modifier {
    type Error = anyhow::Error;

    fn try_from(val: &str) -> Result<Self> {
        match val {
            "C" => Ok(Self::Ctrl),
            "A" => Ok(Self::Alt),
            "S" => Ok(Self::Shift),
            "M" => Ok(Self::Super),
            "Num" => Ok(Self::NumLock),
            "Caps" => Ok(Self::CapsLock),
            "Scroll" => Ok(Self::ScrollLock),
            _ => Err(anyhow!("unable to resolve \"{}\" to modifier", val)),
        }
    }
}

pub fn normalize_modifiers(
    modifiers: &HashSet<Modifier>,
    named_locks: &HashSet<Modifier>,
) -> HashSet<Modifier> {
    modifiers
        .iter()
        .filter(|modifier| !modifier.is_lock() || named_locks.contains(modifier))
        .copied()
        .collect()
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Button {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
    Backward,
    Forward,
}

impl TryFrom<u8> for Button {
    type Error = anyhow::Error;

    fn try_from(val: u8) -> Result<Self> {
        match val {
            1 => Ok(Self::Left),
            2 => Ok(Self::Middle),
            3 => Ok(Self::Right),
            4 => Ok(Self::ScrollUp),
            5 => Ok(Self::ScrollDown),
            8 => Ok(Self::Backward),
            9 => Ok(Self::Forward),
            _ => Err(anyhow!("no matching button for value {}", val)),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    Release,
    Motion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseInput {
    pub button: Button,
    pub modifiers: HashSet<Modifier>,
}

impl Hash for MouseInput {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.button.hash(state);
        self.modifiers
            .iter()
            .fold(0u8, |acc, &modifier| acc | modifier as u8)
            .hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub input: MouseInput,
    pub window: Option<Window>,
    pub root_rpos: Pos,
    pub time: Timestamp,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Key {
    Any,
    Backspace,
    Tab,
    Return,
    Shift,
    Control,
    Alt,
    Super,
    CapsLock,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Insert,
    Delete,
    Grave,
    Minus,
    Equal,
    LeftBracket,
    RightBracket,
    BackSlash,
    SemiColon,
    Apostrophe,
    Comma,
    Period,
    Slash,
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    NumPad0,
    NumPad1,
    NumPad2,
    NumPad3,
    NumPad4,
    NumPad5,
    NumPad6,
    NumPad7,
    NumPad8,
    NumPad9,
    NumPadEnter,
    NumPadHome,
    NumPadEnd,
    NumPadLeft,
    NumPadUp,
    NumPadRight,
    NumPadDown,
    NumPadPageUp,
    NumPadPageDown,
    NumPadInsert,
    NumPadDelete,
    Multiply,
    Add,
    Subtract,
    Decimal,
    Divide,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    NumLock,
    ScrollLock,
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
    Print,
    Pause,
    Menu,
}

impl Key {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::Shift
                | Key::Control
                | Key::Alt
                | Key::Super
                | Key::LeftShift
                | Key::RightShift
                | Key::LeftControl
                | Key::RightControl
                | Key::LeftAlt
                | Key::RightAlt
                | Key::LeftSuper
                | Key::RightSuper
        )
    }

    pub fn modifier(&self) -> Option<Modifier> {
        match self {
            Key::Shift | Key::LeftShift | Key::RightShift => Some(Modifier::Shift),
            Key::Control | Key::LeftControl | Key::RightControl => Some(Modifier::Ctrl),
            Key::Alt | Key::LeftAlt | Key::RightAlt => Some(Modifier::Alt),
            Key::Super | Key::LeftSuper | Key::RightSuper => Some(Modifier::Super),
            _ => None,
        }
    }

    /// The non-keypad equivalent of a keypad symbol, for binding lookups
    /// that found no match on the raw symbol.
    pub fn keypad_alias(&self) -> Option<Key> {
        match self {
            Key::NumPad0 => Some(Key::Zero),
            Key::NumPad1 => Some(Key::One),
            Key::NumPad2 => Some(Key::Two),
            Key::NumPad3 => Some(Key::Three),
            Key::NumPad4 => Some(Key::Four),
            Key::NumPad5 => Some(Key::Five),
            Key::NumPad6 => Some(Key::Six),
            Key::NumPad7 => Some(Key::Seven),
            Key::NumPad8 => Some(Key::Eight),
            Key::NumPad9 => Some(Key::Nine),
            Key::NumPadEnter => Some(Key::Return),
            Key::NumPadHome => Some(Key::Home),
            Key::NumPadEnd => Some(Key::End),
            Key::NumPadLeft => Some(Key::Left),
            Key::NumPadUp => Some(Key::Up),
            Key::NumPadRight => Some(Key::Right),
            Key::NumPadDown => Some(Key::Down),
            Key::NumPadPageUp => Some(Key::PageUp),
            Key::NumPadPageDown => Some(Key::PageDown),
            Key::NumPadInsert => Some(Key::Insert),
            Key::NumPadDelete => Some(Key::Delete),
            Key::Multiply => Some(Key::Eight),
            Key::Add => Some(Key::Equal),
            Key::Subtract => Some(Key::Minus),
            Key::Decimal => Some(Key::Period),
            Key::Divide => Some(Key::Slash),
            _ => None,
        }
    }

    pub fn to_char(
        &self,
        shifted: bool,
    ) -> Option<char> {
        let pair = match self {
            Key::Space => (' ', ' '),
            Key::Grave => ('`', '~'),
            Key::Minus => ('-', '_'),
            Key::Equal => ('=', '+'),
            Key::LeftBracket => ('[', '{'),
            Key::RightBracket => (']', '}'),
            Key::BackSlash => ('\\', '|'),
            Key::SemiColon => (';', ':'),
            Key::Apostrophe => ('\'', '"'),
            Key::Comma => (',', '<'),
            Key::Period => ('.', '>'),
            Key::Slash => ('/', '?'),
            Key::Zero => ('0', ')'),
            Key::One => ('1', '!'),
            Key::Two => ('2', '@'),
            Key::Three => ('3', '#'),
            Key::Four => ('4', '$'),
            Key::Five => ('5', '%'),
            Key::Six => ('6', '^'),
            Key::Seven => ('7', '&'),
            Key::Eight => ('8', '*'),
            Key::Nine => ('9', '('),
            Key::A => ('a', 'A'),
            Key::B => ('b', 'B'),
            Key::C => ('c', 'C'),
            Key::D => ('d', 'D'),
            Key::E => ('e', 'E'),
            Key::F => ('f', 'F'),
            Key::G => ('g', 'G'),
            Key::H => ('h', 'H'),
            Key::I => ('i', 'I'),
            Key::J => ('j', 'J'),
            Key::K => ('k', 'K'),
            Key::L => ('l', 'L'),
            Key::M => ('m', 'M'),
            Key::N => ('n', 'N'),
            Key::O => ('o', 'O'),
            Key::P => ('p', 'P'),
            Key::Q => ('q', 'Q'),
            Key::R => ('r', 'R'),
            Key::S => ('s', 'S'),
            Key::T => ('t', 'T'),
            Key::U => ('u', 'U'),
            Key::V => ('v', 'V'),
            Key::W => ('w', 'W'),
            Key::X => ('x', 'X'),
            Key::Y => ('y', 'Y'),
            Key::Z => ('z', 'Z'),
            Key::NumPad0 => ('0', '0'),
            Key::NumPad1 => ('1', '1'),
            Key::NumPad2 => ('2', '2'),
            Key::NumPad3 => ('3', '3'),
            Key::NumPad4 => ('4', '4'),
            Key::NumPad5 => ('5', '5'),
            Key::NumPad6 => ('6', '6'),
            Key::NumPad7 => ('7', '7'),
            Key::NumPad8 => ('8', '8'),
            Key::NumPad9 => ('9', '9'),
            Key::Multiply => ('*', '*'),
            Key::Add => ('+', '+'),
            Key::Subtract => ('-', '-'),
            Key::Decimal => ('.', '.'),
            Key::Divide => ('/', '/'),
            _ => return None,
        };

        Some(if shifted {
            pair.1
        } else {
            pair.0
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: HashSet<Modifier>,
}

impl KeyInput {
    pub fn new(
        key: Key,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> Self {
        Self {
            key,
            modifiers: modifiers.into_iter().collect(),
        }
    }
}

impl Hash for KeyInput {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.key.hash(state);
        self.modifiers
            .iter()
            .fold(0u8, |acc, &modifier| acc | modifier as u8)
            .hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub input: KeyInput,
    pub window: Option<Window>,
    pub is_release: bool,
    pub time: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_modifiers_are_masked_unless_named() {
        let modifiers: HashSet<Modifier> = [Modifier::Super, Modifier::NumLock, Modifier::CapsLock]
            .iter()
            .copied()
            .collect();

        let normalized = normalize_modifiers(&modifiers, &HashSet::new());
        assert_eq!(normalized, [Modifier::Super].iter().copied().collect());

        let named: HashSet<Modifier> = [Modifier::NumLock].iter().copied().collect();
        let normalized = normalize_modifiers(&modifiers, &named);
        assert_eq!(
            normalized,
            [Modifier::Super, Modifier::NumLock].iter().copied().collect()
        );
    }

    #[test]
    fn keypad_digits_alias_to_digits() {
        assert_eq!(Key::NumPad7.keypad_alias(), Some(Key::Seven));
        assert_eq!(Key::NumPadLeft.keypad_alias(), Some(Key::Left));
        assert_eq!(Key::A.keypad_alias(), None);
    }

    #[test]
    fn key_input_hash_ignores_modifier_order() {
        use std::collections::hash_map::DefaultHasher;

        let a = KeyInput::new(Key::X, vec![Modifier::Ctrl, Modifier::Shift]);
        let b = KeyInput::new(Key::X, vec![Modifier::Shift, Modifier::Ctrl]);

        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);

        assert_eq!(a, b);
        assert_eq!(ha.finish(), hb.finish());
    }
}
