use crate::input::Key;

/// Keycode translation against the de-facto standard evdev layout. A
/// MappingNotify-driven refresh is unnecessary at this granularity; codes
/// outside the table resolve to `Key::Any`.
pub fn key_from_code(keycode: u8) -> Key {
    match keycode {
        9 => Key::Escape,
        10 => Key::One,
        11 => Key::Two,
        12 => Key::Three,
        13 => Key::Four,
        14 => Key::Five,
        15 => Key::Six,
        16 => Key::Seven,
        17 => Key::Eight,
        18 => Key::Nine,
        19 => Key::Zero,
        20 => Key::Minus,
        21 => Key::Equal,
        22 => Key::Backspace,
        23 => Key::Tab,
        24 => Key::Q,
        25 => Key::W,
        26 => Key::E,
        27 => Key::R,
        28 => Key::T,
        29 => Key::Y,
        30 => Key::U,
        31 => Key::I,
        32 => Key::O,
        33 => Key::P,
        34 => Key::LeftBracket,
        35 => Key::RightBracket,
        36 => Key::Return,
        37 => Key::LeftControl,
        38 => Key::A,
        39 => Key::S,
        40 => Key::D,
        41 => Key::F,
        42 => Key::G,
        43 => Key::H,
        44 => Key::J,
        45 => Key::K,
        46 => Key::L,
        47 => Key::SemiColon,
        48 => Key::Apostrophe,
        49 => Key::Grave,
        50 => Key::LeftShift,
        51 => Key::BackSlash,
        52 => Key::Z,
        53 => Key::X,
        54 => Key::C,
        55 => Key::V,
        56 => Key::B,
        57 => Key::N,
        58 => Key::M,
        59 => Key::Comma,
        60 => Key::Period,
        61 => Key::Slash,
        62 => Key::RightShift,
        63 => Key::Multiply,
        64 => Key::LeftAlt,
        65 => Key::Space,
        66 => Key::CapsLock,
        67 => Key::F1,
        68 => Key::F2,
        69 => Key::F3,
        70 => Key::F4,
        71 => Key::F5,
        72 => Key::F6,
        73 => Key::F7,
        74 => Key::F8,
        75 => Key::F9,
        76 => Key::F10,
        77 => Key::NumLock,
        78 => Key::ScrollLock,
        79 => Key::NumPad7,
        80 => Key::NumPad8,
        81 => Key::NumPad9,
        82 => Key::Subtract,
        83 => Key::NumPad4,
        84 => Key::NumPad5,
        85 => Key::NumPad6,
        86 => Key::Add,
        87 => Key::NumPad1,
        88 => Key::NumPad2,
        89 => Key::NumPad3,
        90 => Key::NumPad0,
        91 => Key::Decimal,
        95 => Key::F11,
        96 => Key::F12,
        104 => Key::NumPadEnter,
        105 => Key::RightControl,
        106 => Key::Divide,
        107 => Key::Print,
        108 => Key::RightAlt,
        110 => Key::Home,
        111 => Key::Up,
        112 => Key::PageUp,
        113 => Key::Left,
        114 => Key::Right,
        115 => Key::End,
        116 => Key::Down,
        117 => Key::PageDown,
        118 => Key::Insert,
        119 => Key::Delete,
        127 => Key::Pause,
        133 => Key::LeftSuper,
        134 => Key::RightSuper,
        135 => Key::Menu,
        _ => Key::Any,
    }
}

pub fn code_from_key(key: Key) -> u8 {
    match key {
        Key::Escape => 9,
        Key::One => 10,
        Key::Two => 11,
        Key::Three => 12,
        Key::Four => 13,
        Key::Five => 14,
        Key::Six => 15,
        Key::Seven => 16,
        Key::Eight => 17,
        Key::Nine => 18,
        Key::Zero => 19,
        Key::Minus => 20,
        Key::Equal => 21,
        Key::Backspace => 22,
        Key::Tab => 23,
        Key::Q => 24,
        Key::W => 25,
        Key::E => 26,
        Key::R => 27,
        Key::T => 28,
        Key::Y => 29,
        Key::U => 30,
        Key::I => 31,
        Key::O => 32,
        Key::P => 33,
        Key::LeftBracket => 34,
        Key::RightBracket => 35,
        Key::Return => 36,
        Key::Control | Key::LeftControl => 37,
        Key::A => 38,
        Key::S => 39,
        Key::D => 40,
        Key::F => 41,
        Key::G => 42,
        Key::H => 43,
        Key::J => 44,
        Key::K => 45,
        Key::L => 46,
        Key::SemiColon => 47,
        Key::Apostrophe => 48,
        Key::Grave => 49,
        Key::Shift | Key::LeftShift => 50,
        Key::BackSlash => 51,
        Key::Z => 52,
        Key::X => 53,
        Key::C => 54,
        Key::V => 55,
        Key::B => 56,
        Key::N => 57,
        Key::M => 58,
        Key::Comma => 59,
        Key::Period => 60,
        Key::Slash => 61,
        Key::RightShift => 62,
        Key::Multiply => 63,
        Key::Alt | Key::LeftAlt => 64,
        Key::Space => 65,
        Key::CapsLock => 66,
        Key::F1 => 67,
        Key::F2 => 68,
        Key::F3 => 69,
        Key::F4 => 70,
        Key::F5 => 71,
        Key::F6 => 72,
        Key::F7 => 73,
        Key::F8 => 74,
        Key::F9 => 75,
        Key::F10 => 76,
        Key::NumLock => 77,
        Key::ScrollLock => 78,
        Key::NumPad7 | Key::NumPadHome => 79,
        Key::NumPad8 | Key::NumPadUp => 80,
        Key::NumPad9 | Key::NumPadPageUp => 81,
        Key::Subtract => 82,
        Key::NumPad4 | Key::NumPadLeft => 83,
        Key::NumPad5 => 84,
        Key::NumPad6 | Key::NumPadRight => 85,
        Key::Add => 86,
        Key::NumPad1 | Key::NumPadEnd => 87,
        Key::NumPad2 | Key::NumPadDown => 88,
        Key::NumPad3 | Key::NumPadPageDown => 89,
        Key::NumPad0 | Key::NumPadInsert => 90,
        Key::Decimal | Key::NumPadDelete => 91,
        Key::F11 => 95,
        Key::F12 => 96,
        Key::NumPadEnter => 104,
        Key::RightControl => 105,
        Key::Divide => 106,
        Key::Print => 107,
        Key::RightAlt => 108,
        Key::Home => 110,
        Key::Up => 111,
        Key::PageUp => 112,
        Key::Left => 113,
        Key::Right => 114,
        Key::End => 115,
        Key::Down => 116,
        Key::PageDown => 117,
        Key::Insert => 118,
        Key::Delete => 119,
        Key::Pause => 127,
        Key::Super | Key::LeftSuper => 133,
        Key::RightSuper => 134,
        Key::Menu => 135,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_key_tables_agree() {
        for code in 9u8..=135 {
            let key = key_from_code(code);

            if key != Key::Any {
                assert_eq!(
                    key_from_code(code_from_key(key)),
                    key,
                    "keycode {} does not roundtrip",
                    code
                );
            }
        }
    }
}
