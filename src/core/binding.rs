use crate::model::Model;

use winsys::input::Key;
use winsys::input::KeyInput;
use winsys::input::Modifier;
use winsys::input::MouseInput;
use winsys::window::Window;

use std::collections::HashMap;
use std::convert::TryFrom;

pub type KeyAction = Box<dyn FnMut(&mut Model)>;
pub type MouseAction = Box<dyn FnMut(&mut Model, Option<Window>)>;

pub enum KeyBinding {
    Act(KeyAction),
    Chain(HashMap<KeyInput, KeyBinding>),
}

pub enum Resolution<'bindings> {
    NoMatch,
    Prefix,
    Action(&'bindings mut KeyAction),
}

pub struct KeyBindings {
    map: HashMap<KeyInput, KeyBinding>,
}

impl KeyBindings {
    pub fn new(map: HashMap<KeyInput, KeyBinding>) -> Self {
        Self {
            map,
        }
    }

    pub fn inputs(&self) -> Vec<&KeyInput> {
        self.map.keys().collect()
    }

    /// Resolve a key chord against the map reached by following `path`
    /// through nested prefix maps. Lock modifiers not named by a binding
    /// are masked out, and keypad symbols fall back to their non-keypad
    /// aliases when the raw symbol finds no binding.
    pub fn resolve(
        &mut self,
        path: &[KeyInput],
        input: &KeyInput,
    ) -> Resolution {
        let map = match Self::map_at(&mut self.map, path) {
            Some(map) => map,
            None => return Resolution::NoMatch,
        };

        let candidates = Self::lookup_candidates(input);

        for candidate in &candidates {
            if map.contains_key(candidate) {
                return match map.get_mut(candidate).unwrap() {
                    KeyBinding::Act(action) => Resolution::Action(action),
                    KeyBinding::Chain(_) => Resolution::Prefix,
                };
            }
        }

        Resolution::NoMatch
    }

    fn map_at<'map>(
        mut map: &'map mut HashMap<KeyInput, KeyBinding>,
        path: &[KeyInput],
    ) -> Option<&'map mut HashMap<KeyInput, KeyBinding>> {
        for input in path {
            let candidates = Self::lookup_candidates(input);

            let key = candidates
                .into_iter()
                .find(|candidate| matches!(map.get(candidate), Some(KeyBinding::Chain(_))))?;

            match map.get_mut(&key) {
                Some(KeyBinding::Chain(chain)) => map = chain,
                _ => return None,
            }
        }

        Some(map)
    }

    fn lookup_candidates(input: &KeyInput) -> Vec<KeyInput> {
        let stripped = KeyInput {
            key: input.key,
            modifiers: input
                .modifiers
                .iter()
                .filter(|modifier| !modifier.is_lock())
                .copied()
                .collect(),
        };

        let mut candidates = vec![input.clone()];

        if stripped != *input {
            candidates.push(stripped.clone());
        }

        if let Some(alias) = input.key.keypad_alias() {
            candidates.push(KeyInput {
                key: alias,
                modifiers: input.modifiers.clone(),
            });
            candidates.push(KeyInput {
                key: alias,
                modifiers: stripped.modifiers,
            });
        }

        candidates.dedup();
        candidates
    }
}

pub struct MouseBindings {
    map: HashMap<MouseInput, MouseAction>,
}

impl MouseBindings {
    pub fn new(map: HashMap<MouseInput, MouseAction>) -> Self {
        Self {
            map,
        }
    }

    pub fn inputs(&self) -> Vec<&MouseInput> {
        self.map.keys().collect()
    }

    pub fn resolve(
        &mut self,
        input: &MouseInput,
    ) -> Option<&mut MouseAction> {
        let stripped = MouseInput {
            button: input.button,
            modifiers: input
                .modifiers
                .iter()
                .filter(|modifier| !modifier.is_lock())
                .copied()
                .collect(),
        };

        if self.map.contains_key(input) {
            self.map.get_mut(input)
        } else {
            self.map.get_mut(&stripped)
        }
    }
}

pub fn parse_key(name: &str) -> Option<Key> {
    Some(match name {
        "a" => Key::A,
        "b" => Key::B,
        "c" => Key::C,
        "d" => Key::D,
        "e" => Key::E,
        "f" => Key::F,
        "g" => Key::G,
        "h" => Key::H,
        "i" => Key::I,
        "j" => Key::J,
        "k" => Key::K,
        "l" => Key::L,
        "m" => Key::M,
        "n" => Key::N,
        "o" => Key::O,
        "p" => Key::P,
        "q" => Key::Q,
        "r" => Key::R,
        "s" => Key::S,
        "t" => Key::T,
        "u" => Key::U,
        "v" => Key::V,
        "w" => Key::W,
        "x" => Key::X,
        "y" => Key::Y,
        "z" => Key::Z,
        "0" => Key::Zero,
        "1" => Key::One,
        "2" => Key::Two,
        "3" => Key::Three,
        "4" => Key::Four,
        "5" => Key::Five,
        "6" => Key::Six,
        "7" => Key::Seven,
        "8" => Key::Eight,
        "9" => Key::Nine,
        "Return" => Key::Return,
        "space" => Key::Space,
        "Tab" => Key::Tab,
        "Escape" => Key::Escape,
        "BackSpace" => Key::Backspace,
        "Delete" => Key::Delete,
        "Insert" => Key::Insert,
        "Home" => Key::Home,
        "End" => Key::End,
        "Prior" => Key::PageUp,
        "Next" => Key::PageDown,
        "Left" => Key::Left,
        "Right" => Key::Right,
        "Up" => Key::Up,
        "Down" => Key::Down,
        "minus" => Key::Minus,
        "equal" => Key::Equal,
        "grave" => Key::Grave,
        "backslash" => Key::BackSlash,
        "bracketleft" => Key::LeftBracket,
        "bracketright" => Key::RightBracket,
        "semicolon" => Key::SemiColon,
        "apostrophe" => Key::Apostrophe,
        "comma" => Key::Comma,
        "period" => Key::Period,
        "slash" => Key::Slash,
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        _ => return None,
    })
}

/// Parse a "[modifier-]*key" chord designator, e.g. "M-S-q" or
/// "C-A-equal".
pub fn parse_key_input(binding: impl Into<String>) -> Option<KeyInput> {
    let binding = binding.into();
    let mut parts: Vec<&str> = binding.split('-').collect();
    let key = parse_key(parts.pop()?)?;

    let modifiers = parts
        .iter()
        .map(|&part| Modifier::try_from(part))
        .collect::<Result<_, _>>()
        .ok()?;

    Some(KeyInput {
        key,
        modifiers,
    })
}

pub fn parse_mouse_input(binding: impl Into<String>) -> Option<MouseInput> {
    use winsys::input::Button;

    let binding = binding.into();
    let mut parts: Vec<&str> = binding.split('-').collect();

    let button = match parts.pop()? {
        "Left" => Button::Left,
        "Middle" => Button::Middle,
        "Right" => Button::Right,
        "ScrollUp" => Button::ScrollUp,
        "ScrollDown" => Button::ScrollDown,
        "Backward" => Button::Backward,
        "Forward" => Button::Forward,
        _ => return None,
    };

    let modifiers = parts
        .iter()
        .map(|&part| Modifier::try_from(part))
        .collect::<Result<_, _>>()
        .ok()?;

    Some(MouseInput {
        button,
        modifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> KeyBinding {
        KeyBinding::Act(Box::new(|_: &mut Model| {}))
    }

    fn bindings() -> KeyBindings {
        let mut prefix = HashMap::new();
        prefix.insert(parse_key_input("t").unwrap(), noop());

        let mut map = HashMap::new();
        map.insert(parse_key_input("M-q").unwrap(), noop());
        map.insert(parse_key_input("M-Left").unwrap(), noop());
        map.insert(parse_key_input("M-w").unwrap(), KeyBinding::Chain(prefix));

        KeyBindings::new(map)
    }

    #[test]
    fn plain_chord_resolves_to_action() {
        let mut bindings = bindings();
        let input = parse_key_input("M-q").unwrap();

        assert!(matches!(
            bindings.resolve(&[], &input),
            Resolution::Action(_)
        ));
    }

    #[test]
    fn lock_modifiers_do_not_defeat_lookup() {
        let mut bindings = bindings();
        let mut input = parse_key_input("M-q").unwrap();
        input.modifiers.insert(Modifier::NumLock);
        input.modifiers.insert(Modifier::CapsLock);

        assert!(matches!(
            bindings.resolve(&[], &input),
            Resolution::Action(_)
        ));
    }

    #[test]
    fn keypad_symbol_falls_back_to_alias() {
        let mut bindings = bindings();
        let input = KeyInput::new(Key::NumPadLeft, vec![Modifier::Super]);

        assert!(matches!(
            bindings.resolve(&[], &input),
            Resolution::Action(_)
        ));
    }

    #[test]
    fn prefix_then_terminal_resolves_through_path() {
        let mut bindings = bindings();
        let prefix = parse_key_input("M-w").unwrap();
        let terminal = parse_key_input("t").unwrap();

        assert!(matches!(bindings.resolve(&[], &prefix), Resolution::Prefix));
        assert!(matches!(
            bindings.resolve(&[prefix.clone()], &terminal),
            Resolution::Action(_)
        ));
        assert!(matches!(
            bindings.resolve(&[prefix], &parse_key_input("z").unwrap()),
            Resolution::NoMatch
        ));
    }

    #[test]
    fn unbound_chord_is_no_match() {
        let mut bindings = bindings();
        let input = parse_key_input("C-z").unwrap();

        assert!(matches!(bindings.resolve(&[], &input), Resolution::NoMatch));
    }
}
