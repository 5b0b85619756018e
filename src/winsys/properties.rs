use crate::hints::SizeHints;
use crate::window::Atom;
use crate::window::IcccmWindowState;
use crate::window::Window;

/// The typed shape of an X property the manager reads or writes. Each
/// variant pairs with exactly one wire encoding; the backend owns the
/// encode/decode against the server.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    AtomList(Vec<Atom>),
    IntList(Vec<u32>),
    SizeHints(SizeHints),
    WmState(WmState),
    Command(Vec<String>),
}

/// WM_STATE per ICCCM §4.1.3.1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WmState {
    pub state: IcccmWindowState,
    pub icon: Window,
}

impl WmState {
    pub fn new(state: IcccmWindowState) -> Self {
        Self {
            state,
            icon: 0,
        }
    }
}

impl IcccmWindowState {
    pub fn to_card(self) -> u32 {
        match self {
            IcccmWindowState::Withdrawn => 0,
            IcccmWindowState::Normal => 1,
            IcccmWindowState::Iconic => 3,
        }
    }

    pub fn from_card(card: u32) -> Option<Self> {
        match card {
            0 => Some(IcccmWindowState::Withdrawn),
            1 => Some(IcccmWindowState::Normal),
            3 => Some(IcccmWindowState::Iconic),
            _ => None,
        }
    }
}

/// NUL-separated string list encoding shared by WM_COMMAND and WM_CLASS.
pub fn encode_string_list(strings: &[String]) -> Vec<u8> {
    let mut data = Vec::with_capacity(strings.iter().map(|s| s.len() + 1).sum());

    for string in strings {
        data.extend_from_slice(string.as_bytes());
        data.push(0);
    }

    data
}

pub fn decode_string_list(data: &[u8]) -> Vec<String> {
    data.split(|&byte| byte == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_roundtrip() {
        let argv = vec!["dim".to_owned(), "--tagset".to_owned(), "work | mail".to_owned()];

        assert_eq!(decode_string_list(&encode_string_list(&argv)), argv);
    }

    #[test]
    fn string_list_decoding_skips_empty_runs() {
        assert_eq!(
            decode_string_list(b"a\0\0b\0"),
            vec!["a".to_owned(), "b".to_owned()]
        );
    }

    #[test]
    fn wm_state_cards_match_icccm() {
        assert_eq!(IcccmWindowState::Withdrawn.to_card(), 0);
        assert_eq!(IcccmWindowState::Normal.to_card(), 1);
        assert_eq!(IcccmWindowState::Iconic.to_card(), 3);
        assert_eq!(IcccmWindowState::from_card(2), None);
        assert_eq!(
            IcccmWindowState::from_card(1),
            Some(IcccmWindowState::Normal)
        );
    }
}
