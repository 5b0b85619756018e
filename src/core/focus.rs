use crate::cycle::Cycle;
use crate::cycle::Selector;
use crate::identify::Ident;

use winsys::window::Window;

/// What to do with a button press intercepted on an unfocused frame's
/// sync grab.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClickAction {
    FocusAndReplay,
    FocusAndSwallow,
    Ignore,
}

/// A focus policy decides when focus moves; the manager carries out the
/// decisions. Implementations are injected at construction and hold no
/// connection state of their own.
pub trait FocusPolicy {
    fn name(&self) -> &'static str;

    /// EnterNotify on a managed frame. `normal` and `inferior` are the
    /// crossing's mode and detail.
    fn focus_on_enter(
        &self,
        normal: bool,
        inferior: bool,
    ) -> bool {
        let _ = (normal, inferior);
        false
    }

    /// A client finished mapping. `accepts_focus` reflects its
    /// WM_HINTS.input and WM_TAKE_FOCUS advertisement.
    fn focus_on_map(
        &self,
        accepts_focus: bool,
    ) -> bool {
        let _ = accepts_focus;
        false
    }

    /// Whether unfocused frames hold a synchronous button grab for
    /// focus clicks.
    fn grabs_focus_clicks(&self) -> bool {
        false
    }

    fn on_focus_click(&self) -> ClickAction {
        ClickAction::Ignore
    }
}

/// Focus follows the pointer into client frames; entering the root does
/// not steal focus from the last focused client.
pub struct SloppyFocus;

impl FocusPolicy for SloppyFocus {
    fn name(&self) -> &'static str {
        "sloppy"
    }

    fn focus_on_enter(
        &self,
        normal: bool,
        inferior: bool,
    ) -> bool {
        normal && !inferior
    }
}

/// Focus changes only on a button press inside a client frame. The press
/// is intercepted with a synchronous grab and replayed to the client
/// once focus has moved.
pub struct ClickToFocus {
    pub ignore_focus_click: bool,
}

impl FocusPolicy for ClickToFocus {
    fn name(&self) -> &'static str {
        "click-to-focus"
    }

    fn grabs_focus_clicks(&self) -> bool {
        true
    }

    fn on_focus_click(&self) -> ClickAction {
        if self.ignore_focus_click {
            ClickAction::FocusAndSwallow
        } else {
            ClickAction::FocusAndReplay
        }
    }
}

/// Decorator granting newly mapped windows the focus, provided they
/// accept it. Wraps any base policy.
pub struct FocusNewWindows {
    pub inner: Box<dyn FocusPolicy>,
}

impl FocusPolicy for FocusNewWindows {
    fn name(&self) -> &'static str {
        "focus-new"
    }

    fn focus_on_enter(
        &self,
        normal: bool,
        inferior: bool,
    ) -> bool {
        self.inner.focus_on_enter(normal, inferior)
    }

    fn focus_on_map(
        &self,
        accepts_focus: bool,
    ) -> bool {
        accepts_focus
    }

    fn grabs_focus_clicks(&self) -> bool {
        self.inner.grabs_focus_clicks()
    }

    fn on_focus_click(&self) -> ClickAction {
        self.inner.on_focus_click()
    }
}

/// Most-recently-focused-first ordering over managed clients. Every
/// mapped managed client appears exactly once.
pub struct FocusList {
    order: Cycle<Window>,
}

impl FocusList {
    pub fn new() -> Self {
        Self {
            order: Cycle::new(Vec::new(), true),
        }
    }

    pub fn note(
        &mut self,
        window: Window,
    ) {
        if !self.order.contains_id(window as Ident) {
            self.order.push_back(window);
        }
    }

    pub fn promote(
        &self,
        window: Window,
    ) {
        self.order.activate_for(&Selector::AtIdent(window as Ident));
    }

    pub fn remove(
        &mut self,
        window: Window,
    ) {
        self.order.remove_for(&Selector::AtIdent(window as Ident));
    }

    pub fn contains(
        &self,
        window: Window,
    ) -> bool {
        self.order.contains_id(window as Ident)
    }

    pub fn head(&self) -> Option<Window> {
        self.order.active_element().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All tracked windows, most recently focused first.
    pub fn mru(&self) -> Vec<Window> {
        let mut order: Vec<Window> = self
            .order
            .stack_after_focus()
            .into_iter()
            .rev()
            .map(|id| id as Window)
            .collect();

        for window in self.order.iter() {
            if !order.contains(window) {
                order.push(*window);
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sloppy_focus_ignores_inferior_and_grab_crossings() {
        let policy = SloppyFocus;

        assert!(policy.focus_on_enter(true, false));
        assert!(!policy.focus_on_enter(true, true));
        assert!(!policy.focus_on_enter(false, false));
        assert!(!policy.focus_on_map(true));
    }

    #[test]
    fn click_to_focus_grabs_and_replays() {
        let policy = ClickToFocus {
            ignore_focus_click: false,
        };

        assert!(policy.grabs_focus_clicks());
        assert!(!policy.focus_on_enter(true, false));
        assert_eq!(policy.on_focus_click(), ClickAction::FocusAndReplay);

        let swallowing = ClickToFocus {
            ignore_focus_click: true,
        };
        assert_eq!(swallowing.on_focus_click(), ClickAction::FocusAndSwallow);
    }

    #[test]
    fn focus_new_decorator_defers_to_inner_policy() {
        let policy = FocusNewWindows {
            inner: Box::new(SloppyFocus),
        };

        assert!(policy.focus_on_enter(true, false));
        assert!(policy.focus_on_map(true));
        assert!(!policy.focus_on_map(false));
        assert!(!policy.grabs_focus_clicks());
    }

    #[test]
    fn focus_list_keeps_each_window_once() {
        let mut focus_list = FocusList::new();

        focus_list.note(10);
        focus_list.note(20);
        focus_list.note(10);

        assert_eq!(focus_list.len(), 2);
    }

    #[test]
    fn promotion_moves_window_to_head() {
        let mut focus_list = FocusList::new();

        focus_list.note(10);
        focus_list.note(20);
        focus_list.note(30);

        focus_list.promote(10);
        assert_eq!(focus_list.head(), Some(10));
        assert_eq!(focus_list.mru()[0], 10);

        focus_list.promote(20);
        assert_eq!(focus_list.mru(), vec![20, 10, 30]);
    }

    #[test]
    fn removal_unwinds_to_previous_focus() {
        let mut focus_list = FocusList::new();

        focus_list.note(10);
        focus_list.note(20);
        focus_list.note(30);

        focus_list.promote(10);
        focus_list.promote(30);
        focus_list.remove(30);

        assert_eq!(focus_list.head(), Some(10));
        assert!(!focus_list.contains(30));
    }
}
