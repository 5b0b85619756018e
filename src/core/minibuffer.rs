use winsys::input::Key;
use winsys::input::KeyInput;
use winsys::input::Modifier;
use winsys::window::Window;

/// Gap-free line editing buffer shared by the minibuffer and the inline
/// titlebar input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringBuffer {
    content: Vec<char>,
    cursor: usize,
}

impl StringBuffer {
    pub fn new(initial: impl Into<String>) -> Self {
        let content: Vec<char> = initial.into().chars().collect();

        Self {
            cursor: content.len(),
            content,
        }
    }

    pub fn as_string(&self) -> String {
        self.content.iter().collect()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn insert(
        &mut self,
        c: char,
    ) {
        self.content.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn insert_str(
        &mut self,
        s: &str,
    ) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = std::cmp::min(self.cursor + 1, self.content.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.content.len();
    }

    pub fn delete_backward(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.content.remove(self.cursor);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn delete_word_backward(&mut self) {
        while self.cursor > 0 && self.content[self.cursor - 1].is_whitespace() {
            self.delete_backward();
        }

        while self.cursor > 0 && !self.content[self.cursor - 1].is_whitespace() {
            self.delete_backward();
        }
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn set(
        &mut self,
        s: &str,
    ) {
        self.content = s.chars().collect();
        self.cursor = self.content.len();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Insert(char),
    Left,
    Right,
    Home,
    End,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    Yank,
    Commit,
    Rollback,
    Noop,
}

/// Map a key chord to an editing operation, emacs-flavored.
pub fn edit_op(input: &KeyInput) -> EditOp {
    let ctrl = input.modifiers.contains(&Modifier::Ctrl);
    let alt = input.modifiers.contains(&Modifier::Alt);
    let shift = input.modifiers.contains(&Modifier::Shift);

    if ctrl {
        return match input.key {
            Key::A => EditOp::Home,
            Key::E => EditOp::End,
            Key::B => EditOp::Left,
            Key::F => EditOp::Right,
            Key::D => EditOp::DeleteForward,
            Key::W => EditOp::DeleteWordBackward,
            Key::Y => EditOp::Yank,
            Key::G => EditOp::Rollback,
            Key::M => EditOp::Commit,
            _ => EditOp::Noop,
        };
    }

    if alt {
        return match input.key {
            Key::Backspace => EditOp::DeleteWordBackward,
            _ => EditOp::Noop,
        };
    }

    match input.key {
        Key::Return | Key::NumPadEnter => EditOp::Commit,
        Key::Escape => EditOp::Rollback,
        Key::Left => EditOp::Left,
        Key::Right => EditOp::Right,
        Key::Home => EditOp::Home,
        Key::End => EditOp::End,
        Key::Backspace => EditOp::DeleteBackward,
        Key::Delete => EditOp::DeleteForward,
        key => match key.to_char(shift) {
            Some(c) => EditOp::Insert(c),
            None => EditOp::Noop,
        },
    }
}

/// What to do with the entered text once the field commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    TagsetSpec,
    SpawnCommand,
    ClientTags(Window),
    WindowState(Window),
}

/// Where the input field renders: its own strip along the bottom screen
/// edge, or inline in a client's titlebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Popup(Window),
    Titlebar(Window),
}

/// One-shot modal text entry. Lives on the manager's modal stack; only
/// one may be mapped at a time.
#[derive(Debug)]
pub struct Minibuffer {
    pub target: InputTarget,
    pub purpose: Purpose,
    pub prompt: String,
    pub buffer: StringBuffer,
}

impl Minibuffer {
    pub fn new(
        target: InputTarget,
        purpose: Purpose,
        prompt: impl Into<String>,
        initial: impl Into<String>,
    ) -> Self {
        Self {
            target,
            purpose,
            prompt: prompt.into(),
            buffer: StringBuffer::new(initial),
        }
    }

    pub fn window(&self) -> Window {
        match self.target {
            InputTarget::Popup(window) => window,
            InputTarget::Titlebar(frame) => frame,
        }
    }

    /// Apply a buffer-local operation. Commit, Rollback and Yank are the
    /// caller's to handle; everything else is absorbed here.
    pub fn apply(
        &mut self,
        op: EditOp,
    ) {
        match op {
            EditOp::Insert(c) => self.buffer.insert(c),
            EditOp::Left => self.buffer.left(),
            EditOp::Right => self.buffer.right(),
            EditOp::Home => self.buffer.home(),
            EditOp::End => self.buffer.end(),
            EditOp::DeleteBackward => self.buffer.delete_backward(),
            EditOp::DeleteForward => self.buffer.delete_forward(),
            EditOp::DeleteWordBackward => self.buffer.delete_word_backward(),
            EditOp::Yank | EditOp::Commit | EditOp::Rollback | EditOp::Noop => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_at_cursor() {
        let mut buffer = StringBuffer::new("wrk");

        buffer.left();
        buffer.left();
        buffer.insert('o');

        assert_eq!(buffer.as_string(), "work");
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn deletion_at_boundaries_is_safe() {
        let mut buffer = StringBuffer::new("a");

        buffer.delete_forward();
        buffer.delete_backward();
        buffer.delete_backward();

        assert_eq!(buffer.as_string(), "");
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn word_deletion_eats_trailing_whitespace_first() {
        let mut buffer = StringBuffer::new("work \\ docs  ");

        buffer.delete_word_backward();
        assert_eq!(buffer.as_string(), "work \\ ");

        buffer.delete_word_backward();
        assert_eq!(buffer.as_string(), "work ");

        buffer.delete_word_backward();
        assert_eq!(buffer.as_string(), "");
    }

    #[test]
    fn home_end_and_motion_clamp() {
        let mut buffer = StringBuffer::new("tags");

        buffer.home();
        buffer.left();
        assert_eq!(buffer.cursor(), 0);

        buffer.end();
        buffer.right();
        assert_eq!(buffer.cursor(), 4);
    }

    #[test]
    fn chords_map_to_edit_ops() {
        assert_eq!(
            edit_op(&KeyInput::new(Key::A, vec![Modifier::Ctrl])),
            EditOp::Home
        );
        assert_eq!(
            edit_op(&KeyInput::new(Key::W, vec![Modifier::Ctrl])),
            EditOp::DeleteWordBackward
        );
        assert_eq!(edit_op(&KeyInput::new(Key::Return, vec![])), EditOp::Commit);
        assert_eq!(
            edit_op(&KeyInput::new(Key::Escape, vec![])),
            EditOp::Rollback
        );
        assert_eq!(
            edit_op(&KeyInput::new(Key::A, vec![])),
            EditOp::Insert('a')
        );
        assert_eq!(
            edit_op(&KeyInput::new(Key::A, vec![Modifier::Shift])),
            EditOp::Insert('A')
        );
        assert_eq!(edit_op(&KeyInput::new(Key::F1, vec![])), EditOp::Noop);
    }

    #[test]
    fn applying_ops_edits_the_field() {
        let mut minibuffer = Minibuffer::new(
            InputTarget::Popup(1),
            Purpose::TagsetSpec,
            "tagset: ",
            "work",
        );

        minibuffer.apply(EditOp::Insert(' '));
        minibuffer.apply(EditOp::Insert('|'));
        minibuffer.apply(EditOp::Insert(' '));
        minibuffer.apply(EditOp::Insert('m'));
        minibuffer.apply(EditOp::DeleteBackward);

        assert_eq!(minibuffer.buffer.as_string(), "work | ");
    }
}
