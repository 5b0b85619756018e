pub use crate::Result;

use crate::geometry::Dim;
use crate::geometry::Pos;
use crate::geometry::Region;
use crate::input::KeyEvent;
use crate::input::MouseEvent;
use crate::window::IcccmWindowState;
use crate::window::StackMode;
use crate::window::Timestamp;
use crate::window::Window;
use crate::window::WindowState;

#[derive(Debug, Clone)]
pub enum Event {
    Mouse {
        event: MouseEvent,
        on_root: bool,
    },
    Key {
        event: KeyEvent,
    },
    MapRequest {
        window: Window,
        ignore: bool,
    },
    Map {
        window: Window,
        ignore: bool,
    },
    Enter {
        window: Window,
        root_rpos: Pos,
        normal: bool,
        inferior: bool,
        on_root: bool,
        time: Timestamp,
    },
    Leave {
        window: Window,
        root_rpos: Pos,
        time: Timestamp,
    },
    Destroy {
        window: Window,
    },
    Expose {
        window: Window,
    },
    Unmap {
        window: Window,
        synthetic: bool,
    },
    Configure {
        window: Window,
        region: Region,
        on_root: bool,
    },
    PlacementRequest {
        window: Window,
        pos: Option<Pos>,
        dim: Option<Dim>,
        on_root: bool,
    },
    RestackRequest {
        window: Window,
        sibling: Option<Window>,
        mode: StackMode,
    },
    StateRequest {
        window: Window,
        state: WindowState,
        action: ToggleAction,
        on_root: bool,
    },
    ChangeStateRequest {
        window: Window,
        state: IcccmWindowState,
    },
    FocusRequest {
        window: Window,
        on_root: bool,
    },
    CloseRequest {
        window: Window,
        on_root: bool,
    },
    Property {
        window: Window,
        kind: PropertyKind,
        deleted: bool,
        on_root: bool,
        time: Timestamp,
    },
    TagsetRequest {
        time: Timestamp,
    },
    ExitRequest {
        time: Timestamp,
    },
    FrameExtentsRequest {
        window: Window,
    },
    Mapping {
        request: u8,
    },
    ScreenChange,
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum ToggleAction {
    Toggle,
    Add,
    Remove,
}

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum PropertyKind {
    Name,
    Class,
    SizeHints,
    Hints,
    Protocols,
    Transient,
    Tags,
    TagsetExpression,
    Command,
}
