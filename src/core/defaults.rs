use winsys::geometry::Dim;
use winsys::geometry::Extents;

pub type Color = u32;

#[macro_export]
macro_rules! WM_NAME (
    () => { "dim" };
);

pub const FOCUSED_TITLEBAR_COLOR: Color = 0xD7005F;
pub const REGULAR_TITLEBAR_COLOR: Color = 0x191A2A;
pub const FOCUSED_BORDER_COLOR: Color = 0xD7005F;
pub const REGULAR_BORDER_COLOR: Color = 0x707070;
pub const URGENT_BORDER_COLOR: Color = 0xD08928;

pub const BORDER_WIDTH: i32 = 1;
pub const TITLEBAR_HEIGHT: i32 = 17;

pub const FRAME_EXTENTS: Extents = Extents {
    left: BORDER_WIDTH,
    right: BORDER_WIDTH,
    top: BORDER_WIDTH + TITLEBAR_HEIGHT,
    bottom: BORDER_WIDTH,
};

pub const MIN_CLIENT_DIM: Dim = Dim {
    w: 25,
    h: 10,
};

pub const SNAP_THRESHOLD: i32 = 5;
pub const MOVE_DELTA: i32 = 3;

pub const MINIBUFFER_HEIGHT: i32 = 20;
pub const PREFIX_TIMEOUT_SECS: u64 = 5;

pub const FONT_NAME: &str = "fixed";
