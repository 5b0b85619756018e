use crate::change::Toggle;
use crate::defaults;
use crate::identify::Ident;
use crate::identify::Identify;

use winsys::geometry::Extents;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::hints::SizeHints;
use winsys::window::Atom;
use winsys::window::IcccmWindowState;
use winsys::window::Timestamp;
use winsys::window::Window;

use std::cell::Cell;
use std::cell::RefCell;

pub struct Client {
    window: Window,
    frame: Window,
    name: RefCell<String>,
    class: RefCell<String>,
    instance: RefCell<String>,
    frame_region: Cell<Region>,
    prev_frame_region: Cell<Region>,
    restore_region: Cell<Option<Region>>,
    size_hints: Cell<Option<SizeHints>>,
    wm_state: Cell<IcccmWindowState>,
    parent: Cell<Option<Window>>,
    transients: RefCell<Vec<Window>>,
    tags: RefCell<Vec<Atom>>,
    accepts_input: Cell<bool>,
    takes_focus: Cell<bool>,
    focused: Cell<bool>,
    mapped: Cell<bool>,
    managed: Cell<bool>,
    fullscreen: Cell<bool>,
    maximized_horz: Cell<bool>,
    maximized_vert: Cell<bool>,
    above: Cell<bool>,
    urgent: Cell<bool>,
    saved_border_width: Cell<u32>,
    focus_time: Cell<Timestamp>,
    expected_unmap_count: Cell<u8>,
}

impl Identify for Client {
    fn id(&self) -> Ident {
        self.window as Ident
    }
}

impl Client {
    pub fn new(
        window: Window,
        frame: Window,
        name: impl Into<String>,
        class: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            window,
            frame,
            name: RefCell::new(name.into()),
            class: RefCell::new(class.into()),
            instance: RefCell::new(instance.into()),
            frame_region: Cell::new(Default::default()),
            prev_frame_region: Cell::new(Default::default()),
            restore_region: Cell::new(None),
            size_hints: Cell::new(None),
            wm_state: Cell::new(IcccmWindowState::Withdrawn),
            parent: Cell::new(None),
            transients: RefCell::new(Vec::new()),
            tags: RefCell::new(Vec::new()),
            accepts_input: Cell::new(true),
            takes_focus: Cell::new(false),
            focused: Cell::new(false),
            mapped: Cell::new(false),
            managed: Cell::new(true),
            fullscreen: Cell::new(false),
            maximized_horz: Cell::new(false),
            maximized_vert: Cell::new(false),
            above: Cell::new(false),
            urgent: Cell::new(false),
            saved_border_width: Cell::new(0),
            focus_time: Cell::new(0),
            expected_unmap_count: Cell::new(0),
        }
    }

    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    #[inline]
    pub fn frame(&self) -> Window {
        self.frame
    }

    #[inline]
    pub fn windows(&self) -> (Window, Window) {
        (self.window, self.frame)
    }

    #[inline]
    pub fn set_name(
        &self,
        name: impl Into<String>,
    ) {
        self.name.replace(name.into());
    }

    #[inline]
    pub fn name(&self) -> String {
        self.name.borrow().to_owned()
    }

    #[inline]
    pub fn set_class(
        &self,
        class: impl Into<String>,
    ) {
        self.class.replace(class.into());
    }

    #[inline]
    pub fn class(&self) -> String {
        self.class.borrow().to_owned()
    }

    #[inline]
    pub fn set_instance(
        &self,
        instance: impl Into<String>,
    ) {
        self.instance.replace(instance.into());
    }

    #[inline]
    pub fn instance(&self) -> String {
        self.instance.borrow().to_owned()
    }

    /// The decoration inset between the frame and the client window.
    #[inline]
    pub fn frame_extents(&self) -> Extents {
        if self.fullscreen.get() {
            Extents::default()
        } else {
            defaults::FRAME_EXTENTS
        }
    }

    /// Position of the client window within its frame.
    #[inline]
    pub fn inner_pos(&self) -> Pos {
        let extents = self.frame_extents();

        Pos {
            x: extents.left,
            y: extents.top,
        }
    }

    #[inline]
    pub fn set_frame_region(
        &self,
        region: Region,
    ) {
        let region = self.frame_region.replace(region);
        self.prev_frame_region.set(region);
    }

    #[inline]
    pub fn frame_region(&self) -> Region {
        self.frame_region.get()
    }

    #[inline]
    pub fn prev_frame_region(&self) -> Region {
        self.prev_frame_region.get()
    }

    /// The client window's geometry in root coordinates.
    #[inline]
    pub fn inner_region(&self) -> Region {
        self.frame_region.get().without_extents(self.frame_extents())
    }

    #[inline]
    pub fn set_restore_region(
        &self,
        region: Option<Region>,
    ) {
        self.restore_region.set(region);
    }

    #[inline]
    pub fn restore_region(&self) -> Option<Region> {
        self.restore_region.get()
    }

    #[inline]
    pub fn set_size_hints(
        &self,
        size_hints: Option<SizeHints>,
    ) {
        self.size_hints.set(size_hints);
    }

    #[inline]
    pub fn size_hints(&self) -> Option<SizeHints> {
        self.size_hints.get()
    }

    #[inline]
    pub fn set_wm_state(
        &self,
        state: IcccmWindowState,
    ) {
        self.wm_state.set(state);
    }

    #[inline]
    pub fn wm_state(&self) -> IcccmWindowState {
        self.wm_state.get()
    }

    #[inline]
    pub fn set_parent(
        &self,
        parent: Option<Window>,
    ) {
        self.parent.set(parent);
    }

    #[inline]
    pub fn parent(&self) -> Option<Window> {
        self.parent.get()
    }

    #[inline]
    pub fn add_transient(
        &self,
        transient: Window,
    ) {
        self.transients.borrow_mut().push(transient);
    }

    #[inline]
    pub fn remove_transient(
        &self,
        transient: Window,
    ) {
        let mut transients = self.transients.borrow_mut();

        if let Some(index) = transients.iter().rposition(|&t| t == transient) {
            transients.remove(index);
        }
    }

    #[inline]
    pub fn transients(&self) -> Vec<Window> {
        self.transients.borrow().clone()
    }

    #[inline]
    pub fn set_tags(
        &self,
        tags: impl Into<Vec<Atom>>,
    ) {
        self.tags.replace(tags.into());
    }

    #[inline]
    pub fn tags(&self) -> Vec<Atom> {
        self.tags.borrow().clone()
    }

    #[inline]
    pub fn has_tag(
        &self,
        tag: Atom,
    ) -> bool {
        self.tags.borrow().contains(&tag)
    }

    #[inline]
    pub fn set_accepts_input(
        &self,
        accepts_input: bool,
    ) {
        self.accepts_input.set(accepts_input);
    }

    #[inline]
    pub fn accepts_input(&self) -> bool {
        self.accepts_input.get()
    }

    #[inline]
    pub fn set_takes_focus(
        &self,
        takes_focus: bool,
    ) {
        self.takes_focus.set(takes_focus);
    }

    #[inline]
    pub fn takes_focus(&self) -> bool {
        self.takes_focus.get()
    }

    #[inline]
    pub fn set_focused(
        &self,
        toggle: Toggle,
    ) {
        self.focused.set(toggle.eval(self.focused.get()));
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    #[inline]
    pub fn set_mapped(
        &self,
        toggle: Toggle,
    ) {
        self.mapped.set(toggle.eval(self.mapped.get()));
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mapped.get()
    }

    #[inline]
    pub fn set_managed(
        &self,
        toggle: Toggle,
    ) {
        self.managed.set(toggle.eval(self.managed.get()));
    }

    #[inline]
    pub fn is_managed(&self) -> bool {
        self.managed.get()
    }

    #[inline]
    pub fn set_fullscreen(
        &self,
        toggle: Toggle,
    ) {
        self.fullscreen.set(toggle.eval(self.fullscreen.get()));
    }

    #[inline]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    #[inline]
    pub fn set_maximized_horz(
        &self,
        toggle: Toggle,
    ) {
        self.maximized_horz
            .set(toggle.eval(self.maximized_horz.get()));
    }

    #[inline]
    pub fn is_maximized_horz(&self) -> bool {
        self.maximized_horz.get()
    }

    #[inline]
    pub fn set_maximized_vert(
        &self,
        toggle: Toggle,
    ) {
        self.maximized_vert
            .set(toggle.eval(self.maximized_vert.get()));
    }

    #[inline]
    pub fn is_maximized_vert(&self) -> bool {
        self.maximized_vert.get()
    }

    #[inline]
    pub fn is_size_constrained(&self) -> bool {
        self.fullscreen.get() || self.maximized_horz.get() || self.maximized_vert.get()
    }

    #[inline]
    pub fn set_above(
        &self,
        toggle: Toggle,
    ) {
        self.above.set(toggle.eval(self.above.get()));
    }

    #[inline]
    pub fn is_above(&self) -> bool {
        self.above.get()
    }

    #[inline]
    pub fn set_urgent(
        &self,
        toggle: Toggle,
    ) {
        self.urgent.set(toggle.eval(self.urgent.get()));
    }

    #[inline]
    pub fn is_urgent(&self) -> bool {
        self.urgent.get()
    }

    #[inline]
    pub fn set_saved_border_width(
        &self,
        width: u32,
    ) {
        self.saved_border_width.set(width);
    }

    #[inline]
    pub fn saved_border_width(&self) -> u32 {
        self.saved_border_width.get()
    }

    #[inline]
    pub fn set_focus_time(
        &self,
        time: Timestamp,
    ) {
        self.focus_time.set(time);
    }

    #[inline]
    pub fn focus_time(&self) -> Timestamp {
        self.focus_time.get()
    }

    #[inline]
    pub fn expect_unmap(&self) {
        self.expected_unmap_count
            .set(self.expected_unmap_count.get() + 1);
    }

    #[inline]
    pub fn consume_unmap_if_expecting(&self) -> bool {
        let expected_unmap_count = self.expected_unmap_count.get();
        let expecting = expected_unmap_count > 0;

        if expecting {
            self.expected_unmap_count.set(expected_unmap_count - 1);
        }

        expecting
    }
}

impl PartialEq for Client {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.window == other.window
    }
}

pub struct Hex32(pub u32);

impl std::fmt::Debug for Hex32 {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:#0x}", &self.0)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("window", &Hex32(self.window))
            .field("frame", &Hex32(self.frame))
            .field("name", &self.name)
            .field("class", &self.class)
            .field("instance", &self.instance)
            .field("frame_region", &self.frame_region)
            .field("wm_state", &self.wm_state)
            .field("tags", &self.tags)
            .field("fullscreen", &self.fullscreen)
            .field("maximized_horz", &self.maximized_horz)
            .field("maximized_vert", &self.maximized_vert)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_region_inflates_inner_region_by_decoration() {
        let client = Client::new(1, 2, "term", "XTerm", "xterm");

        client.set_frame_region(Region::new(100, 100, 302, 218));

        let inner = client.inner_region();
        let extents = client.frame_extents();

        assert_eq!(inner.pos.x, 100 + extents.left);
        assert_eq!(inner.pos.y, 100 + extents.top);
        assert_eq!(inner.dim.w, 302 - extents.left - extents.right);
        assert_eq!(inner.dim.h, 218 - extents.top - extents.bottom);
        assert_eq!(inner.with_extents(extents), client.frame_region());
    }

    #[test]
    fn fullscreen_drops_decoration_extents() {
        let client = Client::new(1, 2, "term", "XTerm", "xterm");

        client.set_frame_region(Region::new(0, 0, 1920, 1080));
        client.set_fullscreen(Toggle::On);

        assert_eq!(client.inner_region(), client.frame_region());
    }

    #[test]
    fn unmap_expectation_is_consumed_once_per_unmap() {
        let client = Client::new(1, 2, "term", "XTerm", "xterm");

        client.expect_unmap();

        assert!(client.consume_unmap_if_expecting());
        assert!(!client.consume_unmap_if_expecting());
    }
}
