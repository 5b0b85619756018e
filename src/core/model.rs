use crate::binding::KeyBindings;
use crate::binding::MouseBindings;
use crate::binding::Resolution;
use crate::change::Direction;
use crate::change::Toggle;
use crate::client::Client;
use crate::cycle::Cycle;
use crate::cycle::Selector;
use crate::decoration::Decoration;
use crate::defaults;
use crate::focus::ClickAction;
use crate::focus::FocusList;
use crate::focus::FocusPolicy;
use crate::minibuffer::edit_op;
use crate::minibuffer::EditOp;
use crate::minibuffer::InputTarget;
use crate::minibuffer::Minibuffer;
use crate::minibuffer::Purpose;
use crate::moveresize::snap_move;
use crate::moveresize::snap_resize;
use crate::moveresize::Guideline;
use crate::moveresize::MoveResize;
use crate::moveresize::OpKind;
use crate::moveresize::SnapTargets;
use crate::tags::parse_tagset;
use crate::tags::TagEngine;
use crate::tags::TagExpr;
use crate::tags::TagsetStack;
use crate::util::BuildIdHasher;
use crate::util::Util;

use winsys::connection::Connection;
use winsys::event::Event;
use winsys::event::PropertyKind;
use winsys::event::ToggleAction;
use winsys::properties::PropertyValue;
use winsys::geometry::Corner;
use winsys::geometry::Dim;
use winsys::geometry::Grip;
use winsys::geometry::Pos;
use winsys::geometry::Region;
use winsys::input::Key;
use winsys::input::KeyEvent;
use winsys::input::KeyInput;
use winsys::input::Modifier;
use winsys::input::MouseEvent;
use winsys::input::MouseEventKind;
use winsys::screen::Screen;
use winsys::window::IcccmWindowState;
use winsys::window::Protocol;
use winsys::window::StackMode;
use winsys::window::Timestamp;
use winsys::window::Window;
use winsys::window::WindowState;

use std::cell::Cell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Duration;
use std::time::Instant;

/// A modal subsystem temporarily owning input events. The dispatcher
/// consults the top of the modal stack before regular handlers.
enum Modal {
    MoveResize(MoveResize),
    Minibuffer(Minibuffer),
    FocusCycle(FocusCycle),
    Prefix {
        path: Vec<KeyInput>,
        started: Instant,
    },
}

/// Modal next/prev focus traversal. The chord that starts the cycle
/// defines the modifier set whose full release commits the target.
struct FocusCycle {
    candidates: Cycle<Window>,
    initial: Option<Window>,
    cycle_modifiers: HashSet<Modifier>,
    strip: Window,
}

pub struct Model<'model> {
    conn: &'model dyn Connection,
    screen: Screen,
    client_map: HashMap<Window, Client, BuildIdHasher>,
    frame_map: HashMap<Window, Window, BuildIdHasher>,
    window_map: HashMap<Window, Window, BuildIdHasher>,
    unmanaged_windows: HashSet<Window, BuildIdHasher>,
    focus_list: FocusList,
    focus: Cell<Option<Window>>,
    focus_policy: Box<dyn FocusPolicy>,
    tag_engine: TagEngine,
    tagset_stack: TagsetStack,
    last_expression: Option<TagExpr>,
    modals: Vec<Modal>,
    decoration: Decoration,
    running: bool,
    exec_argv: Option<Vec<String>>,
    last_timestamp: Cell<Timestamp>,
    last_key_event: Option<KeyEvent>,
    wm_command_time: Cell<Timestamp>,
}

impl<'model> Model<'model> {
    pub fn new(
        conn: &'model dyn Connection,
        focus_policy: Box<dyn FocusPolicy>,
        key_bindings: &KeyBindings,
        mouse_bindings: &MouseBindings,
    ) -> Self {
        let mut model = Self {
            conn,
            screen: Screen::new(0, Region::default(), Vec::new()),
            client_map: HashMap::with_hasher(BuildIdHasher),
            frame_map: HashMap::with_hasher(BuildIdHasher),
            window_map: HashMap::with_hasher(BuildIdHasher),
            unmanaged_windows: HashSet::with_hasher(BuildIdHasher),
            focus_list: FocusList::new(),
            focus: Cell::new(None),
            focus_policy,
            tag_engine: TagEngine::new(),
            tagset_stack: TagsetStack::new(HashSet::new()),
            last_expression: None,
            modals: Vec::new(),
            decoration: Decoration::DEFAULT,
            running: true,
            exec_argv: None,
            last_timestamp: Cell::new(0),
            last_key_event: None,
            wm_command_time: Cell::new(0),
        };

        model.init(key_bindings, mouse_bindings);
        model
    }

    fn init(
        &mut self,
        key_bindings: &KeyBindings,
        mouse_bindings: &MouseBindings,
    ) {
        info!(
            "initializing {} with {} focus policy",
            WM_NAME!(),
            self.focus_policy.name()
        );

        self.screen = self.conn.update_outputs();
        self.conn.init_wm_properties(WM_NAME!());
        self.conn
            .set_wm_command(&std::env::args().collect::<Vec<String>>());

        self.conn
            .grab_bindings(&key_bindings.inputs(), &mouse_bindings.inputs());

        self.conn
            .top_level_windows()
            .into_iter()
            .for_each(|window| {
                self.manage(window, !self.conn.must_manage_window(window));
            });

        info!("adopted {} existing clients", self.client_map.len());
    }

    #[inline]
    pub fn exec_argv(&self) -> Option<Vec<String>> {
        self.exec_argv.clone()
    }

    #[inline]
    fn client_window(
        &self,
        window: Window,
    ) -> Option<Window> {
        if self.window_map.contains_key(&window) {
            return Some(window);
        }

        self.frame_map.get(&window).copied()
    }

    #[inline]
    fn client(
        &self,
        window: Window,
    ) -> Option<&Client> {
        self.client_window(window)
            .and_then(|window| self.client_map.get(&window))
            .filter(|client| client.is_managed())
    }

    #[inline]
    fn timestamp(&self) -> Timestamp {
        self.last_timestamp.get()
    }

    #[inline]
    fn note_timestamp(
        &self,
        time: Timestamp,
    ) {
        if time != 0 {
            self.last_timestamp.set(time);
        }
    }

    fn managed_windows(&self) -> HashSet<Window> {
        self.client_map
            .values()
            .filter(|client| client.is_managed())
            .map(|client| client.window())
            .collect()
    }

    fn visible_frame_regions_except(
        &self,
        window: Window,
    ) -> Vec<Region> {
        self.client_map
            .values()
            .filter(|client| {
                client.window() != window && client.is_managed() && client.is_mapped()
            })
            .map(|client| client.frame_region())
            .collect()
    }

    // ------------------------------------------------------------------
    // Client lifecycle
    // ------------------------------------------------------------------

    fn manage(
        &mut self,
        window: Window,
        ignore: bool,
    ) {
        if ignore {
            if self.conn.window_is_mapped(window) {
                self.conn.map_window(window);
            }

            self.unmanaged_windows.insert(window);
            return;
        }

        if self.client_map.contains_key(&window) {
            return;
        }

        let geometry = match self.conn.get_window_geometry(window) {
            Ok(geometry) => geometry,
            Err(_) => return,
        };

        let name = self.conn.get_icccm_window_name(window);
        let (instance, class) = self.conn.get_icccm_window_class(window);
        let size_hints = self
            .conn
            .get_icccm_window_size_hints(window, Some(defaults::MIN_CLIENT_DIM));
        let hints = self.conn.get_icccm_window_hints(window);
        let parent = self.conn.get_icccm_window_transient_for(window);

        let mut frame_region = geometry
            .with_size_hints(&size_hints)
            .with_extents(defaults::FRAME_EXTENTS);

        let placed_by_user = size_hints.map_or(false, |size_hints| size_hints.by_user);

        if !placed_by_user && geometry.pos.is_origin() {
            frame_region = self
                .screen
                .crtc_containing(self.conn.get_pointer_position())
                .from_absolute_inner_center(frame_region.dim);
        }

        let frame = self.conn.create_frame(frame_region);
        let client = Client::new(window, frame, name, class, instance);

        client.set_frame_region(frame_region);
        client.set_size_hints(size_hints);
        client.set_saved_border_width(self.conn.get_window_border_width(window));
        client.set_parent(parent);
        client.set_wm_state(IcccmWindowState::Normal);

        if let Some(hints) = hints {
            client.set_accepts_input(hints.input.unwrap_or(true));
            client.set_urgent(Toggle::from(hints.urgent));
        }

        client
            .set_takes_focus(self.conn.window_has_protocol(window, Protocol::TakeFocus));

        let inner_pos = client.inner_pos();

        self.conn.set_window_border_width(window, 0);
        self.conn.insert_window_in_save_set(window);
        self.conn.reparent_window(window, frame, inner_pos);
        self.conn.init_window(window);
        self.conn
            .set_icccm_window_state(window, IcccmWindowState::Normal);
        self.conn
            .set_window_frame_extents(window, client.frame_extents());

        if let Some(parent) = parent.and_then(|parent| self.client_window(parent)) {
            if let Some(parent) = self.client_map.get(&parent) {
                parent.add_transient(window);
            }
        }

        let fullscreen = self.conn.window_is_fullscreen(window);

        info!("managing client {:#0x} inside frame {:#0x}", window, frame);

        self.client_map.insert(window, client);
        self.frame_map.insert(frame, window);
        self.window_map.insert(window, frame);
        self.focus_list.note(window);
        self.tagset_stack.insert(window);

        self.note_client_tags(window);

        let client = &self.client_map[&window];
        self.place_client(client);
        self.conn.map_window(frame);
        self.conn.map_window(window);
        client.set_mapped(Toggle::On);
        self.render_decoration(client, false);

        if self.focus_policy.grabs_focus_clicks() {
            self.conn.grab_focus_click(frame);
        }

        if fullscreen {
            self.set_fullscreen_window(window, Toggle::On);
        }

        let accepts_focus = {
            let client = &self.client_map[&window];
            client.accepts_input() || client.takes_focus()
        };

        if self.focus_policy.focus_on_map(accepts_focus) {
            self.focus_window(window, self.timestamp());
        }

        self.update_client_list();
    }

    fn unmanage(
        &mut self,
        window: Window,
        destroyed: bool,
    ) {
        let client = match self.client_map.remove(&window) {
            Some(client) => client,
            None => return,
        };

        info!("unmanaging client {:#0x}", window);

        self.abort_modal_for(window);

        let frame = client.frame();

        if !destroyed {
            self.conn
                .set_window_border_width(window, client.saved_border_width());
            self.conn
                .unparent_window(window, client.inner_region().pos);
            self.conn.remove_window_from_save_set(window);
            self.conn
                .set_icccm_window_state(window, IcccmWindowState::Withdrawn);
        }

        self.conn.destroy_window(frame);

        if let Some(parent) = client.parent().and_then(|parent| self.client_map.get(&parent)) {
            parent.remove_transient(window);
        }

        self.frame_map.remove(&frame);
        self.window_map.remove(&window);
        self.focus_list.remove(window);
        self.tag_engine.forget_tags(window);
        self.tagset_stack.remove(window);

        if self.focus.get() == Some(window) {
            self.focus.set(None);
            self.ensure_focus(self.timestamp());
        }

        self.update_client_list();
    }

    fn update_client_list(&self) {
        let clients: Vec<Window> = self
            .client_map
            .values()
            .filter(|client| client.is_managed())
            .map(|client| client.window())
            .collect();

        self.conn.update_client_list(&clients);
    }

    /// Push the new frame geometry to the server. Per ICCCM §4.1.5 the
    /// client learns of a move that did not resize it through a
    /// synthetic ConfigureNotify.
    fn place_client(
        &self,
        client: &Client,
    ) {
        let frame_region = client.frame_region();
        let inner = client.inner_region();
        let resized = client.prev_frame_region().dim != frame_region.dim;

        self.conn.place_window(client.frame(), &frame_region);
        self.conn.place_window(client.window(), &Region {
            pos: client.inner_pos(),
            dim: inner.dim,
        });

        if !resized {
            self.conn.send_configure_notify(client.window(), inner, 0);
        }
    }

    fn render_decoration(
        &self,
        client: &Client,
        focused: bool,
    ) {
        if client.is_fullscreen() {
            return;
        }

        let colors = self.decoration.colors;
        let border_color = if client.is_urgent() {
            colors.urgent
        } else if focused {
            colors.focused
        } else {
            colors.regular
        };

        self.conn.set_window_border_color(client.frame(), border_color);
        self.conn.draw_titlebar(
            client.frame(),
            self.decoration.titlebar_dim(client.frame_region()),
            &client.name(),
            focused,
        );
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    fn accepts_focus_offer(client: &Client) -> bool {
        client.accepts_input() || client.takes_focus()
    }

    pub fn focus_window(
        &mut self,
        window: Window,
        time: Timestamp,
    ) {
        let window = match self.client_window(window) {
            Some(window) => window,
            None => return,
        };

        if self.focus.get() == Some(window) {
            return;
        }

        let (accepts_input, takes_focus, frame) = match self.client(window) {
            Some(client)
                if client.wm_state() == IcccmWindowState::Normal
                    && Self::accepts_focus_offer(client) =>
            {
                (client.accepts_input(), client.takes_focus(), client.frame())
            },
            _ => return,
        };

        debug!("focusing client {:#0x} at time {}", window, time);

        if let Some(prev_focus) = self.focus.get() {
            self.unfocus_window(prev_focus);
        }

        // ICCCM §4.1.7: the input model decides which offer the client
        // understands.
        if accepts_input {
            self.conn.set_input_focus(window, time);
        }

        if takes_focus {
            self.conn
                .send_protocol_message(window, Protocol::TakeFocus, time);
        }

        self.focus.set(Some(window));
        self.focus_list.promote(window);
        self.conn.set_active_window(Some(window));

        if let Some(client) = self.client_map.get(&window) {
            client.set_focused(Toggle::On);
            client.set_urgent(Toggle::Off);
            client.set_focus_time(time);

            if self.focus_policy.grabs_focus_clicks() {
                self.conn.ungrab_focus_click(frame);
            }

            self.render_decoration(client, true);
        }
    }

    fn unfocus_window(
        &self,
        window: Window,
    ) {
        if let Some(client) = self.client_map.get(&window) {
            client.set_focused(Toggle::Off);

            if self.focus_policy.grabs_focus_clicks() {
                self.conn.grab_focus_click(client.frame());
            }

            self.render_decoration(client, false);
        }
    }

    /// Re-establish a valid focus after a disturbance: the most recently
    /// focused client still visible under the active tagset, with
    /// PointerRoot as the fallback.
    pub fn ensure_focus(
        &mut self,
        time: Timestamp,
    ) {
        let candidate = self
            .focus_list
            .mru()
            .into_iter()
            .find(|&window| self.window_is_focusable(window));

        match candidate {
            Some(window) => self.focus_window(window, time),
            None => {
                self.focus.set(None);
                self.conn.set_active_window(None);
                self.conn.set_pointer_root_focus(time);
            },
        }
    }

    fn window_is_focusable(
        &self,
        window: Window,
    ) -> bool {
        self.tagset_stack.contains(window)
            && self.client(window).map_or(false, |client| {
                client.is_mapped()
                    && client.wm_state() == IcccmWindowState::Normal
                    && Self::accepts_focus_offer(client)
            })
    }

    // ------------------------------------------------------------------
    // EWMH state changes
    // ------------------------------------------------------------------

    pub fn toggle_fullscreen_focus(&mut self) {
        if let Some(focus) = self.focus.get() {
            self.set_fullscreen_window(focus, Toggle::Reverse);
        }
    }

    pub fn set_fullscreen_window(
        &mut self,
        window: Window,
        toggle: Toggle,
    ) {
        let client = match self.client(window) {
            Some(client) => client,
            None => return,
        };

        let on = toggle.eval(client.is_fullscreen());

        if on == client.is_fullscreen() {
            return;
        }

        info!("setting fullscreen to {} on client {:#0x}", on, window);

        if on {
            if client.restore_region().is_none() {
                client.set_restore_region(Some(client.frame_region()));
            }

            let monitor = self.screen.crtc_containing_region(client.frame_region());

            client.set_fullscreen(Toggle::On);
            client.set_frame_region(monitor);

            self.conn
                .set_window_state(window, WindowState::Fullscreen, true);
            self.conn.stack_window_above(client.frame(), None);
        } else {
            client.set_fullscreen(Toggle::Off);

            if let Some(region) = client.restore_region() {
                client.set_frame_region(region);
            }

            if !client.is_size_constrained() {
                client.set_restore_region(None);
            }

            self.conn
                .set_window_state(window, WindowState::Fullscreen, false);
        }

        let client = &self.client_map[&window];
        self.place_client(client);
        self.render_decoration(client, self.focus.get() == Some(window));
    }

    pub fn toggle_maximize_focus(&mut self) {
        if let Some(focus) = self.focus.get() {
            let maximized = self.client(focus).map_or(false, |client| {
                client.is_maximized_horz() && client.is_maximized_vert()
            });

            let toggle = Toggle::from(!maximized);
            self.set_maximize_window(focus, WindowState::MaximizedHorz, toggle);
            self.set_maximize_window(focus, WindowState::MaximizedVert, toggle);
        }
    }

    pub fn set_maximize_window(
        &mut self,
        window: Window,
        state: WindowState,
        toggle: Toggle,
    ) {
        let client = match self.client(window) {
            Some(client) => client,
            None => return,
        };

        if client.is_fullscreen() {
            return;
        }

        let horz = state == WindowState::MaximizedHorz;
        let on = toggle.eval(if horz {
            client.is_maximized_horz()
        } else {
            client.is_maximized_vert()
        });

        let monitor = self.screen.crtc_containing_region(client.frame_region());
        let mut region = client.frame_region();

        if on {
            if client.restore_region().is_none() {
                client.set_restore_region(Some(region));
            }

            if horz {
                region.pos.x = monitor.pos.x;
                region.dim.w = monitor.dim.w;
                client.set_maximized_horz(Toggle::On);
            } else {
                region.pos.y = monitor.pos.y;
                region.dim.h = monitor.dim.h;
                client.set_maximized_vert(Toggle::On);
            }
        } else {
            let restore = client.restore_region().unwrap_or(region);

            if horz {
                region.pos.x = restore.pos.x;
                region.dim.w = restore.dim.w;
                client.set_maximized_horz(Toggle::Off);
            } else {
                region.pos.y = restore.pos.y;
                region.dim.h = restore.dim.h;
                client.set_maximized_vert(Toggle::Off);
            }

            if !client.is_size_constrained() {
                client.set_restore_region(None);
            }
        }

        client.set_frame_region(region);
        self.conn.set_window_state(window, state, on);

        let client = &self.client_map[&window];
        self.place_client(client);
        self.render_decoration(client, self.focus.get() == Some(window));
    }

    pub fn iconify_focus(&mut self) {
        if let Some(focus) = self.focus.get() {
            self.iconify_window(focus);
        }
    }

    fn iconify_window(
        &mut self,
        window: Window,
    ) {
        self.iconify_window_inner(window);
        self.ensure_focus(self.timestamp());
    }

    fn iconify_window_inner(
        &mut self,
        window: Window,
    ) {
        let window = match self.client_window(window) {
            Some(window) => window,
            None => return,
        };

        if let Some(client) = self.client_map.get(&window) {
            if client.wm_state() == IcccmWindowState::Iconic {
                return;
            }

            info!("iconifying client {:#0x}", window);

            client.set_wm_state(IcccmWindowState::Iconic);
            client.expect_unmap();
            client.set_mapped(Toggle::Off);

            self.conn
                .set_icccm_window_state(window, IcccmWindowState::Iconic);
            self.conn.unmap_window(client.frame());
            self.conn.unmap_window(window);

            for transient in client.transients() {
                self.iconify_window_inner(transient);
            }
        }
    }

    fn deiconify_window(
        &mut self,
        window: Window,
    ) {
        if let Some(client) = self.client_map.get(&window) {
            if client.wm_state() != IcccmWindowState::Iconic {
                return;
            }

            info!("deiconifying client {:#0x}", window);

            client.set_wm_state(IcccmWindowState::Normal);
            client.set_mapped(Toggle::On);

            self.conn
                .set_icccm_window_state(window, IcccmWindowState::Normal);
            self.conn.map_window(client.frame());
            self.conn.map_window(window);

            for transient in client.transients() {
                self.deiconify_window(transient);
            }
        }
    }

    pub fn close_focus(&mut self) {
        if let Some(focus) = self.focus.get() {
            self.conn.close_window(focus, self.timestamp());
        }
    }

    pub fn raise_focus(&mut self) {
        if let Some(client) = self.focus.get().and_then(|focus| self.client(focus)) {
            self.conn.stack_window_above(client.frame(), None);
        }
    }

    pub fn lower_focus(&mut self) {
        if let Some(client) = self.focus.get().and_then(|focus| self.client(focus)) {
            self.conn.stack_window_below(client.frame(), None);
        }
    }

    // ------------------------------------------------------------------
    // Interactive move and resize
    // ------------------------------------------------------------------

    pub fn start_moving(
        &mut self,
        window: Window,
    ) {
        if !self.modals.is_empty() {
            return;
        }

        let time = self.timestamp();

        if let Some(client) = self.client(window) {
            if client.is_fullscreen() {
                return;
            }

            let (window, region) = (client.window(), client.frame_region());
            let pointer = self.conn.get_pointer_position();

            if !self.conn.grab_pointer(None, time) {
                return;
            }

            self.conn.grab_keyboard(time);
            self.modals.push(Modal::MoveResize(MoveResize::new_move(
                window, pointer, region,
            )));
        }
    }

    pub fn start_resizing(
        &mut self,
        window: Window,
    ) {
        if !self.modals.is_empty() {
            return;
        }

        let time = self.timestamp();

        if let Some(client) = self.client(window) {
            if client.is_size_constrained() {
                return;
            }

            let (window, region) = (client.window(), client.frame_region());
            let pointer = self.conn.get_pointer_position();
            let grip = region
                .nearest_grip(pointer)
                .unwrap_or(Grip::Corner(Corner::BottomRight));

            if !self.conn.grab_pointer(Some(grip), time) {
                return;
            }

            self.conn.grab_keyboard(time);
            self.modals.push(Modal::MoveResize(MoveResize::new_resize(
                window, pointer, region, grip,
            )));
        }
    }

    fn redraw_guidelines(
        &self,
        previous: &[Guideline],
        current: &[Guideline],
    ) {
        // XOR rendering: drawing a guideline again erases it.
        for guideline in previous {
            if !current.contains(guideline) {
                self.conn.draw_guideline(guideline.axis, guideline.coord);
            }
        }

        for guideline in current {
            if !previous.contains(guideline) {
                self.conn.draw_guideline(guideline.axis, guideline.coord);
            }
        }
    }

    fn moveresize_motion(
        &mut self,
        mut op: MoveResize,
        pointer: Pos,
    ) -> Modal {
        let (extents, size_hints) = match self.client(op.window()) {
            Some(client) => (client.frame_extents(), client.size_hints()),
            None => return Modal::MoveResize(op),
        };

        let candidate = op.candidate(pointer, extents, &size_hints);
        let targets = SnapTargets::assemble(
            &self.screen,
            &self.visible_frame_regions_except(op.window()),
        );

        let (snapped, guidelines) = match op.kind() {
            OpKind::Move => snap_move(candidate, &targets, defaults::SNAP_THRESHOLD),
            OpKind::Resize => {
                let (snapped, guidelines) =
                    snap_resize(candidate, op.grip(), &targets, defaults::SNAP_THRESHOLD);

                (
                    crate::moveresize::constrain_frame_region(
                        op.original(),
                        snapped,
                        op.grip(),
                        extents,
                        &size_hints,
                    ),
                    guidelines,
                )
            },
        };

        self.redraw_guidelines(op.guidelines(), &guidelines);
        op.set_guidelines(guidelines);

        if let Some(client) = self.client(op.window()) {
            if client.frame_region() != snapped {
                client.set_frame_region(snapped);
                self.place_client(client);
            }
        }

        Modal::MoveResize(op)
    }

    fn moveresize_finish(
        &mut self,
        op: &MoveResize,
        abort: bool,
        time: Timestamp,
    ) {
        self.redraw_guidelines(op.guidelines(), &[]);
        self.conn.ungrab_pointer(time);
        self.conn.ungrab_keyboard(time);

        if let Some(client) = self.client(op.window()) {
            if abort {
                client.set_frame_region(op.original());
            }

            self.place_client(client);
        }
    }

    // ------------------------------------------------------------------
    // Focus cycle
    // ------------------------------------------------------------------

    pub fn cycle_focus(
        &mut self,
        dir: Direction,
    ) {
        if !self.modals.is_empty() {
            return;
        }

        let candidates: Vec<Window> = self
            .focus_list
            .mru()
            .into_iter()
            .filter(|&window| self.window_is_focusable(window))
            .collect();

        if candidates.len() < 2 {
            return;
        }

        let cycle_modifiers: HashSet<Modifier> = self
            .last_key_event
            .as_ref()
            .map(|event| {
                event
                    .input
                    .modifiers
                    .iter()
                    .filter(|modifier| !modifier.is_lock())
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        if cycle_modifiers.is_empty() {
            return;
        }

        let time = self.timestamp();

        if !self.conn.grab_keyboard(time) {
            return;
        }

        let full_region = self.screen.full_region();
        let strip = self.conn.create_popup(Region::new(
            full_region.pos.x + full_region.dim.w / 10,
            full_region.pos.y + full_region.dim.h - defaults::MINIBUFFER_HEIGHT,
            full_region.dim.w * 8 / 10,
            defaults::MINIBUFFER_HEIGHT,
        ));
        self.conn.map_window(strip);

        let mut cycle = FocusCycle {
            candidates: Cycle::new(candidates, false),
            initial: self.focus.get(),
            cycle_modifiers,
            strip,
        };

        // The current focus heads the list; start on the next target.
        cycle.candidates.activate_for(&Selector::First);
        self.cycle_step(&mut cycle, dir);
        self.modals.push(Modal::FocusCycle(cycle));
    }

    fn cycle_step(
        &self,
        cycle: &mut FocusCycle,
        dir: Direction,
    ) {
        if let Some(&previous) = cycle.candidates.active_element() {
            if let Some(client) = self.client(previous) {
                self.render_decoration(client, false);
            }
        }

        cycle.candidates.cycle_active(dir);
        self.cycle_render(cycle);
    }

    fn cycle_render(
        &self,
        cycle: &FocusCycle,
    ) {
        if let Some(&target) = cycle.candidates.active_element() {
            if let Some(client) = self.client(target) {
                self.render_decoration(client, true);
                self.conn.draw_input_strip(
                    cycle.strip,
                    Dim {
                        w: self.screen.full_region().dim.w * 8 / 10,
                        h: defaults::MINIBUFFER_HEIGHT,
                    },
                    "cycle: ",
                    &client.name(),
                    client.name().chars().count(),
                );
            }
        }
    }

    fn cycle_finish(
        &mut self,
        cycle: FocusCycle,
        abort: bool,
        time: Timestamp,
    ) {
        self.conn.ungrab_keyboard(time);
        self.conn.destroy_window(cycle.strip);

        let highlighted = cycle.candidates.active_element().copied();
        let target = if abort {
            cycle.initial
        } else {
            highlighted
        };

        if abort && highlighted != cycle.initial {
            if let Some(client) = highlighted.and_then(|window| self.client(window)) {
                self.render_decoration(client, false);
            }
        }

        match target {
            Some(window) if self.focus.get() == Some(window) => {
                if let Some(client) = self.client(window) {
                    self.render_decoration(client, true);
                }
            },
            Some(window) => self.focus_window(window, time),
            None => self.ensure_focus(time),
        }
    }

    // ------------------------------------------------------------------
    // Minibuffer
    // ------------------------------------------------------------------

    pub fn read_tagset_spec(&mut self) {
        let initial = self
            .last_expression
            .as_ref()
            .map_or(String::new(), |expr| expr.unparse());

        self.open_minibuffer(Purpose::TagsetSpec, "tagset: ", initial);
    }

    pub fn read_spawn_command(&mut self) {
        self.open_minibuffer(Purpose::SpawnCommand, "spawn: ", String::new());
    }

    /// Prompt for an EWMH state to toggle on the focused client,
    /// pre-filled with the most common request.
    pub fn read_window_state(&mut self) {
        if let Some(focus) = self.focus.get() {
            self.open_minibuffer(
                Purpose::WindowState(focus),
                "state: ",
                "fullscreen".to_owned(),
            );
        }
    }

    /// Turn the focused client's titlebar into an inline input field
    /// editing its tag list.
    pub fn read_focus_tags(&mut self) {
        if !self.modals.is_empty() {
            return;
        }

        let (window, frame, initial) = match self.focus.get().and_then(|focus| self.client(focus))
        {
            Some(client) => (
                client.window(),
                client.frame(),
                client
                    .tags()
                    .iter()
                    .map(|&atom| self.conn.atom_name(atom))
                    .collect::<Vec<String>>()
                    .join(" "),
            ),
            None => return,
        };

        let time = self.timestamp();

        if !self.conn.grab_keyboard(time) {
            return;
        }

        let minibuffer = Minibuffer::new(
            InputTarget::Titlebar(frame),
            Purpose::ClientTags(window),
            "tags: ",
            initial,
        );

        self.draw_minibuffer(&minibuffer);
        self.modals.push(Modal::Minibuffer(minibuffer));
    }

    fn open_minibuffer(
        &mut self,
        purpose: Purpose,
        prompt: &str,
        initial: String,
    ) {
        if !self.modals.is_empty() {
            return;
        }

        let time = self.timestamp();

        if !self.conn.grab_keyboard(time) {
            return;
        }

        let full_region = self.screen.full_region();
        let window = self.conn.create_popup(Region::new(
            full_region.pos.x + full_region.dim.w / 10,
            full_region.pos.y + full_region.dim.h - defaults::MINIBUFFER_HEIGHT,
            full_region.dim.w * 8 / 10,
            defaults::MINIBUFFER_HEIGHT,
        ));

        self.conn.map_window(window);

        let minibuffer = Minibuffer::new(InputTarget::Popup(window), purpose, prompt, initial);

        self.draw_minibuffer(&minibuffer);
        self.modals.push(Modal::Minibuffer(minibuffer));
    }

    fn draw_minibuffer(
        &self,
        minibuffer: &Minibuffer,
    ) {
        let dim = match minibuffer.target {
            InputTarget::Popup(_) => Dim {
                w: self.screen.full_region().dim.w * 8 / 10,
                h: defaults::MINIBUFFER_HEIGHT,
            },
            InputTarget::Titlebar(frame) => self
                .frame_map
                .get(&frame)
                .and_then(|window| self.client_map.get(window))
                .map_or(
                    Dim {
                        w: 0,
                        h: 0,
                    },
                    |client| self.decoration.titlebar_dim(client.frame_region()),
                ),
        };

        self.conn.draw_input_strip(
            minibuffer.window(),
            dim,
            &minibuffer.prompt,
            &minibuffer.buffer.as_string(),
            minibuffer.buffer.cursor(),
        );
    }

    fn minibuffer_finish(
        &mut self,
        minibuffer: Minibuffer,
        commit: bool,
        time: Timestamp,
    ) {
        self.conn.ungrab_keyboard(time);

        match minibuffer.target {
            InputTarget::Popup(window) => self.conn.destroy_window(window),
            InputTarget::Titlebar(frame) => {
                // Hand the titlebar back to the decorator.
                if let Some(client) = self.frame_map.get(&frame).and_then(|w| self.client_map.get(w))
                {
                    self.render_decoration(client, self.focus.get() == Some(client.window()));
                }
            },
        }

        if !commit {
            return;
        }

        let content = minibuffer.buffer.as_string();

        match minibuffer.purpose {
            Purpose::TagsetSpec => match parse_tagset(&content) {
                Ok(expr) => self.apply_tagset(expr, time),
                Err(err) => warn!("invalid tagset spec {:?}: {}", content, err),
            },
            Purpose::SpawnCommand => {
                if !content.is_empty() {
                    Util::spawn_shell(content);
                }
            },
            Purpose::ClientTags(window) => self.retag_window(window, &content),
            Purpose::WindowState(window) => match content.trim() {
                "fullscreen" => self.set_fullscreen_window(window, Toggle::Reverse),
                "maximized_horz" => {
                    self.set_maximize_window(window, WindowState::MaximizedHorz, Toggle::Reverse)
                },
                "maximized_vert" => {
                    self.set_maximize_window(window, WindowState::MaximizedVert, Toggle::Reverse)
                },
                "maximized" => {
                    self.set_maximize_window(window, WindowState::MaximizedHorz, Toggle::Reverse);
                    self.set_maximize_window(window, WindowState::MaximizedVert, Toggle::Reverse);
                },
                state => warn!("unknown window state {:?}", state),
            },
        }
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    /// Mirror a client's `_DIM_TAGS` property into the tag engine.
    fn note_client_tags(
        &mut self,
        window: Window,
    ) {
        let tags = self.conn.get_window_tags(window);

        let tags = if tags.is_empty() {
            match self.auto_tags(window) {
                Some(tags) if !tags.is_empty() => {
                    let atoms: Vec<_> = tags
                        .iter()
                        .map(|name| self.conn.intern_atom(name))
                        .collect();

                    debug!("auto-tagging client {:#0x} with {:?}", window, tags);
                    self.conn.set_window_tags(window, &atoms);
                    atoms
                },
                _ => Vec::new(),
            }
        } else {
            tags
        };

        let names: Vec<String> = tags.iter().map(|&atom| self.conn.atom_name(atom)).collect();

        if let Some(client) = self.client_map.get(&window) {
            client.set_tags(tags);
        }

        self.tag_engine.forget_tags(window);
        self.tag_engine.note_tags(window, &names);
    }

    /// Default tags for a freshly mapped untagged client: the focused
    /// client's tags, or the leading identifier of the last tagset
    /// expression when nothing carries that tag yet.
    fn auto_tags(
        &self,
        window: Window,
    ) -> Option<Vec<String>> {
        if let Some(focus) = self.focus.get().filter(|&focus| focus != window) {
            if let Some(client) = self.client(focus) {
                if client.wm_state() == IcccmWindowState::Normal && !client.tags().is_empty() {
                    return Some(
                        client
                            .tags()
                            .iter()
                            .map(|&atom| self.conn.atom_name(atom))
                            .collect(),
                    );
                }
            }
        }

        if let Some(TagExpr::Tag(name)) = self.leading_tag(self.last_expression.as_ref()?) {
            if !self.tag_engine.is_known_tag(&name) {
                return Some(vec![name]);
            }
        }

        None
    }

    fn leading_tag(
        &self,
        expr: &TagExpr,
    ) -> Option<TagExpr> {
        match expr {
            TagExpr::Tag(_) => Some(expr.clone()),
            TagExpr::Union(lhs, _)
            | TagExpr::Difference(lhs, _)
            | TagExpr::Intersection(lhs, _) => self.leading_tag(lhs),
            _ => None,
        }
    }

    fn retag_window(
        &mut self,
        window: Window,
        spec: &str,
    ) {
        let atoms: Vec<_> = spec
            .split_whitespace()
            .map(|name| self.conn.intern_atom(name))
            .collect();

        info!("retagging client {:#0x} to {:?}", window, spec);

        self.conn.set_window_tags(window, &atoms);
        self.note_client_tags(window);
    }

    /// Evaluate an expression and map/unmap every managed client
    /// accordingly; the result becomes the new top of the tagset stack.
    pub fn apply_tagset(
        &mut self,
        expr: TagExpr,
        time: Timestamp,
    ) {
        let universe = self.managed_windows();

        let visible = {
            let client_map = &self.client_map;

            // Class and instance names act as implicit tags for tags
            // nothing is explicitly tagged with (ICCCM §4.1.2.5).
            let implicit = |name: &str| -> HashSet<Window> {
                client_map
                    .values()
                    .filter(|client| client.instance() == name || client.class() == name)
                    .map(|client| client.window())
                    .collect()
            };

            self.tag_engine
                .evaluate(&expr, &universe, self.tagset_stack.top(), &implicit)
        };

        info!(
            "switching tagset to {:?} ({} of {} clients visible)",
            expr.unparse(),
            visible.len(),
            universe.len()
        );

        for &window in &universe {
            if visible.contains(&window) {
                self.deiconify_window(window);
            } else {
                self.iconify_window_for_tagset(window);
            }
        }

        self.tagset_stack.push(visible);
        self.last_expression = Some(expr);
        self.ensure_focus(time);
    }

    fn iconify_window_for_tagset(
        &mut self,
        window: Window,
    ) {
        if let Some(client) = self.client_map.get(&window) {
            if client.wm_state() == IcccmWindowState::Normal {
                client.set_wm_state(IcccmWindowState::Iconic);
                client.expect_unmap();
                client.set_mapped(Toggle::Off);

                self.conn
                    .set_icccm_window_state(window, IcccmWindowState::Iconic);
                self.conn.unmap_window(client.frame());
                self.conn.unmap_window(window);
            }
        }
    }

    fn handle_tagset_request(
        &mut self,
        time: Timestamp,
    ) {
        let spec = match self.conn.get_tagset_expression() {
            Some(spec) => spec,
            None => return,
        };

        match parse_tagset(&spec) {
            Ok(expr) => self.apply_tagset(expr, if time == 0 {
                self.timestamp()
            } else {
                time
            }),
            Err(err) => warn!("ignoring invalid tagset expression {:?}: {}", spec, err),
        }
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    pub fn run(
        &mut self,
        mut key_bindings: KeyBindings,
        mut mouse_bindings: MouseBindings,
    ) {
        while self.running {
            if let Some(event) = self.conn.step() {
                trace!("received event: {:?}", event);

                if !self.dispatch_modal(&event) {
                    self.dispatch(event, &mut key_bindings, &mut mouse_bindings);
                }
            }

            self.conn.flush();
        }
    }

    fn dispatch(
        &mut self,
        event: Event,
        key_bindings: &mut KeyBindings,
        mouse_bindings: &mut MouseBindings,
    ) {
        match event {
            Event::Mouse {
                event,
                on_root,
            } => self.handle_mouse(event, on_root, mouse_bindings),
            Event::Key {
                event,
            } => self.handle_key(event, key_bindings),
            Event::MapRequest {
                window,
                ignore,
            } => self.handle_map_request(window, ignore),
            Event::Map {
                ..
            } => {},
            Event::Enter {
                window,
                normal,
                inferior,
                on_root,
                time,
                ..
            } => self.handle_enter(window, normal, inferior, on_root, time),
            Event::Leave {
                ..
            } => {},
            Event::Destroy {
                window,
            } => self.handle_destroy(window),
            Event::Expose {
                window,
            } => self.handle_expose(window),
            Event::Unmap {
                window,
                synthetic,
            } => self.handle_unmap(window, synthetic),
            Event::Configure {
                window,
                region,
                on_root,
            } => self.handle_configure(window, region, on_root),
            Event::PlacementRequest {
                window,
                pos,
                dim,
                on_root,
            } => self.handle_placement_request(window, pos, dim, on_root),
            Event::RestackRequest {
                window,
                sibling,
                mode,
            } => self.handle_restack_request(window, sibling, mode),
            Event::StateRequest {
                window,
                state,
                action,
                ..
            } => self.handle_state_request(window, state, action),
            Event::ChangeStateRequest {
                window,
                state,
            } => self.handle_change_state_request(window, state),
            Event::FocusRequest {
                window,
                ..
            } => self.handle_focus_request(window),
            Event::CloseRequest {
                window,
                ..
            } => {
                self.conn.close_window(window, self.timestamp());
            },
            Event::Property {
                window,
                kind,
                deleted,
                on_root,
                time,
            } => self.handle_property(window, kind, deleted, on_root, time),
            Event::TagsetRequest {
                time,
            } => self.handle_tagset_request(time),
            Event::ExitRequest {
                time,
            } => self.handle_exit_request(time),
            Event::FrameExtentsRequest {
                window,
            } => {
                self.conn
                    .set_window_frame_extents(window, defaults::FRAME_EXTENTS);
            },
            Event::Mapping {
                ..
            } => {
                self.conn
                    .grab_bindings(&key_bindings.inputs(), &mouse_bindings.inputs());
            },
            Event::ScreenChange => self.handle_screen_change(),
        }
    }

    /// Give the top of the modal stack the first shot at an event.
    /// Returns true if the event was consumed.
    fn dispatch_modal(
        &mut self,
        event: &Event,
    ) -> bool {
        let modal = match self.modals.pop() {
            Some(modal) => modal,
            None => return false,
        };

        match modal {
            Modal::MoveResize(op) => self.modal_moveresize(op, event),
            Modal::Minibuffer(minibuffer) => self.modal_minibuffer(minibuffer, event),
            Modal::FocusCycle(cycle) => self.modal_focus_cycle(cycle, event),
            Modal::Prefix {
                path,
                started,
            } => self.modal_prefix(path, started, event),
        }
    }

    fn modal_moveresize(
        &mut self,
        op: MoveResize,
        event: &Event,
    ) -> bool {
        match event {
            Event::Mouse {
                event:
                    MouseEvent {
                        kind: MouseEventKind::Motion,
                        root_rpos,
                        time,
                        ..
                    },
                ..
            } => {
                self.note_timestamp(*time);
                let modal = self.moveresize_motion(op, *root_rpos);
                self.modals.push(modal);
                true
            },
            Event::Mouse {
                event:
                    MouseEvent {
                        kind: MouseEventKind::Release,
                        time,
                        ..
                    },
                ..
            } => {
                self.note_timestamp(*time);
                self.moveresize_finish(&op, false, *time);
                true
            },
            Event::Key {
                event,
            } if !event.is_release => {
                self.note_timestamp(event.time);

                match event.input.key {
                    Key::Escape => {
                        self.moveresize_finish(&op, true, event.time);
                    },
                    Key::Space => {
                        let mut op = op;
                        let current = self
                            .client(op.window())
                            .map_or(op.original(), |client| client.frame_region());

                        op.cycle_grip(self.conn.get_pointer_position(), current);
                        self.conn.change_grab_cursor(Some(op.grip()), event.time);
                        self.modals.push(Modal::MoveResize(op));
                    },
                    _ => self.modals.push(Modal::MoveResize(op)),
                }

                true
            },
            Event::Destroy {
                window,
            } if self.client_window(*window) == Some(op.window()) => {
                self.moveresize_finish(&op, true, self.timestamp());
                false
            },
            _ => {
                self.modals.push(Modal::MoveResize(op));
                false
            },
        }
    }

    fn modal_minibuffer(
        &mut self,
        mut minibuffer: Minibuffer,
        event: &Event,
    ) -> bool {
        match event {
            Event::Key {
                event,
            } if !event.is_release => {
                self.note_timestamp(event.time);

                match edit_op(&event.input) {
                    EditOp::Commit => self.minibuffer_finish(minibuffer, true, event.time),
                    EditOp::Rollback => self.minibuffer_finish(minibuffer, false, event.time),
                    EditOp::Yank => {
                        if let Some(selection) = self.conn.primary_selection() {
                            minibuffer.buffer.insert_str(&selection);
                        }

                        self.draw_minibuffer(&minibuffer);
                        self.modals.push(Modal::Minibuffer(minibuffer));
                    },
                    op => {
                        minibuffer.apply(op);
                        self.draw_minibuffer(&minibuffer);
                        self.modals.push(Modal::Minibuffer(minibuffer));
                    },
                }

                true
            },
            Event::Key {
                ..
            } => {
                self.modals.push(Modal::Minibuffer(minibuffer));
                true
            },
            Event::Expose {
                window,
            } if *window == minibuffer.window() => {
                self.draw_minibuffer(&minibuffer);
                self.modals.push(Modal::Minibuffer(minibuffer));
                true
            },
            _ => {
                self.modals.push(Modal::Minibuffer(minibuffer));
                false
            },
        }
    }

    fn modal_focus_cycle(
        &mut self,
        mut cycle: FocusCycle,
        event: &Event,
    ) -> bool {
        match event {
            Event::Key {
                event,
            } if !event.is_release => {
                self.note_timestamp(event.time);

                match event.input.key {
                    Key::Tab | Key::Right | Key::Down => {
                        let dir = if event.input.modifiers.contains(&Modifier::Shift) {
                            Direction::Backward
                        } else {
                            Direction::Forward
                        };

                        self.cycle_step(&mut cycle, dir);
                        self.modals.push(Modal::FocusCycle(cycle));
                    },
                    Key::Left | Key::Up => {
                        self.cycle_step(&mut cycle, Direction::Backward);
                        self.modals.push(Modal::FocusCycle(cycle));
                    },
                    Key::Escape => self.cycle_finish(cycle, true, event.time),
                    Key::Return => self.cycle_finish(cycle, false, event.time),
                    Key::R => {
                        if let Some(client) =
                            cycle.candidates.active_element().and_then(|&w| self.client(w))
                        {
                            self.conn.stack_window_above(client.frame(), None);
                        }

                        self.modals.push(Modal::FocusCycle(cycle));
                    },
                    Key::L => {
                        if let Some(client) =
                            cycle.candidates.active_element().and_then(|&w| self.client(w))
                        {
                            self.conn.stack_window_below(client.frame(), None);
                        }

                        self.modals.push(Modal::FocusCycle(cycle));
                    },
                    Key::W => {
                        if let Some(client) =
                            cycle.candidates.active_element().and_then(|&w| self.client(w))
                        {
                            self.conn.warp_pointer_center_of_window(client.frame());
                        }

                        self.modals.push(Modal::FocusCycle(cycle));
                    },
                    _ => self.modals.push(Modal::FocusCycle(cycle)),
                }

                true
            },
            Event::Key {
                event,
            } => {
                self.note_timestamp(event.time);

                // Committing release: the last held cycle modifier went up.
                let released = event.input.key.modifier();
                let remaining: HashSet<Modifier> = event
                    .input
                    .modifiers
                    .iter()
                    .filter(|&&modifier| Some(modifier) != released)
                    .copied()
                    .collect();

                if released.map_or(false, |modifier| cycle.cycle_modifiers.contains(&modifier))
                    && remaining.is_disjoint(&cycle.cycle_modifiers)
                {
                    self.cycle_finish(cycle, false, event.time);
                } else {
                    self.modals.push(Modal::FocusCycle(cycle));
                }

                true
            },
            Event::Expose {
                window,
            } if *window == cycle.strip => {
                self.cycle_render(&cycle);
                self.modals.push(Modal::FocusCycle(cycle));
                true
            },
            _ => {
                self.modals.push(Modal::FocusCycle(cycle));
                false
            },
        }
    }

    fn modal_prefix(
        &mut self,
        path: Vec<KeyInput>,
        started: Instant,
        _event: &Event,
    ) -> bool {
        if started.elapsed() > Duration::from_secs(defaults::PREFIX_TIMEOUT_SECS) {
            debug!("prefix chain timed out");
            self.conn.ungrab_keyboard(self.timestamp());
            return false;
        }

        // Chord resolution happens in handle_key against the stored
        // path; hand the event onward with the chain preserved.
        self.modals.push(Modal::Prefix {
            path,
            started,
        });
        false
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    fn handle_mouse(
        &mut self,
        event: MouseEvent,
        on_root: bool,
        mouse_bindings: &mut MouseBindings,
    ) {
        self.note_timestamp(event.time);

        if event.kind != MouseEventKind::Press {
            return;
        }

        let target = event.window.and_then(|window| self.client_window(window));

        // A press on an unfocused frame may sit on the focus policy's
        // synchronous grab; the pointer stays frozen until allowed.
        let on_focus_grab = !on_root
            && self.focus_policy.grabs_focus_clicks()
            && target.map_or(false, |window| self.focus.get() != Some(window));

        if let Some(action) = mouse_bindings.resolve(&event.input) {
            if on_focus_grab {
                self.conn.allow_pointer(event.time);
            }

            action(self, target);
            return;
        }

        if on_focus_grab {
            if let Some(window) = target {
                match self.focus_policy.on_focus_click() {
                    ClickAction::FocusAndReplay => {
                        self.conn.replay_pointer(event.time);
                        self.focus_window(window, event.time);
                    },
                    ClickAction::FocusAndSwallow => {
                        self.conn.allow_pointer(event.time);
                        self.focus_window(window, event.time);
                    },
                    ClickAction::Ignore => self.conn.allow_pointer(event.time),
                }
            }
        }
    }

    fn handle_key(
        &mut self,
        event: KeyEvent,
        key_bindings: &mut KeyBindings,
    ) {
        if event.is_release || event.input.key.is_modifier() {
            return;
        }

        self.note_timestamp(event.time);
        self.last_key_event = Some(event.clone());

        let path: Vec<KeyInput> = match self.modals.last() {
            Some(Modal::Prefix {
                path,
                ..
            }) => path.clone(),
            _ => Vec::new(),
        };

        let in_prefix = !path.is_empty();

        match key_bindings.resolve(&path, &event.input) {
            Resolution::Action(action) => {
                if in_prefix {
                    self.end_prefix(event.time);
                }

                action(self);
            },
            Resolution::Prefix => {
                let mut path = path;
                path.push(event.input.clone());

                if in_prefix {
                    self.modals.pop();
                } else {
                    self.conn.grab_keyboard(event.time);
                }

                self.modals.push(Modal::Prefix {
                    path,
                    started: Instant::now(),
                });
            },
            Resolution::NoMatch => {
                if in_prefix {
                    debug!("aborting prefix chain on unbound chord");
                    self.end_prefix(event.time);
                }
            },
        }
    }

    fn end_prefix(
        &mut self,
        time: Timestamp,
    ) {
        if matches!(self.modals.last(), Some(Modal::Prefix { .. })) {
            self.modals.pop();
            self.conn.ungrab_keyboard(time);
        }
    }

    fn handle_map_request(
        &mut self,
        window: Window,
        ignore: bool,
    ) {
        debug!("MAP_REQUEST for window {:#0x}", window);

        if self.client_map.contains_key(&window) {
            self.deiconify_window(window);
            return;
        }

        self.manage(window, ignore);
    }

    fn handle_enter(
        &mut self,
        window: Window,
        normal: bool,
        inferior: bool,
        on_root: bool,
        time: Timestamp,
    ) {
        self.note_timestamp(time);

        // Entering the root never steals focus from the last client.
        if on_root {
            return;
        }

        if let Some(window) = self.client_window(window) {
            if self.focus.get() != Some(window)
                && self.focus_policy.focus_on_enter(normal, inferior)
            {
                self.focus_window(window, time);
            }
        }
    }

    fn handle_destroy(
        &mut self,
        window: Window,
    ) {
        debug!("DESTROY for window {:#0x}", window);

        self.unmanaged_windows.remove(&window);

        if let Some(window) = self.client_window(window) {
            self.unmanage(window, true);
        }
    }

    fn handle_expose(
        &self,
        window: Window,
    ) {
        if let Some(&client_window) = self.frame_map.get(&window) {
            if let Some(client) = self.client_map.get(&client_window) {
                self.render_decoration(client, self.focus.get() == Some(client_window));
            }
        }
    }

    fn handle_unmap(
        &mut self,
        window: Window,
        synthetic: bool,
    ) {
        debug!("UNMAP for window {:#0x}", window);

        if self.unmanaged_windows.contains(&window) {
            return;
        }

        if let Some(client) = self.client_map.get(&window) {
            // Manager-initiated unmaps (iconify, tagset switch) are
            // expected and not withdrawals.
            if !synthetic && client.consume_unmap_if_expecting() {
                return;
            }

            client.set_wm_state(IcccmWindowState::Withdrawn);
            self.unmanage(window, false);
        }
    }

    fn handle_configure(
        &mut self,
        _window: Window,
        _region: Region,
        on_root: bool,
    ) {
        // The root geometry changes under RandR reconfiguration.
        if on_root {
            self.handle_screen_change();
        }
    }

    fn handle_placement_request(
        &mut self,
        window: Window,
        pos: Option<Pos>,
        dim: Option<Dim>,
        _on_root: bool,
    ) {
        debug!(
            "PLACEMENT_REQUEST for window {:#0x} with pos {:?} and dim {:?}",
            window, pos, dim
        );

        let client = match self.client(window) {
            Some(client) => client,
            None => {
                // Grant unmanaged windows their request verbatim.
                if let (Some(pos), Some(dim)) = (pos, dim) {
                    self.conn.place_window(window, &Region {
                        pos,
                        dim,
                    });
                } else if let Some(pos) = pos {
                    self.conn.move_window(window, pos);
                } else if let Some(dim) = dim {
                    self.conn.resize_window(window, dim);
                }

                return;
            },
        };

        let extents = client.frame_extents();
        let mut frame_region = client.frame_region();

        // Requested coordinates name the frame's root position.
        if let Some(pos) = pos {
            if !client.is_fullscreen() {
                if !client.is_maximized_horz() {
                    frame_region.pos.x = pos.x;
                }

                if !client.is_maximized_vert() {
                    frame_region.pos.y = pos.y;
                }
            }
        }

        if let Some(dim) = dim {
            let mut dim = dim;

            if let Some(size_hints) = client.size_hints() {
                size_hints.apply(&mut dim);
            }

            // Suppress resizes along constrained axes.
            if !client.is_fullscreen() {
                if !client.is_maximized_horz() {
                    frame_region.dim.w = dim.w + extents.left + extents.right;
                }

                if !client.is_maximized_vert() {
                    frame_region.dim.h = dim.h + extents.top + extents.bottom;
                }
            }
        }

        client.set_frame_region(frame_region);
        self.place_client(client);
    }

    fn handle_restack_request(
        &mut self,
        window: Window,
        sibling: Option<Window>,
        mode: StackMode,
    ) {
        let target = self
            .client(window)
            .map_or(window, |client| client.frame());

        match mode {
            StackMode::Above => self.conn.stack_window_above(target, sibling),
            StackMode::Below => self.conn.stack_window_below(target, sibling),
        }
    }

    fn handle_state_request(
        &mut self,
        window: Window,
        state: WindowState,
        action: ToggleAction,
    ) {
        let window = match self.client_window(window) {
            Some(window) => window,
            None => return,
        };

        debug!(
            "STATE_REQUEST for window {:#0x}, with state {:?} and action {:?}",
            window, state, action
        );

        let toggle = match action {
            ToggleAction::Add => Toggle::On,
            ToggleAction::Remove => Toggle::Off,
            ToggleAction::Toggle => Toggle::Reverse,
        };

        match state {
            WindowState::Fullscreen => self.set_fullscreen_window(window, toggle),
            WindowState::MaximizedHorz => {
                self.set_maximize_window(window, WindowState::MaximizedHorz, toggle)
            },
            WindowState::MaximizedVert => {
                self.set_maximize_window(window, WindowState::MaximizedVert, toggle)
            },
            WindowState::Above => {
                if let Some(client) = self.client(window) {
                    client.set_above(toggle);

                    if client.is_above() {
                        self.conn.stack_window_above(client.frame(), None);
                    }

                    self.conn
                        .set_window_state(window, WindowState::Above, client.is_above());
                }
            },
            WindowState::Hidden => {
                if toggle.eval(false) {
                    self.iconify_window(window);
                }
            },
            WindowState::DemandsAttention => {
                if let Some(client) = self.client(window) {
                    client.set_urgent(toggle);
                    self.render_decoration(client, self.focus.get() == Some(window));
                }
            },
            WindowState::Below => {
                if let Some(client) = self.client(window) {
                    self.conn.stack_window_below(client.frame(), None);
                }
            },
        }
    }

    fn handle_change_state_request(
        &mut self,
        window: Window,
        state: IcccmWindowState,
    ) {
        debug!("WM_CHANGE_STATE for window {:#0x} to {:?}", window, state);

        if state == IcccmWindowState::Iconic {
            self.iconify_window(window);
        }
    }

    fn handle_focus_request(
        &mut self,
        window: Window,
    ) {
        self.focus_window(window, self.timestamp());
    }

    fn handle_property(
        &mut self,
        window: Window,
        kind: PropertyKind,
        deleted: bool,
        on_root: bool,
        time: Timestamp,
    ) {
        self.note_timestamp(time);

        if on_root {
            if kind == PropertyKind::Command {
                self.wm_command_time.set(time);
            }

            return;
        }

        match kind {
            PropertyKind::Name => {
                if let Some(client) = self.client(window) {
                    if let Some(PropertyValue::String(name)) =
                        self.conn.get_window_property(window, kind)
                    {
                        client.set_name(name);
                        self.render_decoration(client, self.focus.get() == Some(window));
                    }
                }
            },
            PropertyKind::Class => {
                if let Some(client) = self.client(window) {
                    let (instance, class) = self.conn.get_icccm_window_class(window);

                    client.set_instance(instance);
                    client.set_class(class);
                }
            },
            PropertyKind::SizeHints => {
                if let Some(client) = self.client(window) {
                    let size_hints = self
                        .conn
                        .get_icccm_window_size_hints(window, Some(defaults::MIN_CLIENT_DIM));

                    client.set_size_hints(size_hints);
                }
            },
            PropertyKind::Hints => {
                if let Some(client) = self.client(window) {
                    if let Some(hints) = self.conn.get_icccm_window_hints(window) {
                        client.set_accepts_input(hints.input.unwrap_or(true));
                        client.set_urgent(Toggle::from(hints.urgent));
                        self.render_decoration(client, self.focus.get() == Some(window));
                    }
                }
            },
            PropertyKind::Protocols => {
                if let Some(client) = self.client(window) {
                    client.set_takes_focus(
                        self.conn.window_has_protocol(window, Protocol::TakeFocus),
                    );
                }
            },
            PropertyKind::Transient => {},
            PropertyKind::Tags => {
                if self.client_map.contains_key(&window) {
                    if deleted {
                        self.tag_engine.forget_tags(window);

                        if let Some(client) = self.client_map.get(&window) {
                            client.set_tags(Vec::new());
                        }
                    } else {
                        self.note_client_tags(window);
                    }
                }
            },
            PropertyKind::TagsetExpression | PropertyKind::Command => {},
        }
    }

    fn handle_exit_request(
        &mut self,
        time: Timestamp,
    ) {
        debug!("received exit message with timestamp {}", time);

        if time != 0 && self.wm_command_time.get() != 0 && self.wm_command_time.get() <= time {
            let argv = self.conn.get_wm_command();

            if !argv.is_empty() {
                info!("exit message carries command {:?}", argv);
                self.exec_argv = Some(argv);
            }
        }

        self.exit();
    }

    fn handle_screen_change(&mut self) {
        self.screen = self.conn.update_outputs();
        info!("screen change: {:?}", self.screen);
    }

    fn abort_modal_for(
        &mut self,
        window: Window,
    ) {
        let aborts = match self.modals.last() {
            Some(Modal::MoveResize(op)) => op.window() == window,
            Some(Modal::Minibuffer(minibuffer)) => match minibuffer.target {
                InputTarget::Titlebar(frame) => self.frame_map.get(&frame) == Some(&window),
                InputTarget::Popup(_) => false,
            },
            _ => false,
        };

        if aborts {
            match self.modals.pop() {
                Some(Modal::MoveResize(op)) => {
                    self.redraw_guidelines(op.guidelines(), &[]);
                    self.conn.ungrab_pointer(self.timestamp());
                    self.conn.ungrab_keyboard(self.timestamp());
                },
                Some(Modal::Minibuffer(_)) => {
                    self.conn.ungrab_keyboard(self.timestamp());
                },
                _ => {},
            }
        }
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Unwind to a bare X session: reparent clients back to root at
    /// their absolute positions, drop them from the save-set, destroy
    /// frames, disconnect. Safe to call more than once and from a
    /// half-initialized state.
    pub fn exit(&mut self) {
        if !self.running {
            return;
        }

        info!("shutting down {}", WM_NAME!());
        self.running = false;

        for modal in std::mem::take(&mut self.modals) {
            match modal {
                Modal::MoveResize(op) => self.redraw_guidelines(op.guidelines(), &[]),
                Modal::Minibuffer(minibuffer) => {
                    if let InputTarget::Popup(window) = minibuffer.target {
                        self.conn.destroy_window(window);
                    }
                },
                Modal::FocusCycle(cycle) => self.conn.destroy_window(cycle.strip),
                Modal::Prefix {
                    ..
                } => {},
            }
        }

        let windows: Vec<Window> = self.client_map.keys().copied().collect();

        for window in windows {
            if let Some(client) = self.client_map.remove(&window) {
                self.deiconify_window_raw(&client);
                self.conn
                    .set_window_border_width(window, client.saved_border_width());
                self.conn
                    .unparent_window(window, client.inner_region().pos);
                self.conn.remove_window_from_save_set(window);
                self.conn.destroy_window(client.frame());
            }
        }

        self.frame_map.clear();
        self.window_map.clear();

        self.conn.cleanup();
        self.conn.flush();
    }

    fn deiconify_window_raw(
        &self,
        client: &Client,
    ) {
        if client.wm_state() == IcccmWindowState::Iconic {
            self.conn.map_window(client.window());
            self.conn
                .set_icccm_window_state(client.window(), IcccmWindowState::Normal);
        }
    }
}
