use crate::connection::Connection;
use crate::event::Event;
use crate::event::PropertyKind;
use crate::event::ToggleAction;
use crate::geometry::Axis;
use crate::geometry::Dim;
use crate::geometry::Extents;
use crate::geometry::Grip;
use crate::geometry::Corner;
use crate::geometry::Edge;
use crate::geometry::Pos;
use crate::geometry::Region;
use crate::hints::Hints;
use crate::hints::SizeHints;
use crate::input::Button;
use crate::input::KeyEvent;
use crate::input::KeyInput;
use crate::input::Modifier;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::input::MouseInput;
use crate::properties::decode_string_list;
use crate::properties::encode_string_list;
use crate::properties::PropertyValue;
use crate::screen::Screen;
use crate::window::Atom;
use crate::window::IcccmWindowState;
use crate::window::Protocol;
use crate::window::StackMode;
use crate::window::Timestamp;
use crate::window::Window;
use crate::window::WindowState;
use crate::xdata::atom::AtomCache;
use crate::xdata::keys;
use crate::Result;

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::convert::TryFrom;

use x11rb::connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::errors::ReplyError;
use x11rb::properties;
use x11rb::protocol::randr;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto;
use x11rb::protocol::xproto::ConnectionExt;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::xproto::ModMask;
use x11rb::protocol::xproto::CLIENT_MESSAGE_EVENT;
use x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT;
use x11rb::protocol::ErrorKind;
use x11rb::protocol::Event as XEvent;
use x11rb::resource_manager::new_from_default;
use x11rb::wrapper::ConnectionExt as _;

use anyhow::anyhow;
use log::debug;
use log::warn;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        Any,
        ATOM,
        CARDINAL,
        WINDOW,
        STRING,
        UTF8_STRING,

        // ICCCM client properties
        WM_NAME,
        WM_CLASS,
        WM_COMMAND,
        WM_PROTOCOLS,
        WM_NORMAL_HINTS,
        WM_HINTS,
        WM_DELETE_WINDOW,
        WM_TRANSIENT_FOR,
        WM_TAKE_FOCUS,
        WM_CHANGE_STATE,

        // ICCCM window manager properties
        WM_STATE,

        // EWMH root properties and messages
        _NET_SUPPORTED,
        _NET_CLIENT_LIST,
        _NET_ACTIVE_WINDOW,
        _NET_SUPPORTING_WM_CHECK,
        _NET_CLOSE_WINDOW,
        _NET_REQUEST_FRAME_EXTENTS,

        // EWMH application properties
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_FRAME_EXTENTS,

        // EWMH window states
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_BELOW,
        _NET_WM_STATE_HIDDEN,
        _NET_WM_STATE_DEMANDS_ATTENTION,

        // Private protocol
        _DIM_TAGS,
        _DIM_WM_EXIT,
        _DIM_TAGSET_EXPRESSION,
        _DIM_TAGSET_UPDATE,
    }
}

pub struct XConnection<'conn, Conn: connection::Connection> {
    conn: &'conn Conn,
    atoms: Atoms,
    atom_cache: AtomCache<'conn, Conn>,
    screen: xproto::Screen,
    screen_num: usize,
    check_window: Window,
    fill_gc: xproto::Gcontext,
    text_gc: xproto::Gcontext,
    xor_gc: xproto::Gcontext,
    font: xproto::Font,
    font_height: i32,
    state_map: HashMap<Atom, WindowState>,
    cursors: HashMap<&'static str, xproto::Cursor>,
    events: RefCell<VecDeque<Event>>,
    randr: bool,
    root_event_mask: EventMask,
    window_event_mask: EventMask,
    frame_event_mask: EventMask,
    popup_event_mask: EventMask,
    last_timestamp: Cell<Timestamp>,
}

impl<'conn, Conn: connection::Connection> XConnection<'conn, Conn> {
    pub fn new(
        conn: &'conn Conn,
        screen_num: usize,
        font_name: &str,
    ) -> Result<Self> {
        let screen = conn.setup().roots[screen_num].clone();
        let root = screen.root;

        let root_event_mask: EventMask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE;

        let aux = xproto::ChangeWindowAttributesAux::default().event_mask(root_event_mask);

        let res = conn.change_window_attributes(root, &aux)?.check();
        if let Err(ReplyError::X11Error(err)) = res {
            if err.error_kind == ErrorKind::Access {
                return Err(anyhow!(
                    "another window manager is already running on screen {}",
                    screen_num
                ));
            } else {
                return Err(anyhow!("unable to select for SubstructureRedirect"));
            }
        }

        let atoms = Atoms::new(conn)?.reply()?;
        let atom_cache = AtomCache::new(conn);

        let state_map: HashMap<Atom, WindowState> = map!(
            atoms._NET_WM_STATE_FULLSCREEN => WindowState::Fullscreen,
            atoms._NET_WM_STATE_MAXIMIZED_VERT => WindowState::MaximizedVert,
            atoms._NET_WM_STATE_MAXIMIZED_HORZ => WindowState::MaximizedHorz,
            atoms._NET_WM_STATE_ABOVE => WindowState::Above,
            atoms._NET_WM_STATE_BELOW => WindowState::Below,
            atoms._NET_WM_STATE_HIDDEN => WindowState::Hidden,
            atoms._NET_WM_STATE_DEMANDS_ATTENTION => WindowState::DemandsAttention,
        );

        let check_window = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            check_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::default().override_redirect(1),
        )?;
        conn.map_window(check_window)?;

        let randr = conn
            .randr_query_version(1, 2)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some();

        if randr {
            randr::select_input(
                conn,
                root,
                randr::NotifyMask::CRTC_CHANGE | randr::NotifyMask::SCREEN_CHANGE,
            )?;
        }

        let font = conn.generate_id()?;
        if conn.open_font(font, font_name.as_bytes())?.check().is_err() {
            warn!("unable to load font {}, falling back to fixed", font_name);

            conn.open_font(font, b"fixed")?
                .check()
                .map_err(|_| anyhow!("unable to load fallback font fixed"))?;
        }

        let fill_gc = conn.generate_id()?;
        conn.create_gc(
            fill_gc,
            root,
            &xproto::CreateGCAux::default().foreground(screen.black_pixel),
        )?;

        let text_gc = conn.generate_id()?;
        conn.create_gc(
            text_gc,
            root,
            &xproto::CreateGCAux::default()
                .font(font)
                .foreground(screen.white_pixel)
                .background(screen.black_pixel),
        )?;

        let xor_gc = conn.generate_id()?;
        conn.create_gc(
            xor_gc,
            root,
            &xproto::CreateGCAux::default()
                .function(xproto::GX::XOR)
                .foreground(0x808080)
                .subwindow_mode(xproto::SubwindowMode::INCLUDE_INFERIORS)
                .graphics_exposures(0),
        )?;

        let mut cursors = HashMap::new();
        if let Ok(database) = new_from_default(conn) {
            if let Ok(cookie) = CursorHandle::new(conn, screen_num, &database) {
                if let Ok(handle) = cookie.reply() {
                    for name in &[
                        "left_ptr",
                        "fleur",
                        "top_side",
                        "bottom_side",
                        "left_side",
                        "right_side",
                        "top_left_corner",
                        "top_right_corner",
                        "bottom_left_corner",
                        "bottom_right_corner",
                    ] {
                        if let Ok(cursor) = handle.load_cursor(conn, name) {
                            cursors.insert(*name, cursor);
                        }
                    }
                }
            }
        }

        if let Some(&cursor) = cursors.get("left_ptr") {
            drop(conn.change_window_attributes(
                root,
                &xproto::ChangeWindowAttributesAux::default().cursor(cursor),
            ));
        }

        let window_event_mask: EventMask = EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::FOCUS_CHANGE;

        let frame_event_mask: EventMask = EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::ENTER_WINDOW
            | EventMask::BUTTON_PRESS
            | EventMask::BUTTON_RELEASE
            | EventMask::EXPOSURE;

        let popup_event_mask: EventMask = EventMask::KEY_PRESS
            | EventMask::KEY_RELEASE
            | EventMask::BUTTON_PRESS
            | EventMask::EXPOSURE;

        Ok(Self {
            conn,
            atoms,
            atom_cache,
            screen,
            screen_num,
            check_window,
            fill_gc,
            text_gc,
            xor_gc,
            font,
            font_height: 13,
            state_map,
            cursors,
            events: RefCell::new(VecDeque::with_capacity(32)),
            randr,
            root_event_mask,
            window_event_mask,
            frame_event_mask,
            popup_event_mask,
            last_timestamp: Cell::new(x11rb::CURRENT_TIME),
        })
    }

    #[inline]
    pub fn root(&self) -> Window {
        self.screen.root
    }

    #[inline]
    pub fn last_timestamp(&self) -> Timestamp {
        self.last_timestamp.get()
    }

    fn modifiers_from_state(
        &self,
        state: u16,
    ) -> HashSet<Modifier> {
        let mut modifiers = HashSet::new();

        if state & u16::from(ModMask::CONTROL) > 0 {
            modifiers.insert(Modifier::Ctrl);
        }

        if state & u16::from(ModMask::SHIFT) > 0 {
            modifiers.insert(Modifier::Shift);
        }

        if state & u16::from(ModMask::M1) > 0 {
            modifiers.insert(Modifier::Alt);
        }

        if state & u16::from(ModMask::M4) > 0 {
            modifiers.insert(Modifier::Super);
        }

        if state & u16::from(ModMask::M2) > 0 {
            modifiers.insert(Modifier::NumLock);
        }

        if state & u16::from(ModMask::LOCK) > 0 {
            modifiers.insert(Modifier::CapsLock);
        }

        if state & u16::from(ModMask::M5) > 0 {
            modifiers.insert(Modifier::ScrollLock);
        }

        modifiers
    }

    fn mask_from_modifiers(
        &self,
        modifiers: &HashSet<Modifier>,
    ) -> ModMask {
        modifiers
            .iter()
            .fold(ModMask::default(), |mask, modifier| {
                mask | match modifier {
                    Modifier::Ctrl => ModMask::CONTROL,
                    Modifier::Shift => ModMask::SHIFT,
                    Modifier::Alt => ModMask::M1,
                    Modifier::Super => ModMask::M4,
                    Modifier::NumLock => ModMask::M2,
                    Modifier::CapsLock => ModMask::LOCK,
                    Modifier::ScrollLock => ModMask::M5,
                }
            })
    }

    fn button_from_input(
        &self,
        button: Button,
    ) -> xproto::ButtonIndex {
        match button {
            Button::Left => xproto::ButtonIndex::M1,
            Button::Middle => xproto::ButtonIndex::M2,
            Button::Right => xproto::ButtonIndex::M3,
            Button::ScrollUp => xproto::ButtonIndex::M4,
            Button::ScrollDown => xproto::ButtonIndex::M5,
            Button::Backward | Button::Forward => xproto::ButtonIndex::ANY,
        }
    }

    fn grip_cursor(
        &self,
        grip: Option<Grip>,
    ) -> Option<xproto::Cursor> {
        let name = match grip {
            None => "fleur",
            Some(Grip::Edge(Edge::Top)) => "top_side",
            Some(Grip::Edge(Edge::Bottom)) => "bottom_side",
            Some(Grip::Edge(Edge::Left)) => "left_side",
            Some(Grip::Edge(Edge::Right)) => "right_side",
            Some(Grip::Corner(Corner::TopLeft)) => "top_left_corner",
            Some(Grip::Corner(Corner::TopRight)) => "top_right_corner",
            Some(Grip::Corner(Corner::BottomLeft)) => "bottom_left_corner",
            Some(Grip::Corner(Corner::BottomRight)) => "bottom_right_corner",
        };

        self.cursors.get(name).copied()
    }

    fn property_kind_from_atom(
        &self,
        atom: Atom,
    ) -> Option<PropertyKind> {
        match atom {
            atom if atom == self.atoms.WM_NAME || atom == self.atoms._NET_WM_NAME => {
                Some(PropertyKind::Name)
            },
            atom if atom == self.atoms.WM_CLASS => Some(PropertyKind::Class),
            atom if atom == self.atoms.WM_NORMAL_HINTS => Some(PropertyKind::SizeHints),
            atom if atom == self.atoms.WM_HINTS => Some(PropertyKind::Hints),
            atom if atom == self.atoms.WM_PROTOCOLS => Some(PropertyKind::Protocols),
            atom if atom == self.atoms.WM_TRANSIENT_FOR => Some(PropertyKind::Transient),
            atom if atom == self.atoms._DIM_TAGS => Some(PropertyKind::Tags),
            atom if atom == self.atoms._DIM_TAGSET_EXPRESSION => {
                Some(PropertyKind::TagsetExpression)
            },
            atom if atom == self.atoms.WM_COMMAND => Some(PropertyKind::Command),
            _ => None,
        }
    }

    fn get_atom_from_window_state(
        &self,
        state: WindowState,
    ) -> Atom {
        match state {
            WindowState::Fullscreen => self.atoms._NET_WM_STATE_FULLSCREEN,
            WindowState::MaximizedVert => self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
            WindowState::MaximizedHorz => self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
            WindowState::Above => self.atoms._NET_WM_STATE_ABOVE,
            WindowState::Below => self.atoms._NET_WM_STATE_BELOW,
            WindowState::Hidden => self.atoms._NET_WM_STATE_HIDDEN,
            WindowState::DemandsAttention => self.atoms._NET_WM_STATE_DEMANDS_ATTENTION,
        }
    }

    fn get_atom_list_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> Vec<Atom> {
        self.conn
            .get_property(false, window, property, type_, 0, std::u32::MAX)
            .map_or(Vec::new(), |cookie| {
                cookie.reply().map_or(Vec::new(), |reply| {
                    reply
                        .value32()
                        .map_or(Vec::new(), |values| values.collect())
                })
            })
    }

    fn get_string_property(
        &self,
        window: Window,
        property: Atom,
    ) -> Option<String> {
        self.conn
            .get_property(
                false,
                window,
                property,
                xproto::AtomEnum::ANY,
                0,
                std::u32::MAX,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .filter(|reply| reply.format == 8 && !reply.value.is_empty())
            .map(|reply| String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn send_client_message(
        &self,
        window: Window,
        destination: Window,
        type_: Atom,
        data: [u32; 5],
        event_mask: EventMask,
    ) {
        let event = xproto::ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_,
            data: data.into(),
        };

        drop(self.conn.send_event(false, destination, event_mask, event));
    }

    fn note_timestamp(
        &self,
        time: Timestamp,
    ) {
        if time != x11rb::CURRENT_TIME {
            self.last_timestamp.set(time);
        }
    }

    fn enqueue(
        &self,
        event: XEvent,
    ) {
        if let Some(event) = self.translate(event) {
            self.events.borrow_mut().push_back(event);
        }
    }

    /// Drop all but the last of a run of equivalent events: motion events
    /// on the same window, and property notifications for the same
    /// (window, property) pair.
    fn compress(&self) {
        let mut events = self.events.borrow_mut();
        let mut compressed: VecDeque<Event> = VecDeque::with_capacity(events.len());

        while let Some(event) = events.pop_front() {
            match &event {
                Event::Mouse {
                    event: MouseEvent {
                        kind: MouseEventKind::Motion,
                        window,
                        ..
                    },
                    ..
                } => {
                    let window = *window;

                    if let Some(Event::Mouse {
                        event: MouseEvent {
                            kind: MouseEventKind::Motion,
                            window: prev_window,
                            ..
                        },
                        ..
                    }) = compressed.back()
                    {
                        if *prev_window == window {
                            compressed.pop_back();
                        }
                    }
                },
                Event::Property {
                    window,
                    kind,
                    ..
                } => {
                    let (window, kind) = (*window, *kind);

                    if let Some(Event::Property {
                        window: prev_window,
                        kind: prev_kind,
                        ..
                    }) = compressed.back()
                    {
                        if *prev_window == window && *prev_kind == kind {
                            compressed.pop_back();
                        }
                    }
                },
                _ => {},
            }

            compressed.push_back(event);
        }

        *events = compressed;
    }

    fn translate(
        &self,
        event: XEvent,
    ) -> Option<Event> {
        match event {
            XEvent::ButtonPress(event) => self.on_button(event, MouseEventKind::Press),
            XEvent::ButtonRelease(event) => self.on_button(event, MouseEventKind::Release),
            XEvent::MotionNotify(event) => self.on_motion_notify(event),
            XEvent::KeyPress(event) => self.on_key(event, false),
            XEvent::KeyRelease(event) => self.on_key(event, true),
            XEvent::MapRequest(event) => self.on_map_request(event),
            XEvent::MapNotify(event) => self.on_map_notify(event),
            XEvent::UnmapNotify(event) => self.on_unmap_notify(event),
            XEvent::DestroyNotify(event) => Some(Event::Destroy {
                window: event.window,
            }),
            XEvent::EnterNotify(event) => self.on_enter_notify(event),
            XEvent::LeaveNotify(event) => self.on_leave_notify(event),
            XEvent::Expose(event) => {
                if event.count == 0 {
                    Some(Event::Expose {
                        window: event.window,
                    })
                } else {
                    None
                }
            },
            XEvent::ConfigureNotify(event) => Some(Event::Configure {
                window: event.window,
                region: Region::new(
                    event.x as i32,
                    event.y as i32,
                    event.width as i32,
                    event.height as i32,
                ),
                on_root: event.window == self.screen.root,
            }),
            XEvent::ConfigureRequest(event) => self.on_configure_request(event),
            XEvent::CirculateRequest(event) => Some(Event::RestackRequest {
                window: event.window,
                sibling: None,
                mode: if event.place == xproto::Place::ON_TOP {
                    StackMode::Above
                } else {
                    StackMode::Below
                },
            }),
            XEvent::PropertyNotify(event) => self.on_property_notify(event),
            XEvent::ClientMessage(event) => self.on_client_message(event),
            XEvent::MappingNotify(event) => Some(Event::Mapping {
                request: event.request.into(),
            }),
            XEvent::RandrNotify(_) | XEvent::RandrScreenChangeNotify(_) => {
                Some(Event::ScreenChange)
            },
            XEvent::Error(err) => {
                debug!("X error: {:?}", err);
                None
            },
            _ => None,
        }
    }

    fn on_button(
        &self,
        event: xproto::ButtonPressEvent,
        kind: MouseEventKind,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        let on_root = event.event == self.screen.root;
        let window = if on_root {
            if event.child == x11rb::NONE {
                None
            } else {
                Some(event.child)
            }
        } else {
            Some(event.event)
        };

        Some(Event::Mouse {
            event: MouseEvent {
                kind,
                input: MouseInput {
                    button: Button::try_from(event.detail).ok()?,
                    modifiers: self.modifiers_from_state(event.state.into()),
                },
                window,
                root_rpos: Pos {
                    x: event.root_x as i32,
                    y: event.root_y as i32,
                },
                time: event.time,
            },
            on_root: on_root && event.child == x11rb::NONE,
        })
    }

    fn on_motion_notify(
        &self,
        event: xproto::MotionNotifyEvent,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        Some(Event::Mouse {
            event: MouseEvent {
                kind: MouseEventKind::Motion,
                input: MouseInput {
                    button: Button::Left,
                    modifiers: self.modifiers_from_state(event.state.into()),
                },
                window: if event.event == self.screen.root {
                    None
                } else {
                    Some(event.event)
                },
                root_rpos: Pos {
                    x: event.root_x as i32,
                    y: event.root_y as i32,
                },
                time: event.time,
            },
            on_root: event.event == self.screen.root,
        })
    }

    fn on_key(
        &self,
        event: xproto::KeyPressEvent,
        is_release: bool,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        Some(Event::Key {
            event: KeyEvent {
                input: KeyInput {
                    key: keys::key_from_code(event.detail),
                    modifiers: self.modifiers_from_state(event.state.into()),
                },
                window: if event.event == self.screen.root {
                    None
                } else {
                    Some(event.event)
                },
                is_release,
                time: event.time,
            },
        })
    }

    fn on_map_request(
        &self,
        event: xproto::MapRequestEvent,
    ) -> Option<Event> {
        Some(Event::MapRequest {
            window: event.window,
            ignore: !self.must_manage_window(event.window),
        })
    }

    fn on_map_notify(
        &self,
        event: xproto::MapNotifyEvent,
    ) -> Option<Event> {
        Some(Event::Map {
            window: event.window,
            ignore: event.override_redirect,
        })
    }

    fn on_unmap_notify(
        &self,
        event: xproto::UnmapNotifyEvent,
    ) -> Option<Event> {
        if event.from_configure || event.window != event.event {
            return None;
        }

        Some(Event::Unmap {
            window: event.window,
            synthetic: event.response_type & 0x80 != 0,
        })
    }

    fn on_enter_notify(
        &self,
        event: xproto::EnterNotifyEvent,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        Some(Event::Enter {
            window: event.event,
            root_rpos: Pos {
                x: event.root_x as i32,
                y: event.root_y as i32,
            },
            normal: event.mode == xproto::NotifyMode::NORMAL,
            inferior: event.detail == xproto::NotifyDetail::INFERIOR,
            on_root: event.event == self.screen.root,
            time: event.time,
        })
    }

    fn on_leave_notify(
        &self,
        event: xproto::LeaveNotifyEvent,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        Some(Event::Leave {
            window: event.event,
            root_rpos: Pos {
                x: event.root_x as i32,
                y: event.root_y as i32,
            },
            time: event.time,
        })
    }

    fn on_configure_request(
        &self,
        event: xproto::ConfigureRequestEvent,
    ) -> Option<Event> {
        let mask = event.value_mask;

        let pos = if mask.contains(xproto::ConfigWindow::X) || mask.contains(xproto::ConfigWindow::Y)
        {
            Some(Pos {
                x: event.x as i32,
                y: event.y as i32,
            })
        } else {
            None
        };

        let dim = if mask.contains(xproto::ConfigWindow::WIDTH)
            || mask.contains(xproto::ConfigWindow::HEIGHT)
        {
            Some(Dim {
                w: event.width as i32,
                h: event.height as i32,
            })
        } else {
            None
        };

        if pos.is_none() && dim.is_none() && mask.contains(xproto::ConfigWindow::STACK_MODE) {
            return Some(Event::RestackRequest {
                window: event.window,
                sibling: if mask.contains(xproto::ConfigWindow::SIBLING) {
                    Some(event.sibling)
                } else {
                    None
                },
                mode: if event.stack_mode == xproto::StackMode::BELOW {
                    StackMode::Below
                } else {
                    StackMode::Above
                },
            });
        }

        Some(Event::PlacementRequest {
            window: event.window,
            pos,
            dim,
            on_root: event.parent == self.screen.root,
        })
    }

    fn on_property_notify(
        &self,
        event: xproto::PropertyNotifyEvent,
    ) -> Option<Event> {
        self.note_timestamp(event.time);

        Some(Event::Property {
            window: event.window,
            kind: self.property_kind_from_atom(event.atom)?,
            deleted: event.state == xproto::Property::DELETE,
            on_root: event.window == self.screen.root,
            time: event.time,
        })
    }

    fn on_client_message(
        &self,
        event: xproto::ClientMessageEvent,
    ) -> Option<Event> {
        let data = event.data.as_data32();

        match event.type_ {
            atom if atom == self.atoms.WM_CHANGE_STATE => Some(Event::ChangeStateRequest {
                window: event.window,
                state: IcccmWindowState::from_card(data[0])?,
            }),
            atom if atom == self.atoms._NET_WM_STATE => {
                // data = [action, state, state, source, 0]; the second state
                // slot queues separately so both toggles are observed.
                let action = match data[0] {
                    0 => ToggleAction::Remove,
                    1 => ToggleAction::Add,
                    2 => ToggleAction::Toggle,
                    _ => return None,
                };

                let mut states = [data[1], data[2]]
                    .iter()
                    .filter_map(|&atom| self.state_map.get(&atom).copied())
                    .map(|state| Event::StateRequest {
                        window: event.window,
                        state,
                        action,
                        on_root: false,
                    })
                    .collect::<VecDeque<Event>>();

                let first = states.pop_front();
                self.events.borrow_mut().extend(states);
                first
            },
            atom if atom == self.atoms._NET_ACTIVE_WINDOW => Some(Event::FocusRequest {
                window: event.window,
                on_root: false,
            }),
            atom if atom == self.atoms._NET_CLOSE_WINDOW => Some(Event::CloseRequest {
                window: event.window,
                on_root: false,
            }),
            atom if atom == self.atoms._NET_REQUEST_FRAME_EXTENTS => {
                Some(Event::FrameExtentsRequest {
                    window: event.window,
                })
            },
            atom if atom == self.atoms._DIM_WM_EXIT => Some(Event::ExitRequest {
                time: data[0],
            }),
            atom if atom == self.atoms._DIM_TAGSET_UPDATE => Some(Event::TagsetRequest {
                time: data[0],
            }),
            _ => None,
        }
    }
}

impl<'conn, Conn: connection::Connection> Connection for XConnection<'conn, Conn> {
    fn flush(&self) -> bool {
        self.conn.flush().is_ok()
    }

    fn step(&self) -> Option<Event> {
        if let Some(event) = self.events.borrow_mut().pop_front() {
            return Some(event);
        }

        drop(self.conn.flush());

        match self.conn.wait_for_event() {
            Ok(event) => self.enqueue(event),
            Err(err) => {
                warn!("error waiting for event: {}", err);
                return None;
            },
        }

        while let Ok(Some(event)) = self.conn.poll_for_event() {
            self.enqueue(event);
        }

        self.compress();
        self.events.borrow_mut().pop_front()
    }

    fn screen(&self) -> Screen {
        let full_region = Region::new(
            0,
            0,
            self.screen.width_in_pixels as i32,
            self.screen.height_in_pixels as i32,
        );

        Screen::new(self.screen_num, full_region, Vec::new())
    }

    fn update_outputs(&self) -> Screen {
        let full_region = self
            .get_window_geometry(self.screen.root)
            .unwrap_or_else(|_| {
                Region::new(
                    0,
                    0,
                    self.screen.width_in_pixels as i32,
                    self.screen.height_in_pixels as i32,
                )
            });

        let mut crtcs = Vec::new();

        if self.randr {
            if let Ok(Ok(resources)) = self
                .conn
                .randr_get_screen_resources_current(self.screen.root)
                .map(|cookie| cookie.reply())
            {
                let cookies: Vec<_> = resources
                    .crtcs
                    .iter()
                    .map(|&crtc| {
                        self.conn
                            .randr_get_crtc_info(crtc, resources.config_timestamp)
                    })
                    .collect();

                for cookie in cookies {
                    if let Ok(Ok(info)) = cookie.map(|cookie| cookie.reply()) {
                        if info.status == randr::SetConfig::SUCCESS && info.mode != x11rb::NONE {
                            crtcs.push(Region::new(
                                info.x as i32,
                                info.y as i32,
                                info.width as i32,
                                info.height as i32,
                            ));
                        }
                    }
                }
            }
        }

        Screen::new(self.screen_num, full_region, crtcs)
    }

    fn top_level_windows(&self) -> Vec<Window> {
        self.conn
            .query_tree(self.screen.root)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(Vec::new(), |reply| {
                reply
                    .children
                    .into_iter()
                    .filter(|&window| {
                        self.must_manage_window(window) && self.window_is_mapped(window)
                    })
                    .collect()
            })
    }

    fn get_pointer_position(&self) -> Pos {
        self.conn
            .query_pointer(self.screen.root)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(Pos::default(), |reply| Pos {
                x: reply.root_x as i32,
                y: reply.root_y as i32,
            })
    }

    fn warp_pointer(
        &self,
        pos: Pos,
    ) {
        drop(self.conn.warp_pointer(
            x11rb::NONE,
            self.screen.root,
            0,
            0,
            0,
            0,
            pos.x as i16,
            pos.y as i16,
        ));
    }

    fn warp_pointer_center_of_window(
        &self,
        window: Window,
    ) {
        if let Ok(region) = self.get_window_geometry(window) {
            drop(self.conn.warp_pointer(
                x11rb::NONE,
                window,
                0,
                0,
                0,
                0,
                (region.dim.w / 2) as i16,
                (region.dim.h / 2) as i16,
            ));
        }
    }

    fn cleanup(&self) {
        drop(self.conn.ungrab_keyboard(x11rb::CURRENT_TIME));
        drop(self.conn.ungrab_pointer(x11rb::CURRENT_TIME));
        drop(
            self.conn
                .ungrab_key(0, self.screen.root, ModMask::ANY),
        );
        drop(
            self.conn
                .ungrab_button(xproto::ButtonIndex::ANY, self.screen.root, ModMask::ANY),
        );

        drop(
            self.conn
                .delete_property(self.screen.root, self.atoms._NET_SUPPORTED),
        );
        drop(
            self.conn
                .delete_property(self.screen.root, self.atoms._NET_ACTIVE_WINDOW),
        );

        drop(self.conn.destroy_window(self.check_window));
        drop(self.conn.close_font(self.font));

        drop(self.conn.set_input_focus(
            xproto::InputFocus::POINTER_ROOT,
            x11rb::NONE,
            x11rb::CURRENT_TIME,
        ));

        drop(self.conn.flush());
    }

    fn create_frame(
        &self,
        region: Region,
    ) -> Window {
        let window = self.conn.generate_id().unwrap_or(x11rb::NONE);

        drop(self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            self.screen.root,
            region.pos.x as i16,
            region.pos.y as i16,
            region.dim.w as u16,
            region.dim.h as u16,
            0,
            xproto::WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::default()
                .event_mask(self.frame_event_mask)
                .background_pixel(self.screen.black_pixel),
        ));

        window
    }

    fn create_handle(&self) -> Window {
        let window = self.conn.generate_id().unwrap_or(x11rb::NONE);

        drop(self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            self.screen.root,
            -2,
            -2,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::default().override_redirect(1),
        ));

        window
    }

    fn create_popup(
        &self,
        region: Region,
    ) -> Window {
        let window = self.conn.generate_id().unwrap_or(x11rb::NONE);

        drop(self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            self.screen.root,
            region.pos.x as i16,
            region.pos.y as i16,
            region.dim.w as u16,
            region.dim.h as u16,
            1,
            xproto::WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::default()
                .override_redirect(1)
                .background_pixel(self.screen.black_pixel)
                .border_pixel(self.screen.white_pixel)
                .event_mask(self.popup_event_mask),
        ));

        window
    }

    fn init_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().event_mask(self.window_event_mask),
        ));
    }

    fn init_frame(
        &self,
        window: Window,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().event_mask(self.frame_event_mask),
        ));
    }

    fn map_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.map_window(window));
    }

    fn unmap_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.unmap_window(window));
    }

    fn reparent_window(
        &self,
        window: Window,
        parent: Window,
        pos: Pos,
    ) {
        drop(
            self.conn
                .reparent_window(window, parent, pos.x as i16, pos.y as i16),
        );
    }

    fn unparent_window(
        &self,
        window: Window,
        pos: Pos,
    ) {
        drop(self.conn.reparent_window(
            window,
            self.screen.root,
            pos.x as i16,
            pos.y as i16,
        ));
    }

    fn destroy_window(
        &self,
        window: Window,
    ) {
        drop(self.conn.destroy_window(window));
    }

    fn close_window(
        &self,
        window: Window,
        time: Timestamp,
    ) -> bool {
        if self.window_has_protocol(window, Protocol::DeleteWindow) {
            self.send_protocol_message(window, Protocol::DeleteWindow, time);
            true
        } else {
            self.kill_window(window)
        }
    }

    fn kill_window(
        &self,
        window: Window,
    ) -> bool {
        self.conn.kill_client(window).is_ok()
    }

    fn place_window(
        &self,
        window: Window,
        region: &Region,
    ) {
        drop(self.conn.configure_window(
            window,
            &xproto::ConfigureWindowAux::default()
                .x(region.pos.x)
                .y(region.pos.y)
                .width(region.dim.w as u32)
                .height(region.dim.h as u32),
        ));
    }

    fn move_window(
        &self,
        window: Window,
        pos: Pos,
    ) {
        drop(self.conn.configure_window(
            window,
            &xproto::ConfigureWindowAux::default().x(pos.x).y(pos.y),
        ));
    }

    fn resize_window(
        &self,
        window: Window,
        dim: Dim,
    ) {
        drop(self.conn.configure_window(
            window,
            &xproto::ConfigureWindowAux::default()
                .width(dim.w as u32)
                .height(dim.h as u32),
        ));
    }

    fn stack_window_above(
        &self,
        window: Window,
        sibling: Option<Window>,
    ) {
        let mut aux = xproto::ConfigureWindowAux::default().stack_mode(xproto::StackMode::ABOVE);

        if let Some(sibling) = sibling {
            aux = aux.sibling(sibling);
        }

        drop(self.conn.configure_window(window, &aux));
    }

    fn stack_window_below(
        &self,
        window: Window,
        sibling: Option<Window>,
    ) {
        let mut aux = xproto::ConfigureWindowAux::default().stack_mode(xproto::StackMode::BELOW);

        if let Some(sibling) = sibling {
            aux = aux.sibling(sibling);
        }

        drop(self.conn.configure_window(window, &aux));
    }

    fn insert_window_in_save_set(
        &self,
        window: Window,
    ) {
        drop(self.conn.change_save_set(xproto::SetMode::INSERT, window));
    }

    fn remove_window_from_save_set(
        &self,
        window: Window,
    ) {
        drop(self.conn.change_save_set(xproto::SetMode::DELETE, window));
    }

    fn set_window_border_width(
        &self,
        window: Window,
        width: u32,
    ) {
        drop(self.conn.configure_window(
            window,
            &xproto::ConfigureWindowAux::default().border_width(width),
        ));
    }

    fn set_window_border_color(
        &self,
        window: Window,
        color: u32,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().border_pixel(color),
        ));
    }

    fn set_window_background_color(
        &self,
        window: Window,
        color: u32,
    ) {
        drop(self.conn.change_window_attributes(
            window,
            &xproto::ChangeWindowAttributesAux::default().background_pixel(color),
        ));
    }

    fn get_window_geometry(
        &self,
        window: Window,
    ) -> Result<Region> {
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let translated = self
            .conn
            .translate_coordinates(window, self.screen.root, 0, 0)?
            .reply()?;

        Ok(Region::new(
            translated.dst_x as i32,
            translated.dst_y as i32,
            geometry.width as i32,
            geometry.height as i32,
        ))
    }

    fn get_window_border_width(
        &self,
        window: Window,
    ) -> u32 {
        self.conn
            .get_geometry(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(0, |geometry| geometry.border_width as u32)
    }

    fn must_manage_window(
        &self,
        window: Window,
    ) -> bool {
        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(false, |attrs| {
                !attrs.override_redirect && attrs.class != xproto::WindowClass::INPUT_ONLY
            })
    }

    fn window_is_mapped(
        &self,
        window: Window,
    ) -> bool {
        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(false, |attrs| {
                attrs.map_state != xproto::MapState::UNMAPPED
            })
    }

    fn send_configure_notify(
        &self,
        window: Window,
        region: Region,
        border: u32,
    ) {
        let event = xproto::ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: region.pos.x as i16,
            y: region.pos.y as i16,
            width: region.dim.w as u16,
            height: region.dim.h as u16,
            border_width: border as u16,
            override_redirect: false,
        };

        drop(
            self.conn
                .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event),
        );
    }

    fn grab_bindings(
        &self,
        key_inputs: &[&KeyInput],
        mouse_inputs: &[&MouseInput],
    ) {
        // Regrab for each lock-modifier combination so that held locks do
        // not defeat the passive grabs.
        let lock_masks = [
            ModMask::from(0u16),
            ModMask::M2,
            ModMask::LOCK,
            ModMask::M2 | ModMask::LOCK,
        ];

        for key_input in key_inputs {
            let keycode = keys::code_from_key(key_input.key);

            if keycode == 0 {
                warn!("no keycode for binding {:?}", key_input);
                continue;
            }

            let mask = self.mask_from_modifiers(&key_input.modifiers);

            for &lock_mask in &lock_masks {
                drop(self.conn.grab_key(
                    false,
                    self.screen.root,
                    mask | lock_mask,
                    keycode,
                    xproto::GrabMode::ASYNC,
                    xproto::GrabMode::ASYNC,
                ));
            }
        }

        for mouse_input in mouse_inputs {
            let mask = self.mask_from_modifiers(&mouse_input.modifiers);
            let button = self.button_from_input(mouse_input.button);

            for &lock_mask in &lock_masks {
                drop(self.conn.grab_button(
                    false,
                    self.screen.root,
                    EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                    xproto::GrabMode::ASYNC,
                    xproto::GrabMode::ASYNC,
                    x11rb::NONE,
                    x11rb::NONE,
                    button,
                    mask | lock_mask,
                ));
            }
        }
    }

    fn grab_focus_click(
        &self,
        frame: Window,
    ) {
        drop(self.conn.grab_button(
            false,
            frame,
            EventMask::BUTTON_PRESS,
            xproto::GrabMode::SYNC,
            xproto::GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            xproto::ButtonIndex::M1,
            ModMask::ANY,
        ));
    }

    fn ungrab_focus_click(
        &self,
        frame: Window,
    ) {
        drop(
            self.conn
                .ungrab_button(xproto::ButtonIndex::M1, frame, ModMask::ANY),
        );
    }

    fn replay_pointer(
        &self,
        time: Timestamp,
    ) {
        drop(self.conn.allow_events(xproto::Allow::REPLAY_POINTER, time));
    }

    fn allow_pointer(
        &self,
        time: Timestamp,
    ) {
        drop(self.conn.allow_events(xproto::Allow::ASYNC_POINTER, time));
    }

    fn grab_pointer(
        &self,
        grip: Option<Grip>,
        time: Timestamp,
    ) -> bool {
        self.conn
            .grab_pointer(
                false,
                self.screen.root,
                EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION,
                xproto::GrabMode::ASYNC,
                xproto::GrabMode::ASYNC,
                x11rb::NONE,
                self.grip_cursor(grip).unwrap_or(x11rb::NONE),
                time,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(false, |reply| {
                reply.status == xproto::GrabStatus::SUCCESS
            })
    }

    fn change_grab_cursor(
        &self,
        grip: Option<Grip>,
        time: Timestamp,
    ) {
        drop(self.conn.change_active_pointer_grab(
            self.grip_cursor(grip).unwrap_or(x11rb::NONE),
            time,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
        ));
    }

    fn ungrab_pointer(
        &self,
        time: Timestamp,
    ) {
        drop(self.conn.ungrab_pointer(time));
    }

    fn grab_keyboard(
        &self,
        time: Timestamp,
    ) -> bool {
        self.conn
            .grab_keyboard(
                false,
                self.screen.root,
                time,
                xproto::GrabMode::ASYNC,
                xproto::GrabMode::ASYNC,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(false, |reply| {
                reply.status == xproto::GrabStatus::SUCCESS
            })
    }

    fn ungrab_keyboard(
        &self,
        time: Timestamp,
    ) {
        drop(self.conn.ungrab_keyboard(time));
    }

    fn set_input_focus(
        &self,
        window: Window,
        time: Timestamp,
    ) {
        drop(
            self.conn
                .set_input_focus(xproto::InputFocus::POINTER_ROOT, window, time),
        );
    }

    fn set_pointer_root_focus(
        &self,
        time: Timestamp,
    ) {
        drop(self.conn.set_input_focus(
            xproto::InputFocus::POINTER_ROOT,
            x11rb::NONE,
            time,
        ));
    }

    fn get_focused_window(&self) -> Window {
        self.conn
            .get_input_focus()
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(x11rb::NONE, |reply| reply.focus)
    }

    fn send_protocol_message(
        &self,
        window: Window,
        protocol: Protocol,
        time: Timestamp,
    ) {
        let atom = match protocol {
            Protocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
            Protocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
        };

        self.send_client_message(
            window,
            window,
            self.atoms.WM_PROTOCOLS,
            [atom, time, 0, 0, 0],
            EventMask::NO_EVENT,
        );
    }

    fn window_has_protocol(
        &self,
        window: Window,
        protocol: Protocol,
    ) -> bool {
        let atom = match protocol {
            Protocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
            Protocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
        };

        self.get_atom_list_property(window, self.atoms.WM_PROTOCOLS, self.atoms.ATOM)
            .contains(&atom)
    }

    fn draw_titlebar(
        &self,
        frame: Window,
        dim: Dim,
        title: &str,
        focused: bool,
    ) {
        let (background, foreground) = if focused {
            (0xD7005Fu32, 0xFFFFFFu32)
        } else {
            (0x191A2Au32, 0x707070u32)
        };

        drop(self.conn.change_gc(
            self.fill_gc,
            &xproto::ChangeGCAux::default().foreground(background),
        ));
        drop(self.conn.poly_fill_rectangle(frame, self.fill_gc, &[
            xproto::Rectangle {
                x: 0,
                y: 0,
                width: dim.w as u16,
                height: dim.h as u16,
            },
        ]));

        drop(self.conn.change_gc(
            self.text_gc,
            &xproto::ChangeGCAux::default()
                .foreground(foreground)
                .background(background),
        ));

        let baseline = (dim.h + self.font_height) / 2 - 2;
        let title: String = title.chars().take(256).collect();

        drop(
            self.conn
                .image_text8(frame, self.text_gc, 4, baseline as i16, title.as_bytes()),
        );
    }

    fn draw_input_strip(
        &self,
        window: Window,
        dim: Dim,
        prompt: &str,
        content: &str,
        cursor: usize,
    ) {
        drop(self.conn.change_gc(
            self.fill_gc,
            &xproto::ChangeGCAux::default().foreground(self.screen.black_pixel),
        ));
        drop(self.conn.poly_fill_rectangle(window, self.fill_gc, &[
            xproto::Rectangle {
                x: 0,
                y: 0,
                width: dim.w as u16,
                height: dim.h as u16,
            },
        ]));

        drop(self.conn.change_gc(
            self.text_gc,
            &xproto::ChangeGCAux::default()
                .foreground(self.screen.white_pixel)
                .background(self.screen.black_pixel),
        ));

        let baseline = (dim.h + self.font_height) / 2 - 2;
        let text = format!("{}{}", prompt, content);

        drop(
            self.conn
                .image_text8(window, self.text_gc, 4, baseline as i16, text.as_bytes()),
        );

        // Block cursor, one character cell wide.
        let char_width = 7;
        let cursor_x = 4 + char_width * (prompt.chars().count() + cursor) as i16;

        drop(self.conn.change_gc(
            self.fill_gc,
            &xproto::ChangeGCAux::default()
                .foreground(self.screen.white_pixel)
                .function(xproto::GX::XOR),
        ));
        drop(self.conn.poly_fill_rectangle(window, self.fill_gc, &[
            xproto::Rectangle {
                x: cursor_x,
                y: 2,
                width: char_width as u16,
                height: (dim.h - 4) as u16,
            },
        ]));
        drop(self.conn.change_gc(
            self.fill_gc,
            &xproto::ChangeGCAux::default().function(xproto::GX::COPY),
        ));
    }

    fn draw_guideline(
        &self,
        axis: Axis,
        coord: i32,
    ) {
        let (w, h) = (
            self.screen.width_in_pixels as i16,
            self.screen.height_in_pixels as i16,
        );

        let points = match axis {
            Axis::Vertical => [
                xproto::Point {
                    x: coord as i16,
                    y: 0,
                },
                xproto::Point {
                    x: coord as i16,
                    y: h,
                },
            ],
            Axis::Horizontal => [
                xproto::Point {
                    x: 0,
                    y: coord as i16,
                },
                xproto::Point {
                    x: w,
                    y: coord as i16,
                },
            ],
        };

        drop(self.conn.poly_line(
            xproto::CoordMode::ORIGIN,
            self.screen.root,
            self.xor_gc,
            &points,
        ));
        drop(self.conn.flush());
    }

    fn primary_selection(&self) -> Option<String> {
        self.get_string_property(self.screen.root, xproto::AtomEnum::CUT_BUFFE_R0.into())
    }

    fn get_window_property(
        &self,
        window: Window,
        kind: PropertyKind,
    ) -> Option<PropertyValue> {
        match kind {
            PropertyKind::Name => {
                Some(PropertyValue::String(self.get_icccm_window_name(window)))
            },
            PropertyKind::Class => {
                let (instance, class) = self.get_icccm_window_class(window);
                Some(PropertyValue::Command(vec![instance, class]))
            },
            PropertyKind::SizeHints => self
                .get_icccm_window_size_hints(window, None)
                .map(PropertyValue::SizeHints),
            PropertyKind::Hints => None,
            PropertyKind::Protocols => Some(PropertyValue::AtomList(
                self.get_atom_list_property(window, self.atoms.WM_PROTOCOLS, self.atoms.ATOM),
            )),
            PropertyKind::Transient => self
                .get_icccm_window_transient_for(window)
                .map(|transient| PropertyValue::IntList(vec![transient])),
            PropertyKind::Tags => {
                Some(PropertyValue::AtomList(self.get_window_tags(window)))
            },
            PropertyKind::TagsetExpression => {
                self.get_tagset_expression().map(PropertyValue::String)
            },
            PropertyKind::Command => Some(PropertyValue::Command(self.get_wm_command())),
        }
    }

    fn set_icccm_window_state(
        &self,
        window: Window,
        state: IcccmWindowState,
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            window,
            self.atoms.WM_STATE,
            self.atoms.WM_STATE,
            &[state.to_card(), x11rb::NONE],
        ));
    }

    fn get_icccm_window_state(
        &self,
        window: Window,
    ) -> Option<IcccmWindowState> {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_STATE,
                self.atoms.WM_STATE,
                0,
                2,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| reply.value32().and_then(|mut values| values.next()))
            .and_then(IcccmWindowState::from_card)
    }

    fn get_icccm_window_name(
        &self,
        window: Window,
    ) -> String {
        self.get_string_property(window, self.atoms._NET_WM_NAME)
            .or_else(|| self.get_string_property(window, self.atoms.WM_NAME))
            .unwrap_or_default()
    }

    fn get_icccm_window_class(
        &self,
        window: Window,
    ) -> (String, String) {
        properties::WmClass::get(self.conn, window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .flatten()
            .map_or((String::new(), String::new()), |class| {
                (
                    String::from_utf8_lossy(class.instance()).into_owned(),
                    String::from_utf8_lossy(class.class()).into_owned(),
                )
            })
    }

    fn get_icccm_window_transient_for(
        &self,
        window: Window,
    ) -> Option<Window> {
        self.conn
            .get_property(
                false,
                window,
                self.atoms.WM_TRANSIENT_FOR,
                self.atoms.WINDOW,
                0,
                1,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| reply.value32().and_then(|mut values| values.next()))
            .filter(|&transient| transient != x11rb::NONE)
    }

    fn get_icccm_window_hints(
        &self,
        window: Window,
    ) -> Option<Hints> {
        let hints = properties::WmHints::get(self.conn, window)
            .ok()?
            .reply()
            .ok()??;

        Some(Hints {
            urgent: hints.urgent,
            input: hints.input,
            initial_state: hints.initial_state.map(|state| match state {
                properties::WmHintsState::Normal => IcccmWindowState::Normal,
                properties::WmHintsState::Iconic => IcccmWindowState::Iconic,
            }),
            group: hints.window_group,
        })
    }

    fn get_icccm_window_size_hints(
        &self,
        window: Window,
        min_window_dim: Option<Dim>,
    ) -> Option<SizeHints> {
        let size_hints = properties::WmSizeHints::get_normal_hints(self.conn, window)
            .ok()?
            .reply()
            .ok()??;

        let (by_user, pos) = size_hints.position.map_or((false, None), |(spec, x, y)| {
            (
                matches!(spec, properties::WmSizeHintsSpecification::UserSpecified),
                Some(Pos {
                    x,
                    y,
                }),
            )
        });

        let (mut min_width, mut min_height) =
            size_hints.min_size.map_or((None, None), |(w, h)| {
                (Some(w), Some(h))
            });

        if let Some(min_dim) = min_window_dim {
            min_width = Some(min_width.map_or(min_dim.w, |w| std::cmp::max(w, min_dim.w)));
            min_height = Some(min_height.map_or(min_dim.h, |h| std::cmp::max(h, min_dim.h)));
        }

        let (max_width, max_height) = size_hints.max_size.map_or((None, None), |(w, h)| {
            (
                Some(w).filter(|&w| w > 0),
                Some(h).filter(|&h| h > 0),
            )
        });

        let (base_width, base_height) = size_hints.base_size.map_or((None, None), |(w, h)| {
            (Some(w), Some(h))
        });

        let (inc_width, inc_height) =
            size_hints.size_increment.map_or((None, None), |(w, h)| {
                (
                    Some(w).filter(|&w| w > 0),
                    Some(h).filter(|&h| h > 0),
                )
            });

        let (min_ratio, max_ratio) = size_hints.aspect.map_or((None, None), |(min, max)| {
            (
                Some(min.numerator as f64 / std::cmp::max(min.denominator, 1) as f64),
                Some(max.numerator as f64 / std::cmp::max(max.denominator, 1) as f64),
            )
        });

        Some(SizeHints {
            by_user,
            pos,
            min_width,
            min_height,
            max_width,
            max_height,
            base_width,
            base_height,
            inc_width,
            inc_height,
            min_ratio,
            max_ratio,
            gravity: size_hints.win_gravity.map(u32::from),
        })
    }

    fn get_wm_command(&self) -> Vec<String> {
        self.conn
            .get_property(
                false,
                self.screen.root,
                self.atoms.WM_COMMAND,
                self.atoms.STRING,
                0,
                std::u32::MAX,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(Vec::new(), |reply| decode_string_list(&reply.value))
    }

    fn set_wm_command(
        &self,
        argv: &[String],
    ) {
        drop(self.conn.change_property8(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms.WM_COMMAND,
            self.atoms.STRING,
            &encode_string_list(argv),
        ));
    }

    fn replace_wm_command(
        &self,
        argv: &[String],
    ) -> Result<Timestamp> {
        self.conn
            .change_window_attributes(
                self.screen.root,
                &xproto::ChangeWindowAttributesAux::default()
                    .event_mask(EventMask::PROPERTY_CHANGE),
            )?
            .check()?;

        self.set_wm_command(argv);
        self.conn.flush()?;

        loop {
            match self.conn.wait_for_event()? {
                XEvent::PropertyNotify(event) if event.atom == self.atoms.WM_COMMAND => {
                    return Ok(event.time);
                },
                _ => {},
            }
        }
    }

    fn init_wm_properties(
        &self,
        wm_name: &str,
    ) {
        let supported = [
            self.atoms._NET_SUPPORTED,
            self.atoms._NET_CLIENT_LIST,
            self.atoms._NET_ACTIVE_WINDOW,
            self.atoms._NET_SUPPORTING_WM_CHECK,
            self.atoms._NET_WM_NAME,
            self.atoms._NET_WM_STATE,
            self.atoms._NET_WM_STATE_FULLSCREEN,
            self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
            self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
            self.atoms._NET_FRAME_EXTENTS,
        ];

        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms._NET_SUPPORTED,
            xproto::AtomEnum::ATOM,
            &supported,
        ));

        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms._NET_SUPPORTING_WM_CHECK,
            xproto::AtomEnum::WINDOW,
            &[self.check_window],
        ));

        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.check_window,
            self.atoms._NET_SUPPORTING_WM_CHECK,
            xproto::AtomEnum::WINDOW,
            &[self.check_window],
        ));

        drop(self.conn.change_property8(
            xproto::PropMode::REPLACE,
            self.check_window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            wm_name.as_bytes(),
        ));
    }

    fn set_active_window(
        &self,
        window: Option<Window>,
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms._NET_ACTIVE_WINDOW,
            xproto::AtomEnum::WINDOW,
            &[window.unwrap_or(x11rb::NONE)],
        ));
    }

    fn set_window_state(
        &self,
        window: Window,
        state: WindowState,
        on: bool,
    ) {
        let state_atom = self.get_atom_from_window_state(state);
        let mut states =
            self.get_atom_list_property(window, self.atoms._NET_WM_STATE, self.atoms.ATOM);

        if on {
            if states.contains(&state_atom) {
                return;
            }

            states.push(state_atom);
        } else {
            states.retain(|&atom| atom != state_atom);
        }

        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            window,
            self.atoms._NET_WM_STATE,
            xproto::AtomEnum::ATOM,
            &states,
        ));
    }

    fn get_window_states(
        &self,
        window: Window,
    ) -> Vec<WindowState> {
        self.get_atom_list_property(window, self.atoms._NET_WM_STATE, self.atoms.ATOM)
            .into_iter()
            .filter_map(|atom| self.state_map.get(&atom).copied())
            .collect()
    }

    fn window_is_fullscreen(
        &self,
        window: Window,
    ) -> bool {
        self.get_window_states(window)
            .contains(&WindowState::Fullscreen)
    }

    fn set_window_frame_extents(
        &self,
        window: Window,
        extents: Extents,
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            window,
            self.atoms._NET_FRAME_EXTENTS,
            xproto::AtomEnum::CARDINAL,
            &[
                extents.left as u32,
                extents.right as u32,
                extents.top as u32,
                extents.bottom as u32,
            ],
        ));
    }

    fn update_client_list(
        &self,
        clients: &[Window],
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms._NET_CLIENT_LIST,
            xproto::AtomEnum::WINDOW,
            clients,
        ));
    }

    fn intern_atom(
        &self,
        name: &str,
    ) -> Atom {
        self.atom_cache.intern(name)
    }

    fn atom_name(
        &self,
        atom: Atom,
    ) -> String {
        self.atom_cache.name(atom)
    }

    fn get_window_tags(
        &self,
        window: Window,
    ) -> Vec<Atom> {
        self.get_atom_list_property(window, self.atoms._DIM_TAGS, self.atoms.ATOM)
    }

    fn set_window_tags(
        &self,
        window: Window,
        tags: &[Atom],
    ) {
        drop(self.conn.change_property32(
            xproto::PropMode::REPLACE,
            window,
            self.atoms._DIM_TAGS,
            xproto::AtomEnum::ATOM,
            tags,
        ));
    }

    fn get_tagset_expression(&self) -> Option<String> {
        self.get_string_property(self.screen.root, self.atoms._DIM_TAGSET_EXPRESSION)
    }

    fn set_tagset_expression(
        &self,
        expression: &str,
    ) {
        drop(self.conn.change_property8(
            xproto::PropMode::REPLACE,
            self.screen.root,
            self.atoms._DIM_TAGSET_EXPRESSION,
            self.atoms.UTF8_STRING,
            expression.as_bytes(),
        ));
    }

    fn send_tagset_update(&self) {
        self.send_client_message(
            self.screen.root,
            self.screen.root,
            self.atoms._DIM_TAGSET_UPDATE,
            [x11rb::CURRENT_TIME, 0, 0, 0, 0],
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        );
    }

    fn send_exit_message(
        &self,
        time: Timestamp,
    ) {
        self.send_client_message(
            self.screen.root,
            self.screen.root,
            self.atoms._DIM_WM_EXIT,
            [time, 0, 0, 0, 0],
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        );
    }
}
