use crate::event::Event;
use crate::event::PropertyKind;
use crate::geometry::Axis;
use crate::geometry::Dim;
use crate::geometry::Extents;
use crate::geometry::Grip;
use crate::geometry::Pos;
use crate::geometry::Region;
use crate::hints::Hints;
use crate::hints::SizeHints;
use crate::input::KeyInput;
use crate::input::MouseInput;
use crate::properties::PropertyValue;
use crate::screen::Screen;
use crate::window::Atom;
use crate::window::IcccmWindowState;
use crate::window::Protocol;
use crate::window::Timestamp;
use crate::window::Window;
use crate::window::WindowState;
use crate::Result;

pub trait Connection {
    fn flush(&self) -> bool;
    fn step(&self) -> Option<Event>;
    fn screen(&self) -> Screen;
    fn update_outputs(&self) -> Screen;
    fn top_level_windows(&self) -> Vec<Window>;
    fn get_pointer_position(&self) -> Pos;
    fn warp_pointer(
        &self,
        pos: Pos,
    );
    fn warp_pointer_center_of_window(
        &self,
        window: Window,
    );
    fn cleanup(&self);

    // Window manipulation
    fn create_frame(
        &self,
        region: Region,
    ) -> Window;
    fn create_handle(&self) -> Window;
    fn create_popup(
        &self,
        region: Region,
    ) -> Window;
    fn init_window(
        &self,
        window: Window,
    );
    fn init_frame(
        &self,
        window: Window,
    );
    fn map_window(
        &self,
        window: Window,
    );
    fn unmap_window(
        &self,
        window: Window,
    );
    fn reparent_window(
        &self,
        window: Window,
        parent: Window,
        pos: Pos,
    );
    fn unparent_window(
        &self,
        window: Window,
        pos: Pos,
    );
    fn destroy_window(
        &self,
        window: Window,
    );
    fn close_window(
        &self,
        window: Window,
        time: Timestamp,
    ) -> bool;
    fn kill_window(
        &self,
        window: Window,
    ) -> bool;
    fn place_window(
        &self,
        window: Window,
        region: &Region,
    );
    fn move_window(
        &self,
        window: Window,
        pos: Pos,
    );
    fn resize_window(
        &self,
        window: Window,
        dim: Dim,
    );
    fn stack_window_above(
        &self,
        window: Window,
        sibling: Option<Window>,
    );
    fn stack_window_below(
        &self,
        window: Window,
        sibling: Option<Window>,
    );
    fn insert_window_in_save_set(
        &self,
        window: Window,
    );
    fn remove_window_from_save_set(
        &self,
        window: Window,
    );
    fn set_window_border_width(
        &self,
        window: Window,
        width: u32,
    );
    fn set_window_border_color(
        &self,
        window: Window,
        color: u32,
    );
    fn set_window_background_color(
        &self,
        window: Window,
        color: u32,
    );
    fn get_window_geometry(
        &self,
        window: Window,
    ) -> Result<Region>;
    fn get_window_border_width(
        &self,
        window: Window,
    ) -> u32;
    fn must_manage_window(
        &self,
        window: Window,
    ) -> bool;
    fn window_is_mapped(
        &self,
        window: Window,
    ) -> bool;
    fn send_configure_notify(
        &self,
        window: Window,
        region: Region,
        border: u32,
    );

    // Input and grabs
    fn grab_bindings(
        &self,
        key_inputs: &[&KeyInput],
        mouse_inputs: &[&MouseInput],
    );
    fn grab_focus_click(
        &self,
        frame: Window,
    );
    fn ungrab_focus_click(
        &self,
        frame: Window,
    );
    fn replay_pointer(
        &self,
        time: Timestamp,
    );
    fn allow_pointer(
        &self,
        time: Timestamp,
    );
    fn grab_pointer(
        &self,
        grip: Option<Grip>,
        time: Timestamp,
    ) -> bool;
    fn change_grab_cursor(
        &self,
        grip: Option<Grip>,
        time: Timestamp,
    );
    fn ungrab_pointer(
        &self,
        time: Timestamp,
    );
    fn grab_keyboard(
        &self,
        time: Timestamp,
    ) -> bool;
    fn ungrab_keyboard(
        &self,
        time: Timestamp,
    );

    // Focus
    fn set_input_focus(
        &self,
        window: Window,
        time: Timestamp,
    );
    fn set_pointer_root_focus(
        &self,
        time: Timestamp,
    );
    fn get_focused_window(&self) -> Window;
    fn send_protocol_message(
        &self,
        window: Window,
        protocol: Protocol,
        time: Timestamp,
    );
    fn window_has_protocol(
        &self,
        window: Window,
        protocol: Protocol,
    ) -> bool;

    // Drawing
    fn draw_titlebar(
        &self,
        frame: Window,
        dim: Dim,
        title: &str,
        focused: bool,
    );
    fn draw_input_strip(
        &self,
        window: Window,
        dim: Dim,
        prompt: &str,
        content: &str,
        cursor: usize,
    );
    fn draw_guideline(
        &self,
        axis: Axis,
        coord: i32,
    );
    fn primary_selection(&self) -> Option<String>;

    // Typed property registry
    fn get_window_property(
        &self,
        window: Window,
        kind: PropertyKind,
    ) -> Option<PropertyValue>;

    // ICCCM
    fn set_icccm_window_state(
        &self,
        window: Window,
        state: IcccmWindowState,
    );
    fn get_icccm_window_state(
        &self,
        window: Window,
    ) -> Option<IcccmWindowState>;
    fn get_icccm_window_name(
        &self,
        window: Window,
    ) -> String;
    fn get_icccm_window_class(
        &self,
        window: Window,
    ) -> (String, String);
    fn get_icccm_window_transient_for(
        &self,
        window: Window,
    ) -> Option<Window>;
    fn get_icccm_window_hints(
        &self,
        window: Window,
    ) -> Option<Hints>;
    fn get_icccm_window_size_hints(
        &self,
        window: Window,
        min_window_dim: Option<Dim>,
    ) -> Option<SizeHints>;
    fn get_wm_command(&self) -> Vec<String>;
    fn set_wm_command(
        &self,
        argv: &[String],
    );
    fn replace_wm_command(
        &self,
        argv: &[String],
    ) -> Result<Timestamp>;

    // EWMH
    fn init_wm_properties(
        &self,
        wm_name: &str,
    );
    fn set_active_window(
        &self,
        window: Option<Window>,
    );
    fn set_window_state(
        &self,
        window: Window,
        state: WindowState,
        on: bool,
    );
    fn get_window_states(
        &self,
        window: Window,
    ) -> Vec<WindowState>;
    fn window_is_fullscreen(
        &self,
        window: Window,
    ) -> bool;
    fn set_window_frame_extents(
        &self,
        window: Window,
        extents: Extents,
    );
    fn update_client_list(
        &self,
        clients: &[Window],
    );

    // Atoms and tags
    fn intern_atom(
        &self,
        name: &str,
    ) -> Atom;
    fn atom_name(
        &self,
        atom: Atom,
    ) -> String;
    fn get_window_tags(
        &self,
        window: Window,
    ) -> Vec<Atom>;
    fn set_window_tags(
        &self,
        window: Window,
        tags: &[Atom],
    );
    fn get_tagset_expression(&self) -> Option<String>;
    fn set_tagset_expression(
        &self,
        expression: &str,
    );
    fn send_tagset_update(&self);
    fn send_exit_message(
        &self,
        time: Timestamp,
    );
}
