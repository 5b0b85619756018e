#![deny(clippy::all)]
#![allow(dead_code)]

#[macro_use]
extern crate log;

#[allow(unused_imports)]
use simplelog::LevelFilter;
#[allow(unused_imports)]
use simplelog::SimpleLogger;

use winsys::xdata::control;
use winsys::xdata::xconnection::XConnection;
pub use winsys::Result;

use std::os::unix::process::CommandExt;
use std::process::Command;

#[macro_use]
mod macros;

#[macro_use]
mod defaults;

mod binding;
mod change;
mod client;
mod cycle;
mod decoration;
mod error;
mod focus;
mod identify;
mod minibuffer;
mod model;
mod moveresize;
mod tags;
mod util;

use binding::KeyBindings;
use binding::MouseBindings;
use change::Direction;
use focus::ClickToFocus;
use focus::FocusNewWindows;
use focus::FocusPolicy;
use focus::SloppyFocus;
use model::Model;

pub fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    SimpleLogger::init(LevelFilter::Debug, simplelog::Config::default())?;
    #[cfg(not(debug_assertions))]
    SimpleLogger::init(LevelFilter::Info, simplelog::Config::default())?;

    let args: Vec<String> = std::env::args().collect();

    if let Some(flag) = args
        .get(1)
        .filter(|arg| matches!(arg.as_str(), "--tagset" | "--exit" | "--restart" | "--exec"))
    {
        return send_control_message(flag, &args[2..]);
    }

    let (conn, screen_num) = x11rb::connect(None)?;
    let xconn = XConnection::new(&conn, screen_num, defaults::FONT_NAME)?;

    let (key_bindings, mouse_bindings) = init_bindings();
    let focus_policy = init_focus_policy(&args);

    let mut model = Model::new(&xconn, focus_policy, &key_bindings, &mouse_bindings);
    model.run(key_bindings, mouse_bindings);

    if let Some(argv) = model.exec_argv() {
        info!("replacing process image with {:?}", argv);
        drop(model);

        let err = Command::new(&argv[0]).args(&argv[1..]).exec();
        return Err(err.into());
    }

    Ok(())
}

fn send_control_message(
    flag: &str,
    rest: &[String],
) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(None)?;

    match flag {
        "--tagset" => {
            let spec = rest
                .first()
                .ok_or_else(|| anyhow::anyhow!("--tagset requires a specification"))?;

            // Reject malformed specifications on the sending side.
            tags::parse_tagset(spec).map_err(|err| anyhow::anyhow!("invalid tagset: {}", err))?;
            control::send_tagset_expression(&conn, screen_num, spec)
        },
        "--exit" => control::send_exit(&conn, screen_num, x11rb::CURRENT_TIME),
        "--restart" => control::send_restart(&conn, screen_num),
        "--exec" => control::send_exec(&conn, screen_num, rest),
        _ => Err(anyhow::anyhow!("unrecognized flag {}", flag)),
    }
}

fn init_focus_policy(args: &[String]) -> Box<dyn FocusPolicy> {
    let base: Box<dyn FocusPolicy> = if args.iter().any(|arg| arg == "--click-to-focus") {
        Box::new(ClickToFocus {
            ignore_focus_click: false,
        })
    } else {
        Box::new(SloppyFocus)
    };

    if args.iter().any(|arg| arg == "--no-focus-new") {
        base
    } else {
        Box::new(FocusNewWindows {
            inner: base,
        })
    }
}

fn init_bindings() -> (KeyBindings, MouseBindings) {
    // "[modifiers]-button" => action
    let mouse_bindings = build_mouse_bindings!(
        "M-Left" => do_internal_mouse_block!(model, window, {
            if let Some(window) = window {
                model.start_moving(window);
            }
        }),
        "M-Right" => do_internal_mouse_block!(model, window, {
            if let Some(window) = window {
                model.start_resizing(window);
            }
        }),
        "M-Middle" => do_internal_mouse!(lower_focus),
    );

    // "[modifiers]-key" => action
    let key_bindings = build_key_bindings!(
        "M-S-q" => do_internal!(exit),

        // client state modifiers
        "M-c" => do_internal!(close_focus),
        "M-f" => do_internal!(toggle_fullscreen_focus),
        "M-m" => do_internal!(toggle_maximize_focus),
        "M-y" => do_internal!(iconify_focus),
        "C-A-equal" => do_internal!(read_window_state),

        // client order modifiers
        "M-Tab" => do_internal!(cycle_focus, Direction::Forward),
        "M-S-Tab" => do_internal!(cycle_focus, Direction::Backward),
        "A-Tab" => do_internal!(cycle_focus, Direction::Forward),
        "M-r" => do_internal!(raise_focus),
        "M-l" => do_internal!(lower_focus),

        // tag operations
        "M-semicolon" => do_internal!(read_tagset_spec),
        "M-t" => do_internal!(read_focus_tags),

        // prefixed window operations
        "M-w" => chain!(
            "f" => do_internal!(toggle_fullscreen_focus),
            "m" => do_internal!(toggle_maximize_focus),
            "c" => do_internal!(close_focus),
            "y" => do_internal!(iconify_focus),
        ),

        // external spawn commands
        "M-x" => do_internal!(read_spawn_command),
        "M-Return" => spawn_external!("xterm"),
        "M-p" => spawn_external!("dmenu_run"),
    );

    (key_bindings, mouse_bindings)
}
