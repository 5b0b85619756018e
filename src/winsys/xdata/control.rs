//! Control-message senders for a second process of the same binary:
//! tagset switches, exit, restart, and exec-replacement all travel as
//! root-window properties and client messages.

use crate::properties::encode_string_list;
use crate::window::Timestamp;
use crate::xdata::xconnection::Atoms;
use crate::Result;

use x11rb::connection::Connection;
use x11rb::protocol::xproto;
use x11rb::protocol::xproto::ConnectionExt;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::Event as XEvent;
use x11rb::wrapper::ConnectionExt as _;

use anyhow::anyhow;

fn send_root_message<Conn: Connection>(
    conn: &Conn,
    root: xproto::Window,
    type_: u32,
    data: [u32; 5],
) -> Result<()> {
    let event = xproto::ClientMessageEvent {
        response_type: xproto::CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window: root,
        type_,
        data: data.into(),
    };

    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        event,
    )?;

    Ok(())
}

/// Publish a tagset expression on the root window and nudge the running
/// manager to apply it.
pub fn send_tagset_expression<Conn: Connection>(
    conn: &Conn,
    screen_num: usize,
    spec: &str,
) -> Result<()> {
    let root = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(conn)?.reply()?;

    conn.change_property8(
        xproto::PropMode::REPLACE,
        root,
        atoms._DIM_TAGSET_EXPRESSION,
        atoms.UTF8_STRING,
        spec.as_bytes(),
    )?;

    send_root_message(conn, root, atoms._DIM_TAGSET_UPDATE, [0; 5])?;
    conn.flush()?;

    Ok(())
}

/// Ask the running manager to shut down. A zero timestamp requests a
/// plain exit; a timestamp at or after the last WM_COMMAND update makes
/// the manager exec that command in place.
pub fn send_exit<Conn: Connection>(
    conn: &Conn,
    screen_num: usize,
    time: Timestamp,
) -> Result<()> {
    let root = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(conn)?.reply()?;

    send_root_message(conn, root, atoms._DIM_WM_EXIT, [time, 0, 0, 0, 0])?;
    conn.flush()?;

    Ok(())
}

/// Rewrite WM_COMMAND on the root window and return the server
/// timestamp of the resulting PropertyNotify.
pub fn replace_wm_command<Conn: Connection>(
    conn: &Conn,
    screen_num: usize,
    argv: &[String],
) -> Result<Timestamp> {
    let root = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(conn)?.reply()?;

    conn.change_window_attributes(
        root,
        &xproto::ChangeWindowAttributesAux::default().event_mask(EventMask::PROPERTY_CHANGE),
    )?
    .check()?;

    conn.change_property8(
        xproto::PropMode::REPLACE,
        root,
        atoms.WM_COMMAND,
        atoms.STRING,
        &encode_string_list(argv),
    )?;
    conn.flush()?;

    loop {
        match conn.wait_for_event()? {
            XEvent::PropertyNotify(event) if event.atom == atoms.WM_COMMAND => {
                return Ok(event.time);
            },
            _ => {},
        }
    }
}

/// Make the running manager exec its own argv anew: touch WM_COMMAND to
/// obtain a fresh timestamp, then send the exit message carrying it.
pub fn send_restart<Conn: Connection>(
    conn: &Conn,
    screen_num: usize,
) -> Result<()> {
    let root = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(conn)?.reply()?;

    let argv = conn
        .get_property(
            false,
            root,
            atoms.WM_COMMAND,
            atoms.STRING,
            0,
            std::u32::MAX,
        )?
        .reply()
        .map(|reply| crate::properties::decode_string_list(&reply.value))
        .unwrap_or_default();

    if argv.is_empty() {
        return Err(anyhow!("no WM_COMMAND on root; is the manager running?"));
    }

    let time = replace_wm_command(conn, screen_num, &argv)?;
    send_exit(conn, screen_num, time)
}

/// Replace the running manager with an arbitrary command.
pub fn send_exec<Conn: Connection>(
    conn: &Conn,
    screen_num: usize,
    argv: &[String],
) -> Result<()> {
    if argv.is_empty() {
        return Err(anyhow!("--exec requires a command"));
    }

    let time = replace_wm_command(conn, screen_num, argv)?;
    send_exit(conn, screen_num, time)
}
