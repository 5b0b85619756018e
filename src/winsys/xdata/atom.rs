use crate::window::Atom;

use std::cell::RefCell;
use std::collections::HashMap;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::ConnectionExt;

/// Write-through cache for dynamically interned atoms. Statically known
/// protocol atoms are interned in bulk through x11rb's `atom_manager!`;
/// this cache serves names only discovered at runtime, tag names first
/// among them.
pub struct AtomCache<'conn, Conn: Connection> {
    conn: &'conn Conn,
    atoms: RefCell<HashMap<String, Atom>>,
    names: RefCell<HashMap<Atom, String>>,
}

impl<'conn, Conn: Connection> AtomCache<'conn, Conn> {
    pub fn new(conn: &'conn Conn) -> Self {
        Self {
            conn,
            atoms: RefCell::new(HashMap::new()),
            names: RefCell::new(HashMap::new()),
        }
    }

    pub fn prime(
        &self,
        names: &[&str],
    ) {
        let cookies: Vec<_> = names
            .iter()
            .map(|&name| (name, self.conn.intern_atom(false, name.as_bytes())))
            .collect();

        for (name, cookie) in cookies {
            if let Ok(Ok(reply)) = cookie.map(|cookie| cookie.reply()) {
                self.insert(name.to_owned(), reply.atom);
            }
        }
    }

    pub fn intern(
        &self,
        name: &str,
    ) -> Atom {
        if let Some(&atom) = self.atoms.borrow().get(name) {
            return atom;
        }

        let atom = self
            .conn
            .intern_atom(false, name.as_bytes())
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or(x11rb::NONE, |reply| reply.atom);

        self.insert(name.to_owned(), atom);
        atom
    }

    pub fn name(
        &self,
        atom: Atom,
    ) -> String {
        if let Some(name) = self.names.borrow().get(&atom) {
            return name.clone();
        }

        let name = self
            .conn
            .get_atom_name(atom)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map_or_else(String::new, |reply| {
                String::from_utf8_lossy(&reply.name).into_owned()
            });

        self.insert(name.clone(), atom);
        name
    }

    fn insert(
        &self,
        name: String,
        atom: Atom,
    ) {
        self.names.borrow_mut().insert(atom, name.clone());
        self.atoms.borrow_mut().insert(name, atom);
    }
}
