use crate::identify::Index;

use std::hash::BuildHasher;
use std::hash::Hasher;
use std::process::Command;
use std::process::Stdio;

#[derive(Default)]
pub struct IdHasher {
    state: u64,
}

impl Hasher for IdHasher {
    #[inline]
    fn write(
        &mut self,
        bytes: &[u8],
    ) {
        for &byte in bytes {
            self.state = self.state.rotate_left(8) + u64::from(byte);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

#[derive(Default, Clone)]
pub struct BuildIdHasher;

impl BuildHasher for BuildIdHasher {
    type Hasher = IdHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Self::Hasher {
            state: 0,
        }
    }
}

pub struct Util;

impl Util {
    #[inline]
    pub fn last_index(iter: impl ExactSizeIterator) -> Index {
        if iter.len() != 0 {
            iter.len() - 1
        } else {
            0
        }
    }

    pub fn spawn<S: Into<String>>(cmd: S) {
        let cmd = cmd.into();
        let args: Vec<&str> = cmd.split_whitespace().collect();

        if args.is_empty() {
            return;
        }

        Command::new(args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .ok();
    }

    pub fn spawn_shell<S: Into<String>>(cmd: S) {
        Command::new("sh")
            .arg("-c")
            .arg(cmd.into())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .ok();
    }
}
