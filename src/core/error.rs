use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagsetParseError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for TagsetParseError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for TagsetParseError {}
