use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A color string was not `#rgb`, `#rrggbb`, or `#rrggbbaa`.
    InvalidColor(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor(s) => write!(f, "invalid color literal: {s:?}"),
        }
    }
}

impl std::error::Error for CoreError {}
