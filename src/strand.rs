//! Strand orientation for annotation features.

use std::fmt;
use std::str::FromStr;

/// Strand orientation of a feature. Unstranded (`.`) features are not
/// representable: every record used here is on one of the two strands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
        }
    }
}

/// Display helper for optional strands; `None` prints as `.`.
pub fn strand_or_dot(strand: Option<Strand>) -> String {
    strand.map_or_else(|| ".".to_string(), |s| s.to_string())
}
