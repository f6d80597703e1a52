//! SessionKind - Which streaming operation a session belongs to

use serde::{Deserialize, Serialize};

/// Tag for the two streaming operations.
///
/// Routing of chunks into drafts is decided by this tag, never by item
/// index or ambient flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Challenge generation: several item slots addressed by `item_index`
    Challenges,
    /// Résumé analysis: a single draft
    Analysis,
}

impl SessionKind {
    /// Number of item slots a board of this kind starts with
    pub fn initial_slots(&self) -> usize {
        match self {
            SessionKind::Challenges => 3,
            SessionKind::Analysis => 1,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Challenges => write!(f, "challenges"),
            SessionKind::Analysis => write!(f, "analysis"),
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "challenges" | "challenge" => Ok(SessionKind::Challenges),
            "analysis" | "resume" => Ok(SessionKind::Analysis),
            _ => Err(format!("Unknown session kind: {}", s)),
        }
    }
}
