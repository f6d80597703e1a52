//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod difficulty_level;
mod session_kind;
mod session_status;

pub use difficulty_level::*;
pub use session_kind::*;
pub use session_status::*;
