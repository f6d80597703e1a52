//! Domain Layer
//!
//! Pure domain types without transport dependencies.
//! Contains entities, value objects and errors.

pub mod entities;
pub mod errors;
pub mod lenient;
pub mod timestamp;
pub mod value_objects;

// Re-exports for convenience
pub use entities::*;
pub use errors::*;
pub use value_objects::*;
