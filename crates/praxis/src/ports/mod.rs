//! Ports (Interfaces)
//!
//! Abstract interfaces through which the streaming core reaches the
//! backend. The HTTP implementation lives in `praxis-client`.

pub mod transport;

// Re-exports
pub use transport::*;
