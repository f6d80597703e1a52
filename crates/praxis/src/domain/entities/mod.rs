//! Domain Entities
//!
//! - Challenge: a generated technical challenge
//! - ResumeAnalysis: the AI report for an uploaded résumé

mod analysis;
mod challenge;

pub use analysis::*;
pub use challenge::*;
