//! HTTP client for the Praxis backend
//!
//! Provides the reqwest-backed `StreamTransport` used by the streaming core,
//! plus the plain REST calls the CLI needs around it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use praxis_client::{ClientConfig, PraxisClient};
//!
//! let config = ClientConfig::new("http://localhost:8000").with_access_token("token");
//! let client = PraxisClient::new(config)?;
//! let board = client.analyze_resume(4).await.run().await;
//! ```

mod attachment;
mod client;
mod config;
mod error;
mod transport;

pub use attachment::{attachment_from_path, mime_for_path};
pub use client::{PraxisClient, ResumeAnalysisResponse, ResumeResponse, ResumeWithAnalysis};
pub use config::ClientConfig;
pub use error::ClientError;
pub use transport::HttpTransport;
