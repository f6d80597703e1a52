//! Client configuration

use std::time::Duration;

use praxis::stream::StreamOptions;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for talking to the backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Bearer token sent with every request
    pub access_token: Option<String>,
    /// Deadline for plain REST calls. Streams are not bounded by it.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Options for sessions opened by the client
    pub stream: StreamOptions,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.stream = options;
        self
    }

    /// Absolute URL for a path relative to the API root
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            stream: StreamOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let config = ClientConfig::new("http://api.local/");
        assert_eq!(config.url("/healthz"), "http://api.local/healthz");
        assert_eq!(config.url("resumes/"), "http://api.local/resumes/");
    }
}
