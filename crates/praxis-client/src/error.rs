//! Client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401 | 403, .. })
    }
}

/// Human-readable message from an error body.
///
/// FastAPI answers `{"detail": "..."}`, or a list of validation errors
/// under `detail`; anything else is passed through as-is.
pub(crate) fn api_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string() {
        assert_eq!(api_message(r#"{"detail": "Currículo não encontrado"}"#), "Currículo não encontrado");
    }

    #[test]
    fn test_detail_validation_list() {
        let body = r#"{"detail": [{"loc": ["query", "limit"], "msg": "too large"}, {"msg": "bad"}]}"#;
        assert_eq!(api_message(body), "too large; bad");
    }

    #[test]
    fn test_plain_body() {
        assert_eq!(api_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_status_helpers() {
        let err = ClientError::Api {
            status: 404,
            message: "x".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());
    }
}
