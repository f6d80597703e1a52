//! Praxis API Client

use std::path::Path;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use praxis::domain::timestamp;
use praxis::ports::{FileAttachment, StreamRequest};
use praxis::stream::{LiveSession, StreamOptions};
use praxis::{Challenge, ResumeAnalysis, SessionKind};

use crate::attachment::attachment_from_path;
use crate::config::ClientConfig;
use crate::error::{api_message, ClientError};
use crate::transport::HttpTransport;

/// API Client for Praxis
pub struct PraxisClient {
    client: Client,
    transport: HttpTransport,
}

// ============================================
// API Response Types
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub id: i64,
    pub profile_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_content: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub has_analysis: bool,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size_bytes: Option<u64>,
}

impl ResumeResponse {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.original_filename.as_deref())
            .unwrap_or("(sem título)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAnalysisResponse {
    pub id: i64,
    pub resume_id: i64,
    #[serde(default)]
    pub strengths: Option<String>,
    #[serde(default)]
    pub improvements: Option<String>,
    #[serde(default)]
    pub full_report: Option<serde_json::Value>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl ResumeAnalysisResponse {
    /// Stored report in the same shape the stream's `complete` record carries
    pub fn report(&self) -> Option<ResumeAnalysis> {
        let report = self.full_report.clone()?;
        match ResumeAnalysis::from_value(report) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(analysis_id = self.id, error = %e, "Stored report could not be parsed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeWithAnalysis {
    pub resume: ResumeResponse,
    #[serde(default)]
    pub analysis: Option<ResumeAnalysisResponse>,
}

impl PraxisClient {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        let transport = HttpTransport::with_client(client.clone(), config);
        Ok(Self { client, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    // ============================================
    // Streaming
    // ============================================

    /// Open a session with explicit options
    pub async fn open_session(
        &self,
        request: StreamRequest,
        kind: SessionKind,
        options: StreamOptions,
    ) -> LiveSession {
        LiveSession::open(&self.transport, request, kind, options).await
    }

    /// Stream a fresh batch of challenges
    pub async fn generate_challenges(&self) -> LiveSession {
        self.open_session(
            StreamRequest::post("/challenges/generate/stream"),
            SessionKind::Challenges,
            self.config().stream.clone(),
        )
        .await
    }

    /// Stream the analysis of a stored résumé
    pub async fn analyze_resume(&self, resume_id: i64) -> LiveSession {
        self.open_session(
            StreamRequest::get(format!("/resumes/{}/analyze/stream", resume_id)),
            SessionKind::Analysis,
            self.config().stream.clone(),
        )
        .await
    }

    /// Upload a résumé and stream its analysis in one request
    pub async fn upload_and_analyze(&self, file: FileAttachment, title: Option<&str>) -> LiveSession {
        let fields = title
            .map(|t| vec![("title".to_string(), t.to_string())])
            .unwrap_or_default();

        tracing::info!(file = %file.file_name, size = file.bytes.len(), "Uploading résumé");

        self.open_session(
            StreamRequest::post("/resumes/upload/file/analyze").with_file(file, fields),
            SessionKind::Analysis,
            self.config().stream.clone(),
        )
        .await
    }

    /// Read a file from disk, then `upload_and_analyze` it
    pub async fn upload_path(&self, path: &Path, title: Option<&str>) -> Result<LiveSession, ClientError> {
        let file = attachment_from_path(path).await?;
        Ok(self.upload_and_analyze(file, title).await)
    }

    // ============================================
    // REST
    // ============================================

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .client
            .get(self.config().url("/healthz"))
            .timeout(self.config().timeout)
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Most recent challenges of the authenticated user
    pub async fn active_challenges(&self, limit: Option<usize>) -> Result<Vec<Challenge>, ClientError> {
        let mut request = self.client.get(self.config().url("/challenges/active"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.fetch(request).await
    }

    pub async fn get_challenge(&self, challenge_id: i64) -> Result<Challenge, ClientError> {
        let request = self
            .client
            .get(self.config().url(&format!("/challenges/{}", challenge_id)));
        self.fetch(request).await
    }

    pub async fn list_resumes(&self) -> Result<Vec<ResumeResponse>, ClientError> {
        let request = self.client.get(self.config().url("/resumes/"));
        self.fetch(request).await
    }

    /// Résumé with its analysis, if one exists
    pub async fn get_resume(&self, resume_id: i64) -> Result<ResumeWithAnalysis, ClientError> {
        let request = self
            .client
            .get(self.config().url(&format!("/resumes/{}", resume_id)));
        self.fetch(request).await
    }

    pub async fn delete_resume(&self, resume_id: i64) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.config().url(&format!("/resumes/{}", resume_id)));
        self.send(request).await?;
        tracing::info!(resume_id, "Résumé deleted");
        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let resp = self
            .transport
            .authorize(request)
            .timeout(self.config().timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: api_message(&body),
            });
        }

        Ok(resp)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let resp = self.send(request).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resume_with_analysis_from_backend_row() {
        let payload = json!({
            "resume": {
                "id": 4,
                "profile_id": "u-1",
                "title": null,
                "original_content": "# João",
                "created_at": "2025-03-01T10:20:30.123456",
                "has_analysis": true,
                "original_filename": "cv.pdf"
            },
            "analysis": {
                "id": 9,
                "resume_id": 4,
                "full_report": {"nota_geral": 72, "resumo_executivo": "Sólido"},
                "created_at": "2025-03-01T10:21:00"
            }
        });

        let parsed: ResumeWithAnalysis = serde_json::from_value(payload).unwrap();

        assert_eq!(parsed.resume.display_title(), "cv.pdf");
        let report = parsed.analysis.unwrap().report().unwrap();
        assert_eq!(report.nota_geral, 72);
    }
}
