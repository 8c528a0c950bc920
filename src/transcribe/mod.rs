use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BackendConfig;
use crate::FailureReason;

/// Fallback message when the backend gives no reason of its own
pub const GENERIC_ACQUISITION_ERROR: &str = "Failed to fetch transcript";

/// Raw spoken-content text for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// The transcript text
    pub text: String,

    /// Language reported by the backend, absent for manual input
    pub language: Option<String>,

    /// Video identifier reported by the backend, absent for manual input
    pub video_id: Option<String>,
}

impl Transcript {
    /// Transcript pasted or loaded by the user
    pub fn manual(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            video_id: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Source of transcripts for the automatic path
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for the user's original (unresolved) input.
    ///
    /// A single attempt; every failure comes back as `AcquisitionFailed`.
    async fn fetch_transcript(&self, input: &str) -> Result<Transcript, FailureReason>;
}

#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    url: &'a str,
}

/// Body of both success and error responses of the backend
#[derive(Debug, Default, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Reply of the backend health endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Transcript backend reached over HTTP
pub struct HttpTranscriptSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptSource {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn transcript_endpoint(&self) -> String {
        format!("{}/api/transcript", self.base_url)
    }

    pub fn health_endpoint(&self) -> String {
        format!("{}/api/health", self.base_url)
    }

    /// Ask the backend whether it is running
    pub async fn health(&self) -> anyhow::Result<HealthStatus> {
        let url = self.health_endpoint();
        tracing::debug!("Checking backend health at {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Backend health check failed: HTTP {}", response.status());
        }

        Ok(response.json::<HealthStatus>().await?)
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch_transcript(&self, input: &str) -> Result<Transcript, FailureReason> {
        let url = self.transcript_endpoint();
        tracing::info!("Requesting transcript from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&TranscriptRequest { url: input })
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Transcript backend unreachable: {}", e);
                FailureReason::AcquisitionFailed(e.to_string())
            })?;

        let status = response.status();
        // An undecodable body is treated like a body without a message
        let body = response
            .json::<TranscriptResponse>()
            .await
            .unwrap_or_else(|e| {
                tracing::debug!("Could not decode backend response: {}", e);
                TranscriptResponse::default()
            });

        interpret_response(status.is_success(), body)
    }
}

fn interpret_response(success: bool, body: TranscriptResponse) -> Result<Transcript, FailureReason> {
    let failure = |message: Option<String>| {
        let detail = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ACQUISITION_ERROR.to_string());
        tracing::debug!("Transcript acquisition failed: {}", detail);
        FailureReason::AcquisitionFailed(detail)
    };

    if !success || body.status.as_deref() == Some("error") {
        return Err(failure(body.message));
    }

    match body.transcript {
        Some(text) if !text.trim().is_empty() => {
            tracing::info!(
                language = body.language.as_deref().unwrap_or("unknown"),
                chars = text.chars().count(),
                "Transcript received"
            );
            Ok(Transcript {
                text,
                language: body.language,
                video_id: body.video_id,
            })
        }
        _ => Err(failure(body.message)),
    }
}
