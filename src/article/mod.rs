use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod prompt;

use crate::config::WriterConfig;
use crate::FailureReason;

/// Built-in endpoint of the rewriting service
pub const MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// API version header value expected by the endpoint
pub const API_VERSION: &str = "2023-06-01";

/// Detail reported for any non-success reply; the service's error body is not surfaced
pub const GENERIC_TRANSFORMATION_ERROR: &str = "Generative service returned an error";

/// Markdown article produced from a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Article(String);

impl Article {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self(markdown.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rewrites a transcript into an article
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleWriter: Send + Sync {
    /// One request, no retries; every failure comes back as `TransformationFailed`.
    async fn write_article(&self, transcript: &str) -> Result<Article, FailureReason>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Writer backed by the Claude messages API
pub struct ClaudeArticleWriter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeArticleWriter {
    /// Build the writer. The API key is read from the configured environment variable and
    /// sent only when present.
    pub fn new(config: &WriterConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => {
                let mut value = HeaderValue::from_str(&key)
                    .map_err(|e| anyhow::anyhow!("Invalid API key header value: {}", e))?;
                value.set_sensitive(true);
                headers.insert("x-api-key", value);
            }
            _ => tracing::debug!("{} not set, calling without an API key", config.api_key_env),
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: MESSAGES_ENDPOINT.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Send requests to another messages endpoint, such as a proxy
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, transcript: &str) -> MessagesRequest<'_> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt::build_prompt(transcript),
            }],
        }
    }
}

#[async_trait]
impl ArticleWriter for ClaudeArticleWriter {
    async fn write_article(&self, transcript: &str) -> Result<Article, FailureReason> {
        tracing::info!(model = %self.model, "Formatting transcript into an article");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(transcript))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Generative service unreachable: {}", e);
                FailureReason::TransformationFailed(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::debug!("Generative service replied HTTP {}", response.status());
            return Err(FailureReason::TransformationFailed(
                GENERIC_TRANSFORMATION_ERROR.to_string(),
            ));
        }

        let body = response.json::<MessagesResponse>().await.map_err(|e| {
            FailureReason::TransformationFailed(format!("Invalid response body: {}", e))
        })?;

        extract_article(body)
    }
}

fn extract_article(body: MessagesResponse) -> Result<Article, FailureReason> {
    body.content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .map(Article::new)
        .ok_or_else(|| {
            FailureReason::TransformationFailed("Response contained no article text".to_string())
        })
}
