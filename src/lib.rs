//! vid2article - turn the spoken content of a YouTube video into a structured markdown article
//!
//! The library resolves a video reference, fetches its transcript from a transcript backend,
//! asks a generative text service to rewrite it as an article, and renders or exports the result.
//! The [`pipeline`] module ties these stages together as an explicit state machine.

pub mod article;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod transcribe;
pub mod utils;

pub use article::{Article, ArticleWriter, ClaudeArticleWriter};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use extractors::{resolve, VideoReference};
pub use output::Artifact;
pub use pipeline::{Event, Pipeline, PipelineState, Session};
pub use render::{render, Document};
pub use transcribe::{HttpTranscriptSource, Transcript, TranscriptSource};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Why a run did not (yet) produce an article.
///
/// Every remote-call failure is converted into one of these at the boundary of the component
/// that made the call. The pipeline decides which ones are recoverable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "category", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("Invalid YouTube link or video ID: {0:?}")]
    InvalidReference(String),

    #[error("Could not fetch the transcript automatically: {0}. Paste the transcript manually.")]
    AcquisitionFailed(String),

    #[error("Article formatting failed: {0}")]
    TransformationFailed(String),

    #[error("Please paste a transcript")]
    EmptyManualInput,
}

impl FailureReason {
    /// Stable machine-readable category name
    pub fn category(&self) -> &'static str {
        match self {
            FailureReason::InvalidReference(_) => "invalid_reference",
            FailureReason::AcquisitionFailed(_) => "acquisition_failed",
            FailureReason::TransformationFailed(_) => "transformation_failed",
            FailureReason::EmptyManualInput => "empty_manual_input",
        }
    }
}

/// Errors of the tool itself, outside of a conversion run
#[derive(thiserror::Error, Debug)]
pub enum ConverterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("No article to export")]
    NothingToExport,
}
