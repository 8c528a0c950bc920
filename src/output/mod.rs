use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::article::Article;
use crate::pipeline::Session;
use crate::render;
use crate::utils::word_count;
use crate::ConverterError;

/// Media type of exported articles
pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";

/// A file ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Package an article byte for byte
    pub fn named(article: &Article, file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            media_type: MARKDOWN_MEDIA_TYPE,
            bytes: article.as_str().as_bytes().to_vec(),
        }
    }
}

/// Export the article of a finished session
pub fn export(session: &Session, file_name: &str) -> Result<Artifact, ConverterError> {
    session
        .article
        .as_ref()
        .map(|article| Artifact::named(article, file_name))
        .ok_or(ConverterError::NothingToExport)
}

/// Write the artifact. A directory target receives the artifact's own file name.
pub fn save_to_file(artifact: &Artifact, path: &Path) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(&artifact.file_name)
    } else {
        path.to_path_buf()
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)
            .map_err(|e| ConverterError::ExportFailed(e.to_string()))?;
    }

    fs_err::write(&target, &artifact.bytes)
        .with_context(|| format!("Failed to export article to {}", target.display()))?;

    tracing::info!(bytes = artifact.bytes.len(), "Article exported to {}", target.display());
    Ok(target)
}

/// Machine-readable summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub session: &'a Session,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub article_words: usize,
}

impl<'a> RunReport<'a> {
    pub fn new(session: &'a Session, elapsed: Duration) -> Self {
        Self {
            session,
            finished_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
            article_words: session
                .article
                .as_ref()
                .map(|a| word_count(a.as_str()))
                .unwrap_or(0),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }
}

/// Print the article to the console, rendered or as raw markdown
pub fn print_to_console(article: &Article, rendered: bool) {
    if rendered {
        println!("{}", render::render(article.as_str()).to_terminal());
    } else {
        println!("{}", article);
    }
}
