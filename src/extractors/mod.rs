use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod youtube;

use crate::FailureReason;

/// Length of a canonical YouTube video identifier
pub const VIDEO_ID_LEN: usize = 11;

/// Canonical video identifier, independent of the URL shape it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoReference(String);

impl VideoReference {
    /// Accepts exactly 11 URL-safe characters
    pub fn parse(id: &str) -> Option<Self> {
        is_video_id(id).then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoReference {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a video id: {value}"))
    }
}

impl From<VideoReference> for String {
    fn from(value: VideoReference) -> Self {
        value.0
    }
}

pub(crate) fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// One recognized input shape
pub trait ReferenceExtractor: Send + Sync {
    /// Raw identifier candidate if the input has this shape
    fn extract<'a>(&self, input: &'a str) -> Option<&'a str>;

    /// Name of the shape, for logs
    fn shape_name(&self) -> &'static str;
}

/// Ordered set of extractors. The first one that matches wins.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ReferenceExtractor>>,
}

impl ExtractorRegistry {
    /// Create a registry with the YouTube shapes in priority order.
    ///
    /// The bare-identifier shape must stay last: it would otherwise claim inputs that a URL
    /// shape is meant to handle.
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: Vec::new(),
        };

        registry.register(Box::new(youtube::WatchUrlExtractor));
        registry.register(Box::new(youtube::ShortLinkExtractor));
        registry.register(Box::new(youtube::EmbedLinkExtractor));
        registry.register(Box::new(youtube::BareIdExtractor));

        registry
    }

    /// Append an extractor with the lowest priority so far
    pub fn register(&mut self, extractor: Box<dyn ReferenceExtractor>) {
        self.extractors.push(extractor);
    }

    /// List the recognized shapes in priority order
    pub fn list_shapes(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.shape_name()).collect()
    }

    /// Resolve input into a reference, or `InvalidReference`
    pub fn resolve(&self, input: &str) -> Result<VideoReference, FailureReason> {
        let trimmed = input.trim();
        let invalid = || FailureReason::InvalidReference(input.to_string());

        let (shape, candidate) = self
            .extractors
            .iter()
            .find_map(|e| e.extract(trimmed).map(|c| (e.shape_name(), c)))
            .ok_or_else(|| {
                tracing::debug!(shapes = ?self.list_shapes(), "No reference shape matched");
                invalid()
            })?;

        tracing::debug!(shape, candidate, "Matched reference shape");

        VideoReference::parse(candidate).ok_or_else(invalid)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: Lazy<ExtractorRegistry> = Lazy::new(ExtractorRegistry::new);

/// Resolve user input with the default YouTube shapes
pub fn resolve(input: &str) -> Result<VideoReference, FailureReason> {
    DEFAULT_REGISTRY.resolve(input)
}
