use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_video_id, ReferenceExtractor};

// Identifier runs up to the next query/fragment delimiter, as the transcript backend parses it.
// The first `v=` parameter wins.
static WATCH_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"youtube\.com/watch\?(?:[^#\s]*?&)??v=([^&\n?#]+)").expect("valid regex")
});
static SHORT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtu\.be/([^&\n?#]+)").expect("valid regex"));
static EMBED_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/embed/([^&\n?#]+)").expect("valid regex"));

fn first_capture<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `youtube.com/watch?v=ID`
pub struct WatchUrlExtractor;

impl ReferenceExtractor for WatchUrlExtractor {
    fn extract<'a>(&self, input: &'a str) -> Option<&'a str> {
        first_capture(&WATCH_URL, input)
    }

    fn shape_name(&self) -> &'static str {
        "watch-url"
    }
}

/// `youtu.be/ID`
pub struct ShortLinkExtractor;

impl ReferenceExtractor for ShortLinkExtractor {
    fn extract<'a>(&self, input: &'a str) -> Option<&'a str> {
        first_capture(&SHORT_LINK, input)
    }

    fn shape_name(&self) -> &'static str {
        "short-link"
    }
}

/// `youtube.com/embed/ID`
pub struct EmbedLinkExtractor;

impl ReferenceExtractor for EmbedLinkExtractor {
    fn extract<'a>(&self, input: &'a str) -> Option<&'a str> {
        first_capture(&EMBED_LINK, input)
    }

    fn shape_name(&self) -> &'static str {
        "embed-link"
    }
}

/// The whole input is an identifier
pub struct BareIdExtractor;

impl ReferenceExtractor for BareIdExtractor {
    fn extract<'a>(&self, input: &'a str) -> Option<&'a str> {
        is_video_id(input).then_some(input)
    }

    fn shape_name(&self) -> &'static str {
        "bare-id"
    }
}
