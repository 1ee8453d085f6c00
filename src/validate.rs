use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

static HOST_RE: OnceLock<Regex> = OnceLock::new();

fn host_regex() -> &'static Regex {
    HOST_RE.get_or_init(|| Regex::new(r"x\.com|twitter\.com").expect("failed to compile host regex"))
}

/// Trait for validating identifiers extracted from user input.
///
/// Implementors should:
/// - Check that the input belongs to the platform.
/// - Canonicalize if needed.
/// - Return `Ok(canonical)` on success or `Err(Error::InvalidUrl(..))` on failure.
pub trait Validate {
    /// Validate the input and return a canonicalized String.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` when the input is not accepted.
    fn validate(&self, input: &str) -> Result<String>;
}

/// Recognizes X (Twitter) links.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlClassifier;

impl UrlClassifier {
    /// True if `text` mentions `x.com` or `twitter.com` anywhere.
    #[must_use]
    pub fn is_supported(&self, text: &str) -> bool {
        host_regex().is_match(text)
    }
}

impl Validate for UrlClassifier {
    fn validate(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if !self.is_supported(trimmed) {
            return Err(Error::InvalidUrl(trimmed.to_owned()));
        }
        Ok(Url::parse(trimmed).map_or_else(|_| trimmed.to_owned(), String::from))
    }
}
