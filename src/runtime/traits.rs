//! Trait abstractions for runtime I/O
//!
//! Opening an action URL is the only side effect besides backend calls and
//! session persistence, which live behind their own traits.

use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpenError {
    #[error("Invalid action URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Unsupported URL scheme {scheme}, only http and https are allowed")]
    UnsupportedScheme { scheme: String },
}

/// Opens a URL in a new viewing context (tab, window, pager)
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), OpenError>;
}

impl<T: UrlOpener + ?Sized> UrlOpener for Arc<T> {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        (**self).open(url)
    }
}

/// Resolve an action URL against the application base
///
/// Backends usually suggest in-app paths such as `/tickets/12`; those need a
/// base. Absolute URLs pass through. Only http and https are accepted.
pub fn resolve_action_url(base: Option<&str>, url: &str) -> Result<String, OpenError> {
    let invalid = |reason: String| OpenError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let url = url.trim();
    if url.is_empty() {
        return Err(invalid("empty".to_string()));
    }

    let resolved = match base {
        Some(base) => Url::parse(base)
            .and_then(|b| b.join(url))
            .map_err(|e| invalid(e.to_string()))?,
        None => Url::parse(url).map_err(|e| invalid(format!("{e} (no application URL configured)")))?,
    };

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.to_string()),
        other => Err(OpenError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}
