//! Archive download.
//!
//! Provides a trait-based abstraction for fetching the opaque archive blob
//! from a resolved save location, enabling dependency injection for tests.

use url::Url;

use crate::config::TransportConfig;

/// Trait for downloading a save archive.
///
/// Abstractions allow tests to serve archives without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveTransport {
    /// Download the body at `locator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be read.
    fn download(&self, locator: &Url) -> Result<Vec<u8>, TransportError>;
}

/// Errors arising from archive download.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The archive was not found (HTTP 404).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },
}

/// HTTP-based transport using `ureq`.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Build a transport from the `[transport]` configuration table.
    #[must_use]
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            agent: crate::http::agent(config.timeout()),
        }
    }
}

impl ArchiveTransport for HttpTransport {
    fn download(&self, locator: &Url) -> Result<Vec<u8>, TransportError> {
        let url = locator.as_str();
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_vec()
            .map_err(|e| TransportError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Map a ureq error to a [`TransportError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> TransportError {
    match crate::http::status_of(err) {
        Some(404) => TransportError::NotFound {
            url: url.to_owned(),
        },
        _ => TransportError::Http {
            url: url.to_owned(),
            reason: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/save.zip", &err);
        assert!(matches!(mapped, TransportError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(503);
        let mapped = map_ureq_error("https://example.test/save.zip", &err);
        match mapped {
            TransportError::Http { url, reason } => {
                assert_eq!(url, "https://example.test/save.zip");
                assert!(reason.contains("503"), "reason: {reason}");
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }
}
