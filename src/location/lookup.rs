//! Save lookup service client.
//!
//! The cloud save service exposes the player's save objects as a LeanCloud
//! class. A lookup is one authenticated `GET` returning the newest save
//! object; [`HttpSaveLookup`] performs it with `ureq`, and the
//! [`SaveLookup`] trait lets tests substitute canned responses.

use super::response::LookupResponse;
use crate::config::{LookupConfig, TransportConfig};
use crate::session::SessionToken;

/// Path of the save object class, relative to the service base URL.
const GAME_SAVE_PATH: &str = "/1.1/classes/_GameSave?limit=1";

/// Trait for querying the save lookup service.
#[cfg_attr(test, mockall::automock)]
pub trait SaveLookup {
    /// Fetch the save records visible to `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be parsed.
    fn lookup(&self, session: &SessionToken) -> Result<LookupResponse, LookupError>;
}

/// Errors arising from the lookup call.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("lookup request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The lookup endpoint was not found (HTTP 404).
    #[error("lookup endpoint not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The response body is not a lookup response.
    #[error("malformed lookup response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// HTTP-based lookup using `ureq`.
#[derive(Clone)]
pub struct HttpSaveLookup {
    agent: ureq::Agent,
    config: LookupConfig,
}

impl HttpSaveLookup {
    /// Build a lookup client from the `[lookup]` and `[transport]` tables.
    #[must_use]
    pub fn new(config: &LookupConfig, transport: &TransportConfig) -> Self {
        Self {
            agent: crate::http::agent(transport.timeout()),
            config: config.clone(),
        }
    }

    /// The full URL queried for save records.
    ///
    /// # Examples
    ///
    /// ```
    /// use phigros_save::config::{LookupConfig, TransportConfig};
    /// use phigros_save::location::lookup::HttpSaveLookup;
    ///
    /// let lookup = HttpSaveLookup::new(&LookupConfig::default(), &TransportConfig::default());
    /// assert!(lookup.endpoint().ends_with("/1.1/classes/_GameSave?limit=1"));
    /// ```
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}{GAME_SAVE_PATH}",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl SaveLookup for HttpSaveLookup {
    fn lookup(&self, session: &SessionToken) -> Result<LookupResponse, LookupError> {
        let url = self.endpoint();
        let response = self
            .agent
            .get(&url)
            .header("X-LC-Id", &self.config.app_id)
            .header("X-LC-Key", &self.config.app_key)
            .header("User-Agent", &self.config.user_agent)
            .header("X-LC-Session", session.as_str())
            .call()
            .map_err(|e| map_ureq_error(&url, &e))?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| LookupError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(LookupResponse::from_json(&body)?)
    }
}

/// Map a ureq error to a [`LookupError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> LookupError {
    match crate::http::status_of(err) {
        Some(404) => LookupError::NotFound {
            url: url.to_owned(),
        },
        _ => LookupError::Http {
            url: url.to_owned(),
            reason: err.to_string(),
        },
    }
}
