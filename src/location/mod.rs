//! Save location resolution.
//!
//! Turns a session token into the descriptor of the save to download: one
//! lookup call, then a single selection rule applied to the response.
//!
//! # Sub-modules
//!
//! - [`lookup`]: Lookup trait and HTTP implementation.
//! - [`response`]: Tagged model of the lookup response.

pub mod lookup;
pub mod response;

use log::{error, info};
use url::Url;

use self::lookup::SaveLookup;
use self::response::{LookupResponse, RawSaveRecord};
use crate::error::{Result, SaveError};
use crate::session::SessionToken;

/// Why a save record's file reference is not a usable locator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The record has no `gameFile.url`.
    #[error("save record has no file reference")]
    Missing,

    /// The reference is not a URL.
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    /// The reference is a URL that cannot be downloaded over HTTP.
    #[error("unsupported locator scheme \"{scheme}\"")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },
}

/// The save selected for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRecordDescriptor {
    created_at: String,
    updated_at: Option<String>,
    object_id: Option<String>,
    locator: Url,
}

impl SaveRecordDescriptor {
    /// Creation timestamp as reported by the service.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Last modification timestamp, when reported.
    #[must_use]
    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Service-side identifier of the save object, when reported.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    /// Where to download the archive from.
    #[must_use]
    pub fn locator(&self) -> &Url {
        &self.locator
    }
}

/// Resolves a session to the descriptor of its active save.
pub struct SaveLocationResolver<'a> {
    lookup: &'a dyn SaveLookup,
}

impl<'a> SaveLocationResolver<'a> {
    /// Create a resolver over the given lookup service.
    #[must_use]
    pub fn new(lookup: &'a dyn SaveLookup) -> Self {
        Self { lookup }
    }

    /// Look up the saves for `session` and select the active one.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Lookup`] if the call fails, and the errors of
    /// [`select_save`] otherwise.
    pub fn resolve(&self, session: &SessionToken) -> Result<SaveRecordDescriptor> {
        let response = self.lookup.lookup(session)?;
        let descriptor = select_save(&response)?;
        info!(
            "selected save {} created at {}",
            descriptor.object_id().unwrap_or("<unnamed>"),
            descriptor.created_at()
        );
        Ok(descriptor)
    }
}

/// Select the active save from a lookup response.
///
/// The first record (a bare record counts as a one-element list) is the
/// active save if it carries a creation timestamp. Later records are never
/// consulted, even when the first one is unusable.
///
/// # Errors
///
/// Returns [`SaveError::NoSaveFound`] if there is no first record or it has
/// no creation timestamp, and [`SaveError::MalformedSaveLocation`] if its
/// file reference is not an HTTP(S) URL.
pub fn select_save(response: &LookupResponse) -> Result<SaveRecordDescriptor> {
    let Some((record, created_at)) = response
        .first()
        .and_then(|record| record.created_at.as_ref().map(|at| (record, at)))
    else {
        error!("lookup response holds no usable save: {response:?}");
        return Err(SaveError::NoSaveFound);
    };
    let locator = parse_locator(record)?;
    Ok(SaveRecordDescriptor {
        created_at: created_at.clone(),
        updated_at: record.updated_at.clone(),
        object_id: record.object_id.clone(),
        locator,
    })
}

fn parse_locator(record: &RawSaveRecord) -> Result<Url> {
    let raw = record
        .game_file
        .as_ref()
        .and_then(|file| file.url.as_deref());
    let malformed = |value: &str, source: LocatorError| {
        error!("cannot use save location \"{value}\": {source}");
        SaveError::MalformedSaveLocation {
            value: value.to_owned(),
            source,
        }
    };
    let Some(raw) = raw else {
        return Err(malformed("", LocatorError::Missing));
    };
    let url = Url::parse(raw).map_err(|e| malformed(raw, LocatorError::Parse(e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        let scheme = url.scheme().to_owned();
        return Err(malformed(raw, LocatorError::UnsupportedScheme { scheme }));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::lookup::{LookupError, MockSaveLookup};
    use crate::location::response::FileReference;
    use crate::test_utils::{SESSION, save_record};
    use rstest::rstest;

    fn session() -> SessionToken {
        SessionToken::try_from(SESSION).expect("valid session")
    }

    fn undated(url: &str) -> RawSaveRecord {
        RawSaveRecord {
            created_at: None,
            ..save_record(url)
        }
    }

    #[test]
    fn selects_first_dated_record() {
        let response = LookupResponse::List(vec![
            save_record("https://files.example.test/first.zip"),
            save_record("https://files.example.test/second.zip"),
        ]);
        let descriptor = select_save(&response).expect("select");
        assert_eq!(
            descriptor.locator().as_str(),
            "https://files.example.test/first.zip"
        );
        assert_eq!(descriptor.created_at(), "2023-06-01T12:00:00.000Z");
    }

    #[test]
    fn single_record_counts_as_one_element_list() {
        let response = LookupResponse::Single(save_record("https://files.example.test/a.zip"));
        assert!(select_save(&response).is_ok());
    }

    #[test]
    fn empty_response_is_no_save_found() {
        let result = select_save(&LookupResponse::Empty);
        assert!(matches!(result, Err(SaveError::NoSaveFound)));
    }

    #[test]
    fn undated_first_record_is_no_save_found_even_if_later_ones_are_dated() {
        let response = LookupResponse::List(vec![
            undated("https://files.example.test/first.zip"),
            save_record("https://files.example.test/second.zip"),
        ]);
        let result = select_save(&response);
        assert!(matches!(result, Err(SaveError::NoSaveFound)));
    }

    #[rstest]
    #[case::relative("save.zip")]
    #[case::garbage("http://[::1")]
    #[case::empty("")]
    fn unparseable_locator_is_malformed(#[case] url: &str) {
        let result = select_save(&LookupResponse::List(vec![save_record(url)]));
        assert!(matches!(
            result,
            Err(SaveError::MalformedSaveLocation {
                source: LocatorError::Parse(_),
                ..
            })
        ));
    }

    #[test]
    fn non_http_locator_is_malformed() {
        let result = select_save(&LookupResponse::List(vec![save_record(
            "file:///etc/passwd",
        )]));
        assert!(matches!(
            result,
            Err(SaveError::MalformedSaveLocation {
                source: LocatorError::UnsupportedScheme { .. },
                ..
            })
        ));
    }

    #[rstest]
    #[case::no_game_file(None)]
    #[case::no_url(Some(FileReference { url: None }))]
    fn missing_file_reference_is_malformed(#[case] game_file: Option<FileReference>) {
        let record = RawSaveRecord {
            game_file,
            ..save_record("https://unused.example.test")
        };
        let result = select_save(&LookupResponse::List(vec![record]));
        assert!(matches!(
            result,
            Err(SaveError::MalformedSaveLocation {
                source: LocatorError::Missing,
                ..
            })
        ));
    }

    #[test]
    fn resolve_calls_lookup_once_with_session() {
        let mut lookup = MockSaveLookup::new();
        lookup
            .expect_lookup()
            .withf(|token| token.as_str() == SESSION)
            .times(1)
            .returning(|_| {
                Ok(LookupResponse::List(vec![save_record(
                    "https://files.example.test/a.zip",
                )]))
            });

        let descriptor = SaveLocationResolver::new(&lookup)
            .resolve(&session())
            .expect("resolve");
        assert_eq!(descriptor.object_id(), Some("save-object"));
    }

    #[test]
    fn resolve_surfaces_lookup_failures_without_retry() {
        let mut lookup = MockSaveLookup::new();
        lookup.expect_lookup().times(1).returning(|_| {
            Err(LookupError::Http {
                url: "https://saves.example.test".to_owned(),
                reason: "connection reset".to_owned(),
            })
        });

        let result = SaveLocationResolver::new(&lookup).resolve(&session());
        assert!(matches!(result, Err(SaveError::Lookup(_))));
    }
}
