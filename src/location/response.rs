//! Lookup service response model.
//!
//! The service answers with a JSON object whose `results` member is either
//! a list of save records or, from some gateways, a bare record. Both shapes
//! and the "nothing there" case are folded into [`LookupResponse`] at parse
//! time so that selection never has to inspect the JSON.

use serde::Deserialize;

/// A save record exactly as the lookup service describes it.
///
/// Every field is optional here; [`super::select_save`] decides which
/// absences are fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSaveRecord {
    /// Service-side identifier of the save object.
    #[serde(default)]
    pub object_id: Option<String>,
    /// Creation timestamp; a record without one is not a usable save.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last modification timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Reference to the archive file.
    #[serde(default)]
    pub game_file: Option<FileReference>,
}

/// The nested file object of a save record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileReference {
    /// Download URL of the archive, unparsed.
    #[serde(default)]
    pub url: Option<String>,
}

/// The shape-normalised answer of a lookup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResponse {
    /// The service returned a single bare record.
    Single(RawSaveRecord),
    /// The service returned a non-empty list of records.
    List(Vec<RawSaveRecord>),
    /// The service returned nothing usable.
    Empty,
}

impl LookupResponse {
    /// Parse a lookup response body.
    ///
    /// A body without a `results` member, or with `null` or an empty list,
    /// parses as [`LookupResponse::Empty`]. Only the first list element has
    /// to be a record; later elements that are not are dropped.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is not JSON, `results` has an
    /// unexpected shape or the first list element is not a record.
    ///
    /// # Examples
    ///
    /// ```
    /// use phigros_save::location::response::LookupResponse;
    ///
    /// let response = LookupResponse::from_json(r#"{"results":[]}"#).unwrap();
    /// assert_eq!(response, LookupResponse::Empty);
    /// ```
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(body)?;
        Ok(match envelope.results {
            None => Self::Empty,
            Some(Payload::Single(record)) => Self::Single(record),
            Some(Payload::List(values)) => {
                let mut values = values.into_iter();
                match values.next() {
                    None => Self::Empty,
                    Some(first) => {
                        let first: RawSaveRecord = serde_json::from_value(first)?;
                        let rest = values.filter_map(|value| serde_json::from_value(value).ok());
                        Self::List(std::iter::once(first).chain(rest).collect())
                    }
                }
            }
        })
    }

    /// The record selection starts from: the bare record, or the first
    /// element of the list.
    #[must_use]
    pub fn first(&self) -> Option<&RawSaveRecord> {
        match self {
            Self::Single(record) => Some(record),
            Self::List(records) => records.first(),
            Self::Empty => None,
        }
    }
}

impl From<Vec<RawSaveRecord>> for LookupResponse {
    fn from(records: Vec<RawSaveRecord>) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::List(records)
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Option<Payload>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<serde_json::Value>),
    Single(RawSaveRecord),
}
