//! Named-stream container over a downloaded save archive.
//!
//! Cloud saves are zip archives holding four entries, one per section.
//! [`ArchiveHandle`] keeps the whole archive in memory and hands out the
//! full contents of an entry by its [`SectionKey`].

use std::fmt;
use std::io::{Cursor, Read};
use std::str::FromStr;

use zip::ZipArchive;
use zip::result::ZipError;

/// The four sections of a cloud save, in decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKey {
    /// Chapter and currency progress (`gameProgress`).
    GameProgress,
    /// Public profile (`user`).
    User,
    /// Client settings (`settings`).
    Settings,
    /// Per-song play records (`gameRecord`).
    GameRecord,
}

impl SectionKey {
    /// Every section, in the order the pipeline decodes them.
    pub const ORDER: [Self; 4] = [Self::GameProgress, Self::User, Self::Settings, Self::GameRecord];

    /// The archive entry name for this section.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GameProgress => "gameProgress",
            Self::User => "user",
            Self::Settings => "settings",
            Self::GameRecord => "gameRecord",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown save section \"{0}\"")]
pub struct UnknownSection(pub String);

impl FromStr for SectionKey {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_owned()))
    }
}

/// An opened save archive.
///
/// Owned by a single pipeline run and dropped once every section has been
/// extracted.
pub struct ArchiveHandle {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveHandle {
    /// Open `blob` as a zip container.
    ///
    /// # Errors
    ///
    /// Returns the zip error if the blob is corrupt or truncated.
    pub fn open(blob: Vec<u8>) -> Result<Self, ZipError> {
        let archive = ZipArchive::new(Cursor::new(blob))?;
        Ok(Self { archive })
    }

    /// Number of entries in the archive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read the full contents of the entry for `key`.
    ///
    /// Returns `Ok(None)` when the archive has no such entry.
    ///
    /// # Errors
    ///
    /// Returns the zip error if the entry exists but cannot be read.
    pub fn section(&mut self, key: SectionKey) -> Result<Option<Vec<u8>>, ZipError> {
        let mut entry = match self.archive.by_name(key.as_str()) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(other) => return Err(other),
        };
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }
}

impl fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("entries", &self.archive.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_archive;
    use rstest::rstest;

    #[rstest]
    #[case(SectionKey::GameProgress, "gameProgress")]
    #[case(SectionKey::User, "user")]
    #[case(SectionKey::Settings, "settings")]
    #[case(SectionKey::GameRecord, "gameRecord")]
    fn keys_round_trip_through_their_names(#[case] key: SectionKey, #[case] name: &str) {
        assert_eq!(key.as_str(), name);
        assert_eq!(name.parse::<SectionKey>(), Ok(key));
    }

    #[test]
    fn parsing_an_unknown_key_fails() {
        assert_eq!(
            "gamerecord".parse::<SectionKey>(),
            Err(UnknownSection("gamerecord".to_owned()))
        );
    }

    #[test]
    fn reads_named_entries() {
        let blob = build_archive(&[("user", b"\x01abc".to_vec())]);
        let mut handle = ArchiveHandle::open(blob).expect("open archive");
        assert_eq!(handle.len(), 1);
        assert_eq!(
            handle.section(SectionKey::User).expect("read"),
            Some(b"\x01abc".to_vec())
        );
    }

    #[test]
    fn absent_entries_are_none() {
        let blob = build_archive(&[("user", vec![1])]);
        let mut handle = ArchiveHandle::open(blob).expect("open archive");
        assert_eq!(handle.section(SectionKey::Settings).expect("read"), None);
    }

    #[rstest]
    #[case::garbage(b"definitely not a zip".to_vec())]
    #[case::empty(Vec::new())]
    fn rejects_corrupt_blobs(#[case] blob: Vec<u8>) {
        assert!(ArchiveHandle::open(blob).is_err());
    }

    #[test]
    fn rejects_truncated_archive() {
        let mut blob = build_archive(&[("user", vec![1, 2, 3])]);
        blob.truncate(blob.len() / 2);
        assert!(ArchiveHandle::open(blob).is_err());
    }
}
