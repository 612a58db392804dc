//! Per-section version gating.

use std::collections::BTreeMap;

use log::warn;
use thiserror::Error;

use crate::archive::container::SectionKey;
use crate::decode::SectionDecoders;
use crate::error::{Result, SaveError};

/// Error returned when a gate entry targets `gameRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the {0} section is always checked against the record decoder's version")]
pub struct FixedGate(pub SectionKey);

/// Expected version tags for the sections that are gated.
///
/// `gameRecord` is always checked against
/// [`SectionDecoders::record_version`] and cannot be relaxed or moved. The
/// table only adds gates for the other sections, which are read without a
/// version check unless they opt in with [`VersionGate::with_section`] or
/// through configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionGate {
    extra: BTreeMap<SectionKey, u8>,
}

impl VersionGate {
    /// A gate that checks only `gameRecord`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate `section` at `version`, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// Returns [`FixedGate`] for [`SectionKey::GameRecord`].
    pub fn with_section(
        mut self,
        section: SectionKey,
        version: u8,
    ) -> std::result::Result<Self, FixedGate> {
        if section == SectionKey::GameRecord {
            return Err(FixedGate(section));
        }
        self.extra.insert(section, version);
        Ok(self)
    }

    /// The version `section` must carry when read through `decoders`, if it
    /// is gated.
    #[must_use]
    pub fn expected(&self, section: SectionKey, decoders: &dyn SectionDecoders) -> Option<u8> {
        match section {
            SectionKey::GameRecord => Some(decoders.record_version()),
            other => self.extra.get(&other).copied(),
        }
    }

    /// Check the tag read from `section`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::UnsupportedVersion`] if the section is gated and
    /// `found` differs from the expected tag.
    pub fn check(
        &self,
        section: SectionKey,
        found: u8,
        decoders: &dyn SectionDecoders,
    ) -> Result<()> {
        match self.expected(section, decoders) {
            Some(expected) if expected != found => {
                warn!("{section} section has version {found}, expected {expected}");
                Err(SaveError::UnsupportedVersion {
                    section,
                    found,
                    expected,
                })
            }
            _ => Ok(()),
        }
    }
}
