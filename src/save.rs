//! The assembled save and the partial state it is built from.

use serde::Serialize;

use crate::archive::container::SectionKey;
use crate::error::{Result, SaveError};
use crate::location::SaveRecordDescriptor;
use crate::model::{GameProgress, GameSettings, GameUser, RecordDecodeError, RecordHistory};
use crate::section::DecodedSection;

/// Revision of the [`PhigrosSave`] shape produced by this crate.
pub const SAVE_FORMAT_VERSION: u8 = 1;

/// Sections decoded so far during one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSections {
    progress: Option<GameProgress>,
    user: Option<GameUser>,
    settings: Option<GameSettings>,
    records: Option<RecordHistory>,
}

impl DecodedSections {
    /// Store a decoded section in its slot, replacing any earlier value.
    pub fn insert(&mut self, section: DecodedSection) {
        match section {
            DecodedSection::Progress(progress) => self.progress = Some(progress),
            DecodedSection::User(user) => self.user = Some(user),
            DecodedSection::Settings(settings) => self.settings = Some(settings),
            DecodedSection::Records(records) => self.records = Some(records),
        }
    }

    /// Whether `section` has been decoded.
    #[must_use]
    pub fn contains(&self, section: SectionKey) -> bool {
        match section {
            SectionKey::GameProgress => self.progress.is_some(),
            SectionKey::User => self.user.is_some(),
            SectionKey::Settings => self.settings.is_some(),
            SectionKey::GameRecord => self.records.is_some(),
        }
    }

    /// The first section, in decode order, that has not been decoded.
    #[must_use]
    pub fn pending(&self) -> Option<SectionKey> {
        SectionKey::ORDER
            .into_iter()
            .find(|section| !self.contains(*section))
    }

    /// Build the save once every section is present.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::MissingSection`] naming the first empty slot.
    pub fn assemble(self, descriptor: SaveRecordDescriptor) -> Result<PhigrosSave> {
        let missing = |section| SaveError::MissingSection { section };
        Ok(PhigrosSave {
            format_version: SAVE_FORMAT_VERSION,
            progress: self.progress.ok_or_else(|| missing(SectionKey::GameProgress))?,
            user: self.user.ok_or_else(|| missing(SectionKey::User))?,
            settings: self.settings.ok_or_else(|| missing(SectionKey::Settings))?,
            records: self.records.ok_or_else(|| missing(SectionKey::GameRecord))?,
            descriptor,
        })
    }
}

/// A fully decoded cloud save.
///
/// Built once per successful run and never mutated; a later run for the
/// same session produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhigrosSave {
    format_version: u8,
    #[serde(skip)]
    descriptor: SaveRecordDescriptor,
    progress: GameProgress,
    user: GameUser,
    settings: GameSettings,
    records: RecordHistory,
}

impl PhigrosSave {
    /// Revision of this save's shape, currently [`SAVE_FORMAT_VERSION`].
    #[must_use]
    pub const fn format_version(&self) -> u8 {
        self.format_version
    }

    /// The lookup record the archive was fetched from.
    #[must_use]
    pub const fn descriptor(&self) -> &SaveRecordDescriptor {
        &self.descriptor
    }

    /// Decoded `gameProgress`.
    #[must_use]
    pub const fn progress(&self) -> &GameProgress {
        &self.progress
    }

    /// Decoded `user`.
    #[must_use]
    pub const fn user(&self) -> &GameUser {
        &self.user
    }

    /// Decoded `settings`.
    #[must_use]
    pub const fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Decoded `gameRecord`.
    #[must_use]
    pub const fn records(&self) -> &RecordHistory {
        &self.records
    }

    /// Song records that failed to decode; empty when none did.
    #[must_use]
    pub fn record_errors(&self) -> &[RecordDecodeError] {
        self.records.errors()
    }

    /// Whether every song record decoded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.record_errors().is_empty()
    }
}
