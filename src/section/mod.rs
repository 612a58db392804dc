//! Per-section extraction, gating, decryption and decoding.
//!
//! # Sub-modules
//!
//! - [`cipher`]: the [`SectionDecryptor`] trait and the AES implementation.
//! - [`gate`]: the per-section [`VersionGate`] table.
//!
//! Every stored section is one version byte followed by ciphertext.
//! [`SectionPipeline`] strips the tag, decrypts the body, checks the tag
//! against the gate, then hands the plain bytes to the matching decoder.

pub mod cipher;
pub mod gate;

use log::{debug, warn};

use crate::archive::container::{ArchiveHandle, SectionKey};
use crate::cursor::ByteCursor;
use crate::decode::SectionDecoders;
use crate::error::{Result, SaveError};
use crate::model::{GameProgress, GameSettings, GameUser, RecordHistory};

pub use cipher::{AesSectionCipher, DecryptError, SectionDecryptor};
pub use gate::{FixedGate, VersionGate};

/// One decoded section.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedSection {
    /// `gameProgress`.
    Progress(GameProgress),
    /// `user`.
    User(GameUser),
    /// `settings`.
    Settings(GameSettings),
    /// `gameRecord`, with any per-record failures.
    Records(RecordHistory),
}

impl DecodedSection {
    /// The archive key this section was decoded from.
    #[must_use]
    pub const fn key(&self) -> SectionKey {
        match self {
            Self::Progress(_) => SectionKey::GameProgress,
            Self::User(_) => SectionKey::User,
            Self::Settings(_) => SectionKey::Settings,
            Self::Records(_) => SectionKey::GameRecord,
        }
    }
}

/// Decodes sections with injected collaborators.
#[derive(Clone, Copy)]
pub struct SectionPipeline<'a> {
    decryptor: &'a dyn SectionDecryptor,
    decoders: &'a dyn SectionDecoders,
    gate: &'a VersionGate,
}

impl<'a> SectionPipeline<'a> {
    /// Create a pipeline over the given decryptor, decoders and gate.
    #[must_use]
    pub fn new(
        decryptor: &'a dyn SectionDecryptor,
        decoders: &'a dyn SectionDecoders,
        gate: &'a VersionGate,
    ) -> Self {
        Self {
            decryptor,
            decoders,
            gate,
        }
    }

    /// Extract `section` from `archive` and decode it.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::MissingSection`] if the archive has no such
    /// entry, [`SaveError::SectionRead`] if the entry cannot be read, and
    /// any error of [`SectionPipeline::decode_payload`].
    pub fn extract(&self, archive: &mut ArchiveHandle, section: SectionKey) -> Result<DecodedSection> {
        let payload = archive
            .section(section)
            .map_err(|source| SaveError::SectionRead { section, source })?
            .ok_or(SaveError::MissingSection { section })?;
        self.decode_payload(section, &payload)
    }

    /// Decode the stored bytes of `section`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::SectionTruncated`] for an empty payload,
    /// [`SaveError::SectionDecryptError`] if the body does not decrypt,
    /// [`SaveError::UnsupportedVersion`] if a gated tag differs, and
    /// [`SaveError::SectionDecode`] if the section fails as a whole.
    /// Per-record failures in `gameRecord` are collected instead.
    pub fn decode_payload(&self, section: SectionKey, payload: &[u8]) -> Result<DecodedSection> {
        let mut cursor = ByteCursor::new(payload);
        let version = cursor
            .read_byte()
            .map_err(|source| SaveError::SectionTruncated { section, source })?;
        let plain = self
            .decryptor
            .decrypt(cursor.read_remaining())
            .map_err(|source| SaveError::SectionDecryptError { section, source })?;
        self.gate.check(section, version, self.decoders)?;
        debug!(
            "decoding {section} section (version {version}, {} bytes)",
            plain.len()
        );

        let decode_failed = |source| SaveError::SectionDecode { section, source };
        let decoded = match section {
            SectionKey::GameProgress => self
                .decoders
                .decode_progress(&plain)
                .map(DecodedSection::Progress),
            SectionKey::User => self.decoders.decode_user(&plain).map(DecodedSection::User),
            SectionKey::Settings => self
                .decoders
                .decode_settings(&plain)
                .map(DecodedSection::Settings),
            SectionKey::GameRecord => {
                let mut errors = Vec::new();
                self.decoders
                    .decode_records(&plain, &mut errors)
                    .map(|songs| {
                        for err in &errors {
                            warn!("skipped record: {err}");
                        }
                        DecodedSection::Records(RecordHistory::new(songs, errors))
                    })
            }
        }
        .map_err(decode_failed)?;
        Ok(decoded)
    }
}
