//! Error types for the save retrieval pipeline.
//!
//! Every fatal condition the pipeline can hit is a [`SaveError`] variant.
//! Variants name the archive section involved where one exists and keep the
//! underlying cause reachable through [`std::error::Error::source`], so a
//! failed run can be diagnosed without being repeated.

use thiserror::Error;

use crate::archive::container::SectionKey;
use crate::archive::transport::TransportError;
use crate::config::ConfigError;
use crate::cursor::CursorError;
use crate::decode::DecodeError;
use crate::location::LocatorError;
use crate::location::lookup::LookupError;
use crate::section::cipher::DecryptError;

/// Errors that abort a save retrieval run.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The session token does not match the required lexical pattern.
    #[error("invalid session token format: {reason}")]
    InvalidSessionFormat {
        /// Description of the validation failure.
        reason: String,
    },

    /// The client configuration is invalid.
    #[error("invalid client configuration")]
    Config(#[from] ConfigError),

    /// The lookup service returned no usable save record.
    #[error("no save found for this session")]
    NoSaveFound,

    /// The selected save record does not carry a fetchable locator.
    #[error("save record has a malformed location \"{value}\"")]
    MalformedSaveLocation {
        /// The raw file reference, empty when it was absent.
        value: String,
        /// Why the reference could not be used.
        #[source]
        source: LocatorError,
    },

    /// The lookup call itself failed.
    #[error("save lookup failed")]
    Lookup(#[from] LookupError),

    /// Downloading the archive failed.
    #[error("archive download failed")]
    Transport(#[from] TransportError),

    /// The downloaded blob could not be opened as a container.
    #[error("failed to open save archive")]
    ArchiveOpenError {
        /// The container error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A required named stream is absent from the archive.
    #[error("save archive has no {section} section")]
    MissingSection {
        /// The missing section.
        section: SectionKey,
    },

    /// A named stream exists but could not be read out of the container.
    #[error("failed to read {section} section")]
    SectionRead {
        /// The section being read.
        section: SectionKey,
        /// The container error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A section is too short to hold its version tag.
    #[error("{section} section is truncated")]
    SectionTruncated {
        /// The truncated section.
        section: SectionKey,
        /// The cursor error raised while reading the tag.
        #[source]
        source: CursorError,
    },

    /// Decrypting a section payload failed.
    #[error("failed to decrypt {section} section")]
    SectionDecryptError {
        /// The section whose payload was rejected.
        section: SectionKey,
        /// The decryption error.
        #[source]
        source: DecryptError,
    },

    /// A version-gated section carries an unexpected version tag.
    #[error("unsupported {section} version {found}; expected {expected}")]
    UnsupportedVersion {
        /// The gated section.
        section: SectionKey,
        /// The tag read from the archive.
        found: u8,
        /// The tag the decoder understands.
        expected: u8,
    },

    /// A section failed structural decoding as a whole.
    #[error("failed to decode {section} section")]
    SectionDecode {
        /// The section being decoded.
        section: SectionKey,
        /// The decode error.
        #[source]
        source: DecodeError,
    },
}

impl SaveError {
    /// Return the archive section this error concerns, if any.
    #[must_use]
    pub fn section(&self) -> Option<SectionKey> {
        match self {
            Self::MissingSection { section }
            | Self::SectionRead { section, .. }
            | Self::SectionTruncated { section, .. }
            | Self::SectionDecryptError { section, .. }
            | Self::UnsupportedVersion { section, .. }
            | Self::SectionDecode { section, .. } => Some(*section),
            _ => None,
        }
    }
}

/// Result type alias using [`SaveError`].
pub type Result<T> = std::result::Result<T, SaveError>;
