//! Section decoders.
//!
//! The pipeline turns decrypted section bytes into entities through the
//! [`SectionDecoders`] trait, one method per section. [`BinaryDecoders`]
//! implements the client's binary layouts; tests substitute stand-ins.

use thiserror::Error;

use crate::cursor::CursorError;
use crate::model::{
    GAME_RECORD_VERSION, GameProgress, GameSettings, GameUser, RecordDecodeError, SongRecord,
    decode_records,
};

/// Errors arising from structural decoding of section bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The bytes ended early or held an invalid string.
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// A field decoded to a value outside its domain.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the violation.
        reason: String,
    },
}

/// Constructors for the four decoded section entities.
pub trait SectionDecoders {
    /// Decode the `gameProgress` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not hold a progress record.
    fn decode_progress(&self, bytes: &[u8]) -> Result<GameProgress, DecodeError>;

    /// Decode the `user` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not hold a user profile.
    fn decode_user(&self, bytes: &[u8]) -> Result<GameUser, DecodeError>;

    /// Decode the `settings` section.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not hold a settings record.
    fn decode_settings(&self, bytes: &[u8]) -> Result<GameSettings, DecodeError>;

    /// The `gameRecord` version tag this decoder understands.
    fn record_version(&self) -> u8;

    /// Decode the `gameRecord` section.
    ///
    /// Records that fail individually are appended to `errors` and skipped;
    /// the returned records are the ones that decoded.
    ///
    /// # Errors
    ///
    /// Returns an error only if the section header itself is unreadable.
    fn decode_records(
        &self,
        bytes: &[u8],
        errors: &mut Vec<RecordDecodeError>,
    ) -> Result<Vec<SongRecord>, DecodeError>;
}

/// Decoders for the client's binary section layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryDecoders;

impl SectionDecoders for BinaryDecoders {
    fn decode_progress(&self, bytes: &[u8]) -> Result<GameProgress, DecodeError> {
        GameProgress::from_bytes(bytes)
    }

    fn decode_user(&self, bytes: &[u8]) -> Result<GameUser, DecodeError> {
        GameUser::from_bytes(bytes)
    }

    fn decode_settings(&self, bytes: &[u8]) -> Result<GameSettings, DecodeError> {
        GameSettings::from_bytes(bytes)
    }

    fn record_version(&self) -> u8 {
        GAME_RECORD_VERSION
    }

    fn decode_records(
        &self,
        bytes: &[u8],
        errors: &mut Vec<RecordDecodeError>,
    ) -> Result<Vec<SongRecord>, DecodeError> {
        decode_records(bytes, errors)
    }
}
