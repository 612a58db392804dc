//! The `user` section: the player's public profile.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::decode::DecodeError;

/// Decoded `user` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameUser {
    /// Whether the player id is shown on the profile.
    pub show_player_id: bool,
    /// Free-text self introduction.
    pub self_intro: String,
    /// Selected avatar name.
    pub avatar: String,
    /// Selected background illustration.
    pub background: String,
}

impl GameUser {
    /// Decode a decrypted `user` payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is truncated or a string is
    /// not UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let flags = cursor.read_flags()?;
        Ok(Self {
            show_player_id: flags.get(0),
            self_intro: cursor.read_string()?,
            avatar: cursor.read_string()?,
            background: cursor.read_string()?,
        })
    }
}
