//! The `settings` section.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::decode::DecodeError;

/// Decoded `settings` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the on-disk flag byte one field per bit"
)]
pub struct GameSettings {
    /// Multi-note chord highlighting.
    pub chord_support: bool,
    /// FC/AP indicator while playing.
    pub fc_ap_indicator: bool,
    /// Hit sounds enabled.
    pub enable_hit_sound: bool,
    /// Low-resolution rendering.
    pub low_resolution_mode: bool,
    /// Name of the device the save was written from.
    pub device_name: String,
    /// Background brightness.
    pub bright: f32,
    /// Music volume.
    pub music_volume: f32,
    /// Effect volume.
    pub effect_volume: f32,
    /// Hit sound volume.
    pub hit_sound_volume: f32,
    /// Audio offset in seconds.
    pub sound_offset: f32,
    /// Note size multiplier.
    pub note_scale: f32,
}

impl GameSettings {
    /// Decode a decrypted `settings` payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is truncated or the device
    /// name is not UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let flags = cursor.read_flags()?;
        Ok(Self {
            chord_support: flags.get(0),
            fc_ap_indicator: flags.get(1),
            enable_hit_sound: flags.get(2),
            low_resolution_mode: flags.get(3),
            device_name: cursor.read_string()?,
            bright: cursor.read_f32()?,
            music_volume: cursor.read_f32()?,
            effect_volume: cursor.read_f32()?,
            hit_sound_volume: cursor.read_f32()?,
            sound_offset: cursor.read_f32()?,
            note_scale: cursor.read_f32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{encode_settings, sample_settings};

    #[test]
    fn decodes_encoded_settings() {
        let settings = sample_settings();
        assert_eq!(
            GameSettings::from_bytes(&encode_settings(&settings)),
            Ok(settings)
        );
    }

    #[test]
    fn missing_trailing_float_is_an_error() {
        let mut bytes = encode_settings(&sample_settings());
        bytes.truncate(bytes.len() - 2);
        assert!(GameSettings::from_bytes(&bytes).is_err());
    }
}
