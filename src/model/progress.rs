//! The `gameProgress` section: chapter flags, currency and challenge rank.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::decode::DecodeError;

/// Data currency balance, one counter per unit from KiB to PiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Money {
    /// Kibibytes.
    pub kib: u16,
    /// Mebibytes.
    pub mib: u16,
    /// Gibibytes.
    pub gib: u16,
    /// Tebibytes.
    pub tib: u16,
    /// Pebibytes.
    pub pib: u16,
}

/// Colour tier of a challenge-mode rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChallengeColour {
    /// Green tier.
    Green,
    /// Blue tier.
    Blue,
    /// Red tier.
    Red,
    /// Gold tier.
    Gold,
    /// Rainbow tier.
    Rainbow,
}

/// A decoded challenge-mode rank, e.g. "Gold 48".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeRank {
    /// Colour tier.
    pub colour: ChallengeColour,
    /// Level within the tier.
    pub level: u16,
}

/// Decoded `gameProgress` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "mirrors the on-disk flag bytes one field per bit"
)]
pub struct GameProgress {
    /// The tutorial has not been completed yet.
    pub is_first_run: bool,
    /// The legacy chapter has been finished.
    pub legacy_chapter_finished: bool,
    /// The collection tip has been shown.
    pub already_show_collection_tip: bool,
    /// The auto-unlock IN tip has been shown.
    pub already_show_auto_unlock_in_tip: bool,
    /// Completion marker string of the main story.
    pub completed: String,
    /// Song update notice counter.
    pub song_update_info: u16,
    /// Raw challenge-mode rank; hundreds encode the colour.
    pub challenge_mode_rank: u16,
    /// Data currency balance.
    pub money: Money,
    /// Unlock progress of Spasmodic.
    pub unlock_flag_of_spasmodic: u8,
    /// Unlock progress of Igallta.
    pub unlock_flag_of_igallta: u8,
    /// Unlock progress of Rrhar'il.
    pub unlock_flag_of_rrharil: u8,
    /// Song record key flags.
    pub flag_of_song_record_key: u8,
    /// Random-version unlock flags.
    pub random_version_unlocked: u8,
    /// Chapter 8 unlock has begun.
    pub chapter8_unlock_begin: bool,
    /// Chapter 8 unlock second phase reached.
    pub chapter8_unlock_second_phase: bool,
    /// Chapter 8 has been passed.
    pub chapter8_passed: bool,
    /// Chapter 8 song unlock flags.
    pub chapter8_song_unlocked: u8,
}

impl GameProgress {
    /// Decode a decrypted `gameProgress` payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is truncated or malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(bytes);
        let tips = cursor.read_flags()?;
        let completed = cursor.read_string()?;
        let song_update_info = cursor.read_var_short()?;
        let challenge_mode_rank = cursor.read_u16()?;
        let money = Money {
            kib: cursor.read_var_short()?,
            mib: cursor.read_var_short()?,
            gib: cursor.read_var_short()?,
            tib: cursor.read_var_short()?,
            pib: cursor.read_var_short()?,
        };
        let unlock_flag_of_spasmodic = cursor.read_byte()?;
        let unlock_flag_of_igallta = cursor.read_byte()?;
        let unlock_flag_of_rrharil = cursor.read_byte()?;
        let flag_of_song_record_key = cursor.read_byte()?;
        let random_version_unlocked = cursor.read_byte()?;
        let chapter8 = cursor.read_flags()?;
        let chapter8_song_unlocked = cursor.read_byte()?;
        Ok(Self {
            is_first_run: tips.get(0),
            legacy_chapter_finished: tips.get(1),
            already_show_collection_tip: tips.get(2),
            already_show_auto_unlock_in_tip: tips.get(3),
            completed,
            song_update_info,
            challenge_mode_rank,
            money,
            unlock_flag_of_spasmodic,
            unlock_flag_of_igallta,
            unlock_flag_of_rrharil,
            flag_of_song_record_key,
            random_version_unlocked,
            chapter8_unlock_begin: chapter8.get(0),
            chapter8_unlock_second_phase: chapter8.get(1),
            chapter8_passed: chapter8.get(2),
            chapter8_song_unlocked,
        })
    }

    /// The challenge-mode rank, or `None` if no challenge has been cleared
    /// or the colour digit is out of range.
    #[must_use]
    pub fn challenge_rank(&self) -> Option<ChallengeRank> {
        let colour = match self.challenge_mode_rank / 100 {
            1 => ChallengeColour::Green,
            2 => ChallengeColour::Blue,
            3 => ChallengeColour::Red,
            4 => ChallengeColour::Gold,
            5 => ChallengeColour::Rainbow,
            _ => return None,
        };
        Some(ChallengeRank {
            colour,
            level: self.challenge_mode_rank % 100,
        })
    }
}
