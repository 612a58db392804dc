//! The `gameRecord` section: per-song best results.
//!
//! The section is a count followed by length-framed song records. Framing
//! is what makes partial failure possible: a record whose body is malformed
//! is reported and skipped, and decoding resumes at the next frame. Only a
//! broken frame header (key or length) stops the walk, because nothing
//! after it can be located.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::cursor::ByteCursor;
use crate::decode::DecodeError;

/// The `gameRecord` version tag the binary layout below describes.
pub const GAME_RECORD_VERSION: u8 = 1;

/// Highest attainable score on any chart.
pub const MAX_SCORE: u32 = 1_000_000;

/// Suffix the client appends to song ids in record keys.
const KEY_SUFFIX: &str = ".0";

/// Chart difficulty, in on-disk bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    /// Easy.
    Ez,
    /// Hard.
    Hd,
    /// Insane.
    In,
    /// Another.
    At,
    /// Legacy chart.
    Legacy,
}

impl Difficulty {
    /// Every difficulty, in on-disk bit order.
    pub const ALL: [Self; 5] = [Self::Ez, Self::Hd, Self::In, Self::At, Self::Legacy];

    /// Bit index of this difficulty in the unlock and full-combo bytes.
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::Ez => 0,
            Self::Hd => 1,
            Self::In => 2,
            Self::At => 3,
            Self::Legacy => 4,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ez => "EZ",
            Self::Hd => "HD",
            Self::In => "IN",
            Self::At => "AT",
            Self::Legacy => "Legacy",
        })
    }
}

/// Best result on one chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelRecord {
    /// Chart difficulty.
    pub difficulty: Difficulty,
    /// Best score, at most [`MAX_SCORE`].
    pub score: u32,
    /// Best accuracy in percent.
    pub accuracy: f32,
    /// Whether the chart has been full-combo'd.
    pub full_combo: bool,
}

impl LevelRecord {
    /// Whether the score is a perfect 1 000 000.
    #[must_use]
    pub const fn is_phi(&self) -> bool {
        self.score == MAX_SCORE
    }
}

/// Every recorded chart of one song.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRecord {
    /// Song id without the record-key suffix.
    pub song_id: String,
    /// Played charts, in difficulty order.
    pub levels: Vec<LevelRecord>,
}

impl SongRecord {
    /// The record for `difficulty`, if that chart has been played.
    #[must_use]
    pub fn level(&self, difficulty: Difficulty) -> Option<&LevelRecord> {
        self.levels.iter().find(|level| level.difficulty == difficulty)
    }
}

/// A song record that could not be decoded.
///
/// Collected rather than raised: the rest of the section still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "record #{index} ({}) failed to decode: {source}",
    .song_id.as_deref().unwrap_or("unknown song")
)]
pub struct RecordDecodeError {
    /// Position of the record in the section.
    pub index: usize,
    /// Song id, when the frame header was readable.
    pub song_id: Option<String>,
    /// What went wrong.
    #[source]
    pub source: DecodeError,
}

/// The decoded `gameRecord` section.
///
/// Owns both the records that decoded and the failures collected on the
/// way, in section order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordHistory {
    songs: Vec<SongRecord>,
    #[serde(skip)]
    errors: Vec<RecordDecodeError>,
}

impl RecordHistory {
    /// Pair decoded records with the failures collected while decoding.
    #[must_use]
    pub fn new(songs: Vec<SongRecord>, errors: Vec<RecordDecodeError>) -> Self {
        Self { songs, errors }
    }

    /// Records that decoded, in section order.
    #[must_use]
    pub fn songs(&self) -> &[SongRecord] {
        &self.songs
    }

    /// Records that failed to decode, in section order.
    #[must_use]
    pub fn errors(&self) -> &[RecordDecodeError] {
        &self.errors
    }

    /// Iterate over decoded records.
    pub fn iter(&self) -> impl Iterator<Item = &SongRecord> {
        self.songs.iter()
    }

    /// Number of decoded records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether no record decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// The record for `song_id`.
    #[must_use]
    pub fn song(&self, song_id: &str) -> Option<&SongRecord> {
        self.songs.iter().find(|song| song.song_id == song_id)
    }

    /// The record for one chart of `song_id`.
    #[must_use]
    pub fn level(&self, song_id: &str, difficulty: Difficulty) -> Option<&LevelRecord> {
        self.song(song_id).and_then(|song| song.level(difficulty))
    }
}

/// Decode a decrypted `gameRecord` payload.
///
/// Malformed records are appended to `errors` in section order.
///
/// # Errors
///
/// Returns [`DecodeError`] only if the record count cannot be read.
pub fn decode_records(
    bytes: &[u8],
    errors: &mut Vec<RecordDecodeError>,
) -> Result<Vec<SongRecord>, DecodeError> {
    let mut cursor = ByteCursor::new(bytes);
    let count = usize::from(cursor.read_var_short()?);
    let mut songs = Vec::with_capacity(count);
    for index in 0..count {
        let (key, body) = match read_frame(&mut cursor) {
            Ok(frame) => frame,
            Err(source) => {
                errors.push(RecordDecodeError {
                    index,
                    song_id: None,
                    source,
                });
                break;
            }
        };
        let song_id = key.strip_suffix(KEY_SUFFIX).unwrap_or(&key).to_owned();
        match decode_levels(body) {
            Ok(levels) => songs.push(SongRecord { song_id, levels }),
            Err(source) => errors.push(RecordDecodeError {
                index,
                song_id: Some(song_id),
                source,
            }),
        }
    }
    Ok(songs)
}

fn read_frame<'a>(cursor: &mut ByteCursor<'a>) -> Result<(String, &'a [u8]), DecodeError> {
    let key = cursor.read_string()?;
    let len = cursor.read_var_short()?;
    let body = cursor.take(usize::from(len))?;
    Ok((key, body))
}

fn decode_levels(body: &[u8]) -> Result<Vec<LevelRecord>, DecodeError> {
    let mut cursor = ByteCursor::new(body);
    let unlocked = cursor.read_flags()?;
    let full_combo = cursor.read_flags()?;
    let mut levels = Vec::new();
    for difficulty in Difficulty::ALL {
        if !unlocked.get(difficulty.bit()) {
            continue;
        }
        let raw_score = cursor.read_i32()?;
        let score = u32::try_from(raw_score)
            .ok()
            .filter(|score| *score <= MAX_SCORE)
            .ok_or_else(|| DecodeError::InvalidValue {
                field: "score",
                reason: format!("{raw_score} is outside 0..={MAX_SCORE} on {difficulty}"),
            })?;
        let accuracy = cursor.read_f32()?;
        levels.push(LevelRecord {
            difficulty,
            score,
            accuracy,
            full_combo: full_combo.get(difficulty.bit()),
        });
    }
    Ok(levels)
}
