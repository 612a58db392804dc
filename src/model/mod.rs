//! Decoded save sections.
//!
//! - [`progress`]: `gameProgress`.
//! - [`user`]: `user`.
//! - [`settings`]: `settings`.
//! - [`record`]: `gameRecord`, with per-record failure collection.

pub mod progress;
pub mod record;
pub mod settings;
pub mod user;

pub use progress::{ChallengeColour, ChallengeRank, GameProgress, Money};
pub use record::{
    Difficulty, GAME_RECORD_VERSION, LevelRecord, MAX_SCORE, RecordDecodeError, RecordHistory,
    SongRecord, decode_records,
};
pub use settings::GameSettings;
pub use user::GameUser;
