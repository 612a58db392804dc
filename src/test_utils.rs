//! Shared test utilities: section encoders, sealed payloads and archives.
//!
//! The encoders write the same binary layouts the decoders read, so tests
//! can start from typed values and assert the pipeline gives them back.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::location::response::{FileReference, LookupResponse, RawSaveRecord};
use crate::location::{SaveRecordDescriptor, select_save};
use crate::model::{
    Difficulty, GameProgress, GameSettings, GameUser, LevelRecord, Money, SongRecord,
};
use crate::section::AesSectionCipher;

/// A lexically valid session token.
pub const SESSION: &str = "abcdefghijklmnopqrstu1234";

/// Download locator used by the canned lookup response.
pub const ARCHIVE_URL: &str = "https://files.example.test/save.zip";

/// Version tags written by [`sample_sections`], per archive entry.
pub const SAMPLE_TAGS: [(&str, u8); 4] = [
    ("gameProgress", 2),
    ("user", 1),
    ("settings", 1),
    ("gameRecord", 1),
];

/// A dated save record pointing at `url`.
#[must_use]
pub fn save_record(url: &str) -> RawSaveRecord {
    RawSaveRecord {
        object_id: Some("save-object".to_owned()),
        created_at: Some("2023-06-01T12:00:00.000Z".to_owned()),
        updated_at: Some("2023-06-02T08:30:00.000Z".to_owned()),
        game_file: Some(FileReference {
            url: Some(url.to_owned()),
        }),
    }
}

/// A one-record lookup response pointing at `url`.
#[must_use]
pub fn lookup_response(url: &str) -> LookupResponse {
    LookupResponse::List(vec![save_record(url)])
}

/// The JSON body the lookup service returns for [`lookup_response`].
#[must_use]
pub fn lookup_body(url: &str) -> String {
    format!(
        concat!(
            r#"{{"results":[{{"objectId":"save-object","#,
            r#""createdAt":"2023-06-01T12:00:00.000Z","#,
            r#""updatedAt":"2023-06-02T08:30:00.000Z","#,
            r#""gameFile":{{"url":"{url}"}}}}]}}"#,
        ),
        url = url
    )
}

/// The descriptor selected from [`lookup_response`] at [`ARCHIVE_URL`].
///
/// # Panics
///
/// Never for the canned record.
#[must_use]
#[expect(clippy::expect_used, reason = "the canned record always selects")]
pub fn descriptor() -> SaveRecordDescriptor {
    select_save(&lookup_response(ARCHIVE_URL)).expect("canned record selects")
}

/// Appends primitives in the save's binary layout.
#[derive(Debug, Default)]
pub struct SectionWriter {
    bytes: Vec<u8>,
}

impl SectionWriter {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append one byte.
    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    /// Append booleans packed into one flag byte, first flag lowest.
    pub fn flags(&mut self, flags: &[bool]) -> &mut Self {
        let bits = flags
            .iter()
            .take(8)
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0_u8, |bits, (index, _)| bits | (1 << index));
        self.byte(bits)
    }

    /// Append a variable-length short.
    pub fn var_short(&mut self, value: u16) -> &mut Self {
        let [low, _] = value.to_le_bytes();
        if value < 0x80 {
            return self.byte(low);
        }
        let [high, _] = (value >> 7).to_le_bytes();
        self.byte((low & 0x7f) | 0x80).byte(high)
    }

    /// Append a length-prefixed UTF-8 string.
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.var_short(u16::try_from(value.len()).unwrap_or(u16::MAX));
        self.raw(value.as_bytes())
    }

    /// Append a little-endian `u16`.
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.raw(&value.to_le_bytes())
    }

    /// Append a little-endian `i32`.
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.raw(&value.to_le_bytes())
    }

    /// Append a little-endian `f32`.
    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.raw(&value.to_le_bytes())
    }

    /// Append a var-short length followed by `body`.
    pub fn frame(&mut self, body: &[u8]) -> &mut Self {
        self.var_short(u16::try_from(body.len()).unwrap_or(u16::MAX));
        self.raw(body)
    }

    /// Append one framed song record, keyed `<song_id>.0`.
    pub fn song(&mut self, song: &SongRecord) -> &mut Self {
        let mut body = Self::new();
        let unlocked: Vec<bool> = Difficulty::ALL
            .iter()
            .map(|difficulty| song.level(*difficulty).is_some())
            .collect();
        let full_combo: Vec<bool> = Difficulty::ALL
            .iter()
            .map(|difficulty| song.level(*difficulty).is_some_and(|level| level.full_combo))
            .collect();
        body.flags(&unlocked).flags(&full_combo);
        for level in Difficulty::ALL
            .iter()
            .filter_map(|difficulty| song.level(*difficulty))
        {
            body.i32(i32::try_from(level.score).unwrap_or(i32::MAX))
                .f32(level.accuracy);
        }
        self.string(&format!("{}.0", song.song_id));
        self.frame(&body.into_bytes())
    }

    /// The bytes written so far.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encode a `gameProgress` section body.
#[must_use]
pub fn encode_progress(progress: &GameProgress) -> Vec<u8> {
    let mut writer = SectionWriter::new();
    writer
        .flags(&[
            progress.is_first_run,
            progress.legacy_chapter_finished,
            progress.already_show_collection_tip,
            progress.already_show_auto_unlock_in_tip,
        ])
        .string(&progress.completed)
        .var_short(progress.song_update_info)
        .u16(progress.challenge_mode_rank);
    let Money {
        kib,
        mib,
        gib,
        tib,
        pib,
    } = progress.money;
    for unit in [kib, mib, gib, tib, pib] {
        writer.var_short(unit);
    }
    writer
        .byte(progress.unlock_flag_of_spasmodic)
        .byte(progress.unlock_flag_of_igallta)
        .byte(progress.unlock_flag_of_rrharil)
        .byte(progress.flag_of_song_record_key)
        .byte(progress.random_version_unlocked)
        .flags(&[
            progress.chapter8_unlock_begin,
            progress.chapter8_unlock_second_phase,
            progress.chapter8_passed,
        ])
        .byte(progress.chapter8_song_unlocked);
    writer.into_bytes()
}

/// Encode a `user` section body.
#[must_use]
pub fn encode_user(user: &GameUser) -> Vec<u8> {
    let mut writer = SectionWriter::new();
    writer
        .flags(&[user.show_player_id])
        .string(&user.self_intro)
        .string(&user.avatar)
        .string(&user.background);
    writer.into_bytes()
}

/// Encode a `settings` section body.
#[must_use]
pub fn encode_settings(settings: &GameSettings) -> Vec<u8> {
    let mut writer = SectionWriter::new();
    writer
        .flags(&[
            settings.chord_support,
            settings.fc_ap_indicator,
            settings.enable_hit_sound,
            settings.low_resolution_mode,
        ])
        .string(&settings.device_name)
        .f32(settings.bright)
        .f32(settings.music_volume)
        .f32(settings.effect_volume)
        .f32(settings.hit_sound_volume)
        .f32(settings.sound_offset)
        .f32(settings.note_scale);
    writer.into_bytes()
}

/// Encode a `gameRecord` section body.
#[must_use]
pub fn encode_records(songs: &[SongRecord]) -> Vec<u8> {
    let mut writer = SectionWriter::new();
    writer.var_short(u16::try_from(songs.len()).unwrap_or(u16::MAX));
    for song in songs {
        writer.song(song);
    }
    writer.into_bytes()
}

/// A `gameRecord` body of three records whose middle one is truncated.
#[must_use]
pub fn malformed_records_payload() -> Vec<u8> {
    let songs = sample_songs();
    let mut writer = SectionWriter::new();
    writer.var_short(3);
    if let Some(first) = songs.first() {
        writer.song(first);
    }
    // The unlock byte promises an EZ chart the body does not hold.
    writer.string("Broken.Song.0").frame(&[0b0000_0001, 0]);
    if let Some(last) = songs.last() {
        writer.song(last);
    }
    writer.into_bytes()
}

/// Build a song record.
#[must_use]
pub fn song(song_id: &str, levels: Vec<LevelRecord>) -> SongRecord {
    SongRecord {
        song_id: song_id.to_owned(),
        levels,
    }
}

/// Build a level record.
#[must_use]
pub const fn level(
    difficulty: Difficulty,
    score: u32,
    accuracy: f32,
    full_combo: bool,
) -> LevelRecord {
    LevelRecord {
        difficulty,
        score,
        accuracy,
        full_combo,
    }
}

/// A mid-game progress record.
#[must_use]
pub fn sample_progress() -> GameProgress {
    GameProgress {
        is_first_run: false,
        legacy_chapter_finished: true,
        already_show_collection_tip: true,
        already_show_auto_unlock_in_tip: false,
        completed: "3.0".to_owned(),
        song_update_info: 12,
        challenge_mode_rank: 448,
        money: Money {
            kib: 512,
            mib: 37,
            gib: 2,
            tib: 0,
            pib: 0,
        },
        unlock_flag_of_spasmodic: 3,
        unlock_flag_of_igallta: 1,
        unlock_flag_of_rrharil: 0,
        flag_of_song_record_key: 0x1f,
        random_version_unlocked: 0,
        chapter8_unlock_begin: true,
        chapter8_unlock_second_phase: true,
        chapter8_passed: false,
        chapter8_song_unlocked: 0b0000_0101,
    }
}

/// A public profile.
#[must_use]
pub fn sample_user() -> GameUser {
    GameUser {
        show_player_id: true,
        self_intro: "Phi or nothing.".to_owned(),
        avatar: "Introduction".to_owned(),
        background: "Glaciaxion".to_owned(),
    }
}

/// Client settings.
#[must_use]
pub fn sample_settings() -> GameSettings {
    GameSettings {
        chord_support: true,
        fc_ap_indicator: true,
        enable_hit_sound: true,
        low_resolution_mode: false,
        device_name: "Pixel 8".to_owned(),
        bright: 0.75,
        music_volume: 1.0,
        effect_volume: 0.5,
        hit_sound_volume: 0.25,
        sound_offset: -0.0625,
        note_scale: 1.125,
    }
}

/// Three songs covering phi, partial and full-combo records.
#[must_use]
pub fn sample_songs() -> Vec<SongRecord> {
    vec![
        song(
            "Glaciaxion.SunsetRay",
            vec![
                level(Difficulty::Ez, 1_000_000, 100.0, true),
                level(Difficulty::At, 1_000_000, 100.0, true),
            ],
        ),
        song(
            "Credits.Frums",
            vec![
                level(Difficulty::Hd, 991_234, 99.125, false),
                level(Difficulty::In, 982_000, 98.5, true),
            ],
        ),
        song(
            "Rrharil.TeamA_NE",
            vec![level(Difficulty::Legacy, 880_500, 95.25, false)],
        ),
    ]
}

/// Prefix `plain` with `version` after encrypting it with `cipher`.
#[must_use]
pub fn seal_section(version: u8, plain: &[u8], cipher: &AesSectionCipher) -> Vec<u8> {
    let mut sealed = vec![version];
    sealed.extend(cipher.encrypt(plain));
    sealed
}

/// The four sample sections, sealed with the tags in [`SAMPLE_TAGS`].
#[must_use]
pub fn sample_sections(cipher: &AesSectionCipher) -> Vec<(&'static str, Vec<u8>)> {
    let bodies = [
        encode_progress(&sample_progress()),
        encode_user(&sample_user()),
        encode_settings(&sample_settings()),
        encode_records(&sample_songs()),
    ];
    SAMPLE_TAGS
        .into_iter()
        .zip(bodies)
        .map(|((name, version), body)| (name, seal_section(version, &body, cipher)))
        .collect()
}

/// A complete sealed archive of the sample sections.
#[must_use]
pub fn sample_archive(cipher: &AesSectionCipher) -> Vec<u8> {
    build_archive(&sample_sections(cipher))
}

/// Build a zip archive with the given named entries.
///
/// # Panics
///
/// Panics if the in-memory zip writer fails.
#[must_use]
#[expect(clippy::expect_used, reason = "in-memory writes only fail on bugs")]
pub fn build_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(bytes).expect("write zip entry");
    }
    writer.finish().expect("finish zip archive").into_inner()
}
