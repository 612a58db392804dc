//! Unit tests for the save pipeline state machine.

use super::*;
use crate::archive::container::SectionKey;
use crate::archive::transport::MockArchiveTransport;
use crate::config::ConfigError;
use crate::location::lookup::{LookupError, MockSaveLookup};
use crate::location::response::LookupResponse;
use crate::section::cipher::MockSectionDecryptor;
use crate::test_utils::{
    ARCHIVE_URL, SESSION, build_archive, descriptor, encode_records, lookup_response,
    malformed_records_payload, sample_archive, sample_progress, sample_sections, sample_settings,
    sample_songs, sample_user, seal_section,
};
use rstest::{fixture, rstest};

#[fixture]
fn cipher() -> AesSectionCipher {
    AesSectionCipher::default()
}

#[fixture]
fn gate() -> VersionGate {
    VersionGate::new()
}

fn lookup_returning(response: LookupResponse, times: usize) -> MockSaveLookup {
    let mut lookup = MockSaveLookup::new();
    lookup
        .expect_lookup()
        .withf(|session| session.as_str() == SESSION)
        .times(times)
        .returning(move |_| Ok(response.clone()));
    lookup
}

fn transport_returning(archive: Vec<u8>, times: usize) -> MockArchiveTransport {
    let mut transport = MockArchiveTransport::new();
    transport
        .expect_download()
        .withf(|url| url.as_str() == ARCHIVE_URL)
        .times(times)
        .returning(move |_| Ok(archive.clone()));
    transport
}

fn replace_section(
    cipher: &AesSectionCipher,
    name: &'static str,
    payload: Vec<u8>,
) -> Vec<(&'static str, Vec<u8>)> {
    sample_sections(cipher)
        .into_iter()
        .map(|(key, bytes)| if key == name { (key, payload.clone()) } else { (key, bytes) })
        .collect()
}

#[rstest]
fn malformed_session_never_reaches_lookup(cipher: AesSectionCipher, gate: VersionGate) {
    let mut lookup = MockSaveLookup::new();
    lookup.expect_lookup().never();
    let mut transport = MockArchiveTransport::new();
    transport.expect_download().never();
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with("Not-A-Token", &collaborators, gate);

    assert!(matches!(
        result,
        Err(SaveError::InvalidSessionFormat { .. })
    ));
}

#[rstest]
fn decodes_a_sealed_save_end_to_end(cipher: AesSectionCipher, gate: VersionGate) {
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(sample_archive(&cipher), 1);
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let save = fetch_save_with(SESSION, &collaborators, gate).expect("save decodes");

    assert_eq!(save.progress(), &sample_progress());
    assert_eq!(save.user(), &sample_user());
    assert_eq!(save.settings(), &sample_settings());
    assert_eq!(save.records().songs(), sample_songs().as_slice());
    assert!(save.record_errors().is_empty());
    assert_eq!(save.descriptor().locator().as_str(), ARCHIVE_URL);
}

#[rstest]
fn identical_runs_give_equal_saves(cipher: AesSectionCipher, gate: VersionGate) {
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 2);
    let transport = transport_returning(sample_archive(&cipher), 2);
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let first = fetch_save_with(SESSION, &collaborators, gate.clone()).expect("first run");
    let second = fetch_save_with(SESSION, &collaborators, gate).expect("second run");

    assert_eq!(first, second);
}

#[rstest]
fn empty_lookup_skips_download(cipher: AesSectionCipher, gate: VersionGate) {
    let lookup = lookup_returning(LookupResponse::Empty, 1);
    let mut transport = MockArchiveTransport::new();
    transport.expect_download().never();
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with(SESSION, &collaborators, gate);

    assert!(matches!(result, Err(SaveError::NoSaveFound)));
}

#[rstest]
fn missing_section_leaves_later_sections_untouched(gate: VersionGate) {
    let cipher = AesSectionCipher::default();
    let sections: Vec<_> = sample_sections(&cipher)
        .into_iter()
        .filter(|(key, _)| *key != "settings")
        .collect();
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(build_archive(&sections), 1);
    // Only gameProgress and user are decrypted before the gap is found.
    let mut decryptor = MockSectionDecryptor::new();
    decryptor
        .expect_decrypt()
        .times(2)
        .returning(move |payload| cipher.decrypt(payload));
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &decryptor,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with(SESSION, &collaborators, gate);

    assert!(matches!(
        result,
        Err(SaveError::MissingSection {
            section: SectionKey::Settings
        })
    ));
}

#[rstest]
fn record_version_mismatch_returns_no_partial_save(cipher: AesSectionCipher, gate: VersionGate) {
    let records = seal_section(2, &[0], &cipher);
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(
        build_archive(&replace_section(&cipher, "gameRecord", records)),
        1,
    );
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with(SESSION, &collaborators, gate);

    assert!(matches!(
        result,
        Err(SaveError::UnsupportedVersion {
            section: SectionKey::GameRecord,
            found: 2,
            expected: 1,
        })
    ));
}

#[rstest]
fn record_gate_holds_with_an_empty_table(cipher: AesSectionCipher) {
    let records = seal_section(2, &encode_records(&sample_songs()), &cipher);
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(
        build_archive(&replace_section(&cipher, "gameRecord", records)),
        1,
    );
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with(SESSION, &collaborators, VersionGate::new());

    assert!(matches!(
        result,
        Err(SaveError::UnsupportedVersion {
            section: SectionKey::GameRecord,
            found: 2,
            expected: 1,
        })
    ));
}

#[rstest]
fn configured_record_gate_fails_before_lookup() {
    let config = ClientConfig {
        version_gate: [("gameRecord".to_owned(), 2)].into_iter().collect(),
        ..ClientConfig::default()
    };

    let result = fetch_save(SESSION, &config);

    assert!(matches!(
        result,
        Err(SaveError::Config(ConfigError::FixedGate(_)))
    ));
}

#[rstest]
fn zero_timeout_fails_before_lookup() {
    let mut config = ClientConfig::default();
    config.transport.timeout_secs = 0;

    let result = fetch_save(SESSION, &config);

    assert!(matches!(
        result,
        Err(SaveError::Config(ConfigError::ZeroTimeout))
    ));
}

#[rstest]
fn malformed_record_is_collected_not_fatal(cipher: AesSectionCipher, gate: VersionGate) {
    let records = seal_section(1, &malformed_records_payload(), &cipher);
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(
        build_archive(&replace_section(&cipher, "gameRecord", records)),
        1,
    );
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let save = fetch_save_with(SESSION, &collaborators, gate).expect("save decodes");

    assert_eq!(save.records().len(), 2);
    assert_eq!(save.record_errors().len(), 1);
    assert!(!save.is_complete());
}

#[rstest]
fn configured_gate_applies_to_other_sections(cipher: AesSectionCipher, gate: VersionGate) {
    let gate = gate
        .with_section(SectionKey::GameProgress, 3)
        .expect("progress can be gated");
    let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
    let transport = transport_returning(sample_archive(&cipher), 1);
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &BinaryDecoders,
    };

    let result = fetch_save_with(SESSION, &collaborators, gate);

    assert!(matches!(
        result,
        Err(SaveError::UnsupportedVersion {
            section: SectionKey::GameProgress,
            ..
        })
    ));
}

mod transitions {
    use super::*;

    fn pipeline<'a>(
        lookup: &'a MockSaveLookup,
        transport: &'a MockArchiveTransport,
        cipher: &'a AesSectionCipher,
        gate: VersionGate,
    ) -> SavePipeline<'a> {
        SavePipeline::new(
            Collaborators {
                lookup,
                transport,
                decryptor: cipher,
                decoders: &BinaryDecoders,
            },
            gate,
        )
    }

    fn session() -> SessionToken {
        SessionToken::try_from(SESSION).expect("valid session")
    }

    #[rstest]
    fn unresolved_becomes_location_resolved(cipher: AesSectionCipher, gate: VersionGate) {
        let lookup = lookup_returning(lookup_response(ARCHIVE_URL), 1);
        let transport = MockArchiveTransport::new();

        let next = pipeline(&lookup, &transport, &cipher, gate)
            .advance(PipelineState::Unresolved(session()));

        assert!(matches!(next, PipelineState::LocationResolved(ref found) if *found == descriptor()));
    }

    #[rstest]
    fn lookup_failure_becomes_failed(cipher: AesSectionCipher, gate: VersionGate) {
        let mut lookup = MockSaveLookup::new();
        lookup.expect_lookup().returning(|_| {
            Err(LookupError::Http {
                url: "https://lookup.example.test".to_owned(),
                reason: "connection refused".to_owned(),
            })
        });
        let transport = MockArchiveTransport::new();

        let next = pipeline(&lookup, &transport, &cipher, gate)
            .advance(PipelineState::Unresolved(session()));

        assert!(matches!(next, PipelineState::Failed(SaveError::Lookup(_))));
    }

    #[rstest]
    fn location_resolved_becomes_archive_open(cipher: AesSectionCipher, gate: VersionGate) {
        let lookup = MockSaveLookup::new();
        let transport = transport_returning(sample_archive(&cipher), 1);

        let next = pipeline(&lookup, &transport, &cipher, gate)
            .advance(PipelineState::LocationResolved(descriptor()));

        assert_eq!(next.name(), "archive-open");
    }

    #[rstest]
    fn archive_open_starts_decoding(cipher: AesSectionCipher, gate: VersionGate) {
        let lookup = MockSaveLookup::new();
        let transport = MockArchiveTransport::new();
        let archive = ArchiveHandle::open(sample_archive(&cipher)).expect("archive");

        let next = pipeline(&lookup, &transport, &cipher, gate).advance(PipelineState::ArchiveOpen {
            descriptor: descriptor(),
            archive,
        });

        let PipelineState::SectionsDecoding { ref sections, .. } = next else {
            panic!("expected decoding state, got {}", next.name());
        };
        assert_eq!(sections.pending(), Some(SectionKey::GameProgress));
    }

    #[rstest]
    fn each_decoding_step_fills_one_section(cipher: AesSectionCipher, gate: VersionGate) {
        let lookup = MockSaveLookup::new();
        let transport = MockArchiveTransport::new();
        let archive = ArchiveHandle::open(sample_archive(&cipher)).expect("archive");
        let pipeline = pipeline(&lookup, &transport, &cipher, gate);

        let mut state = PipelineState::SectionsDecoding {
            descriptor: descriptor(),
            archive,
            sections: DecodedSections::default(),
        };
        for expected_next in [
            Some(SectionKey::User),
            Some(SectionKey::Settings),
            Some(SectionKey::GameRecord),
            None,
        ] {
            state = pipeline.advance(state);
            let PipelineState::SectionsDecoding { ref sections, .. } = state else {
                panic!("expected decoding state, got {}", state.name());
            };
            assert_eq!(sections.pending(), expected_next);
        }

        let done = pipeline.advance(state);
        assert!(matches!(done, PipelineState::Complete(_)));
    }

    #[rstest]
    fn terminal_states_do_not_move(cipher: AesSectionCipher, gate: VersionGate) {
        let lookup = MockSaveLookup::new();
        let transport = MockArchiveTransport::new();
        let pipeline = pipeline(&lookup, &transport, &cipher, gate);

        let failed = pipeline.advance(PipelineState::Failed(SaveError::NoSaveFound));

        assert!(failed.is_terminal());
        assert!(matches!(failed, PipelineState::Failed(SaveError::NoSaveFound)));
    }
}
