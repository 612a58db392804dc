//! The save retrieval pipeline as an explicit state machine.
//!
//! A run moves through
//! `Unresolved → LocationResolved → ArchiveOpen → SectionsDecoding →
//! Complete | Failed`, one [`SavePipeline::advance`] call per transition.
//! Sections are decoded one per step in
//! [`SectionKey::ORDER`](crate::archive::container::SectionKey::ORDER), so the first
//! fatal error leaves every later section untouched.

use log::{info, warn};

use crate::archive::container::ArchiveHandle;
use crate::archive::fetcher::ArchiveFetcher;
use crate::archive::transport::{ArchiveTransport, HttpTransport};
use crate::config::ClientConfig;
use crate::decode::{BinaryDecoders, SectionDecoders};
use crate::error::{Result, SaveError};
use crate::location::lookup::{HttpSaveLookup, SaveLookup};
use crate::location::{SaveLocationResolver, SaveRecordDescriptor};
use crate::save::{DecodedSections, PhigrosSave};
use crate::section::{AesSectionCipher, SectionDecryptor, SectionPipeline, VersionGate};
use crate::session::SessionToken;

/// The external capabilities a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Save lookup service.
    pub lookup: &'a dyn SaveLookup,
    /// Archive download.
    pub transport: &'a dyn ArchiveTransport,
    /// Section payload decryption.
    pub decryptor: &'a dyn SectionDecryptor,
    /// Section decoders.
    pub decoders: &'a dyn SectionDecoders,
}

/// Where a run currently stands.
#[derive(Debug)]
pub enum PipelineState {
    /// A validated session awaiting lookup.
    Unresolved(SessionToken),
    /// The active save has been selected.
    LocationResolved(SaveRecordDescriptor),
    /// The archive has been downloaded and opened.
    ArchiveOpen {
        /// The selected save.
        descriptor: SaveRecordDescriptor,
        /// The opened archive.
        archive: ArchiveHandle,
    },
    /// Sections are being decoded in order.
    SectionsDecoding {
        /// The selected save.
        descriptor: SaveRecordDescriptor,
        /// The opened archive.
        archive: ArchiveHandle,
        /// Sections decoded so far.
        sections: DecodedSections,
    },
    /// Every section decoded.
    Complete(PhigrosSave),
    /// The run stopped on a fatal error.
    Failed(SaveError),
}

impl PipelineState {
    /// Whether the run has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed(_))
    }

    /// Short name of the state.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unresolved(_) => "unresolved",
            Self::LocationResolved(_) => "location-resolved",
            Self::ArchiveOpen { .. } => "archive-open",
            Self::SectionsDecoding { .. } => "sections-decoding",
            Self::Complete(_) => "complete",
            Self::Failed(_) => "failed",
        }
    }
}

/// Drives a run from a session token to a decoded save.
pub struct SavePipeline<'a> {
    collaborators: Collaborators<'a>,
    gate: VersionGate,
}

impl<'a> SavePipeline<'a> {
    /// Create a pipeline over `collaborators` with the given version gate.
    #[must_use]
    pub fn new(collaborators: Collaborators<'a>, gate: VersionGate) -> Self {
        Self {
            collaborators,
            gate,
        }
    }

    /// Perform a single transition.
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn advance(&self, state: PipelineState) -> PipelineState {
        match self.step(state) {
            Ok(next) => next,
            Err(err) => PipelineState::Failed(err),
        }
    }

    fn step(&self, state: PipelineState) -> Result<PipelineState> {
        let next = match state {
            PipelineState::Unresolved(session) => PipelineState::LocationResolved(
                SaveLocationResolver::new(self.collaborators.lookup).resolve(&session)?,
            ),
            PipelineState::LocationResolved(descriptor) => {
                let archive =
                    ArchiveFetcher::new(self.collaborators.transport).fetch(descriptor.locator())?;
                PipelineState::ArchiveOpen {
                    descriptor,
                    archive,
                }
            }
            PipelineState::ArchiveOpen {
                descriptor,
                archive,
            } => PipelineState::SectionsDecoding {
                descriptor,
                archive,
                sections: DecodedSections::default(),
            },
            PipelineState::SectionsDecoding {
                descriptor,
                mut archive,
                mut sections,
            } => match sections.pending() {
                Some(section) => {
                    sections.insert(self.sections().extract(&mut archive, section)?);
                    PipelineState::SectionsDecoding {
                        descriptor,
                        archive,
                        sections,
                    }
                }
                None => PipelineState::Complete(sections.assemble(descriptor)?),
            },
            terminal @ (PipelineState::Complete(_) | PipelineState::Failed(_)) => terminal,
        };
        Ok(next)
    }

    fn sections(&self) -> SectionPipeline<'_> {
        SectionPipeline::new(
            self.collaborators.decryptor,
            self.collaborators.decoders,
            &self.gate,
        )
    }

    /// Run every transition for `session`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`SaveError`]; no partial save is returned.
    pub fn run(&self, session: SessionToken) -> Result<PhigrosSave> {
        let mut state = PipelineState::Unresolved(session);
        loop {
            state = match self.advance(state) {
                PipelineState::Complete(save) => {
                    report(&save);
                    return Ok(save);
                }
                PipelineState::Failed(err) => return Err(err),
                next => next,
            };
        }
    }
}

fn report(save: &PhigrosSave) {
    let skipped = save.record_errors().len();
    if skipped > 0 {
        warn!("save decoded with {skipped} unreadable song records");
    }
    info!("decoded save with {} song records", save.records().len());
}

/// Retrieve and decode the save for `session` with injected collaborators.
///
/// The session is validated before any collaborator is called. `gate` adds
/// checks for other sections; `gameRecord` is always checked against
/// [`SectionDecoders::record_version`] of `collaborators.decoders`.
///
/// # Errors
///
/// Returns [`SaveError::InvalidSessionFormat`] for a malformed token and
/// the first fatal error of the run otherwise.
pub fn fetch_save_with(
    session: &str,
    collaborators: &Collaborators<'_>,
    gate: VersionGate,
) -> Result<PhigrosSave> {
    let session = SessionToken::try_from(session)?;
    SavePipeline::new(*collaborators, gate).run(session)
}

/// Retrieve and decode the save for `session` from the live service.
///
/// # Errors
///
/// As [`fetch_save_with`], plus [`SaveError::Config`] if `config` fails
/// [`ClientConfig::validate`].
///
/// # Examples
///
/// ```no_run
/// use phigros_save::{ClientConfig, fetch_save};
///
/// let save = fetch_save("abcdefghijklmnopqrstuvwxy", &ClientConfig::default())?;
/// println!("{} songs", save.records().len());
/// # Ok::<(), phigros_save::SaveError>(())
/// ```
pub fn fetch_save(session: &str, config: &ClientConfig) -> Result<PhigrosSave> {
    let session = SessionToken::try_from(session)?;
    config.validate()?;
    let decoders = BinaryDecoders;
    let gate = config.apply_version_gate(VersionGate::new())?;
    let lookup = HttpSaveLookup::new(&config.lookup, &config.transport);
    let transport = HttpTransport::new(&config.transport);
    let cipher = AesSectionCipher::default();
    let collaborators = Collaborators {
        lookup: &lookup,
        transport: &transport,
        decryptor: &cipher,
        decoders: &decoders,
    };
    SavePipeline::new(collaborators, gate).run(session)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
