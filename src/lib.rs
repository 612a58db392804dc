//! Phigros cloud save retrieval.
//!
//! This crate resolves a session token to the player's cloud save, downloads
//! the archive and decodes its four sections (progress, user profile,
//! settings and play records) into typed values. Malformed song records are
//! collected alongside the save instead of failing the whole run.
//!
//! # Modules
//!
//! - [`archive`] - Archive download and named-section container
//! - [`config`] - TOML client configuration
//! - [`cursor`] - Forward-only byte reader used by the decoders
//! - [`decode`] - Section decoder trait and binary implementation
//! - [`error`] - Pipeline error taxonomy
//! - [`location`] - Save lookup and selection
//! - [`model`] - Decoded section entities
//! - [`pipeline`] - Retrieval state machine and entry points
//! - [`save`] - The assembled save
//! - [`section`] - Per-section decryption and version gating
//! - [`session`] - Session token validation
//!
//! # Example
//!
//! ```no_run
//! use phigros_save::{ClientConfig, fetch_save};
//!
//! let save = fetch_save("abcdefghijklmnopqrstu1234", &ClientConfig::default())?;
//! for error in save.record_errors() {
//!     eprintln!("skipped: {error}");
//! }
//! # Ok::<(), phigros_save::SaveError>(())
//! ```

pub mod archive;
pub mod config;
pub mod cursor;
pub mod decode;
pub mod error;
mod http;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod save;
pub mod section;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::{ClientConfig, ConfigError};
pub use error::{Result, SaveError};
pub use model::{Difficulty, RecordDecodeError, RecordHistory};
pub use pipeline::{Collaborators, PipelineState, SavePipeline, fetch_save, fetch_save_with};
pub use save::{PhigrosSave, SAVE_FORMAT_VERSION};
pub use section::VersionGate;
pub use session::SessionToken;
