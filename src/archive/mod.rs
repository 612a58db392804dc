//! Archive acquisition: download, container access, and section keys.
//!
//! # Sub-modules
//!
//! - [`container`]: Zip-backed [`ArchiveHandle`](container::ArchiveHandle)
//!   and the [`SectionKey`](container::SectionKey) names.
//! - [`fetcher`]: Download-then-open step of the pipeline.
//! - [`transport`]: Download trait and HTTP implementation.

pub mod container;
pub mod fetcher;
pub mod transport;
