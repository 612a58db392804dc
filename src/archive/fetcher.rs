//! Download-then-open step of the pipeline.

use log::debug;
use url::Url;

use super::container::ArchiveHandle;
use super::transport::ArchiveTransport;
use crate::error::{Result, SaveError};

/// Retrieves a save archive and opens it as a named-stream container.
pub struct ArchiveFetcher<'a> {
    transport: &'a dyn ArchiveTransport,
}

impl<'a> ArchiveFetcher<'a> {
    /// Create a fetcher over the given transport.
    #[must_use]
    pub fn new(transport: &'a dyn ArchiveTransport) -> Self {
        Self { transport }
    }

    /// Download the archive at `locator` and open it.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Transport`] if the download fails and
    /// [`SaveError::ArchiveOpenError`] if the body is not a readable
    /// container.
    pub fn fetch(&self, locator: &Url) -> Result<ArchiveHandle> {
        let blob = self.transport.download(locator)?;
        debug!("downloaded save archive ({} bytes)", blob.len());
        ArchiveHandle::open(blob).map_err(|source| SaveError::ArchiveOpenError { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::container::SectionKey;
    use crate::archive::transport::{MockArchiveTransport, TransportError};
    use crate::test_utils::build_archive;

    fn locator() -> Url {
        Url::parse("https://files.example.test/save.zip").expect("valid url")
    }

    #[test]
    fn opens_downloaded_archive() {
        let mut transport = MockArchiveTransport::new();
        transport
            .expect_download()
            .withf(|url| url.as_str() == "https://files.example.test/save.zip")
            .times(1)
            .returning(|_| Ok(build_archive(&[("gameRecord", vec![1, 2])])));

        let mut handle = ArchiveFetcher::new(&transport)
            .fetch(&locator())
            .expect("fetch");
        assert_eq!(
            handle.section(SectionKey::GameRecord).expect("read"),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn corrupt_blob_is_an_open_error() {
        let mut transport = MockArchiveTransport::new();
        transport
            .expect_download()
            .returning(|_| Ok(b"PK\x03\x04 truncated".to_vec()));

        let result = ArchiveFetcher::new(&transport).fetch(&locator());
        assert!(matches!(result, Err(SaveError::ArchiveOpenError { .. })));
    }

    #[test]
    fn transport_failure_propagates() {
        let mut transport = MockArchiveTransport::new();
        transport.expect_download().returning(|url| {
            Err(TransportError::NotFound {
                url: url.to_string(),
            })
        });

        let result = ArchiveFetcher::new(&transport).fetch(&locator());
        assert!(matches!(
            result,
            Err(SaveError::Transport(TransportError::NotFound { .. }))
        ));
    }
}
