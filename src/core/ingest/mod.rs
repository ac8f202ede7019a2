//! # Ingest Module
//!
//! Turns a query image into a fingerprint.
//!
//! A query can arrive as uploaded bytes, a local file, or a remote URL. All
//! three end in the same place: decode, canonicalise to 8-bit RGB, hash.
//! Failures are scoped to the query and typed:
//! - `IngestError::DecodeFailure` - the bytes are not a supported image
//! - `IngestError::FetchFailure` - the remote image could not be retrieved
//! - `IngestError::Unreadable` - the local file could not be read

mod decode;
mod fetch;
mod file_bytes;

pub use decode::{canonicalize, ImageDecoder};
pub use fetch::{FetchConfig, RemoteFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_DOWNLOAD_BYTES};
pub use file_bytes::{read_file_bytes, FileBytes};

use crate::core::hasher::{Fingerprint, HashAlgorithm, HasherConfig};
use crate::error::LookalikeError;
use crate::events::{null_sender, Event, EventSender, IngestEvent};
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Where a query image comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    /// Raw uploaded bytes
    Bytes(Vec<u8>),
    /// A file on the local disk
    Path(PathBuf),
    /// An http(s) URL
    Url(String),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Bytes(bytes) => write!(f, "<{} uploaded bytes>", bytes.len()),
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Url(url) => write!(f, "{}", url),
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

/// Decodes query images and hashes them
pub struct ImageIngestor {
    hasher: Box<dyn HashAlgorithm>,
    fetcher: RemoteFetcher,
}

impl ImageIngestor {
    /// Ingestor with the default perceptual hash and fetch settings
    pub fn new() -> Result<Self, LookalikeError> {
        Ok(Self::with_parts(
            HasherConfig::default().build()?,
            RemoteFetcher::new(FetchConfig::default())?,
        ))
    }

    /// Ingestor from an explicit hasher and fetcher
    pub fn with_parts(hasher: Box<dyn HashAlgorithm>, fetcher: RemoteFetcher) -> Self {
        Self { hasher, fetcher }
    }

    /// The hash algorithm in use
    pub fn hasher(&self) -> &dyn HashAlgorithm {
        self.hasher.as_ref()
    }

    /// Fingerprint an image held in memory
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Fingerprint, LookalikeError> {
        self.hash_bytes(bytes, "uploaded bytes", &null_sender())
    }

    /// Fingerprint an image on the local disk
    pub fn from_path(&self, path: impl Into<PathBuf>) -> Result<Fingerprint, LookalikeError> {
        self.ingest_with_events(&ImageSource::Path(path.into()), &null_sender())
    }

    /// Fingerprint a remote image using the configured timeout
    pub fn from_remote(&self, url: &str) -> Result<Fingerprint, LookalikeError> {
        self.from_remote_with_timeout(url, self.fetcher.config().timeout)
    }

    /// Fingerprint a remote image with an explicit timeout
    pub fn from_remote_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Fingerprint, LookalikeError> {
        let bytes = self.fetcher.fetch_with_timeout(url, timeout)?;
        self.hash_bytes(&bytes, url, &null_sender())
    }

    /// Fingerprint any source
    pub fn ingest(&self, source: &ImageSource) -> Result<Fingerprint, LookalikeError> {
        self.ingest_with_events(source, &null_sender())
    }

    /// Fingerprint any source, reporting progress
    pub fn ingest_with_events(
        &self,
        source: &ImageSource,
        events: &EventSender,
    ) -> Result<Fingerprint, LookalikeError> {
        events.send(Event::Ingest(IngestEvent::Started {
            source: source.to_string(),
        }));

        match source {
            ImageSource::Bytes(bytes) => self.hash_bytes(bytes, "uploaded bytes", events),
            ImageSource::Path(path) => {
                let bytes = read_file_bytes(path)?;
                debug!(path = %path.display(), mapped = bytes.is_mapped(), "Read query image");
                self.hash_bytes(&bytes, &path.display().to_string(), events)
            }
            ImageSource::Url(url) => {
                let bytes = self.fetcher.fetch(url)?;
                events.send(Event::Ingest(IngestEvent::Fetched {
                    url: url.clone(),
                    bytes: bytes.len(),
                }));
                self.hash_bytes(&bytes, url, events)
            }
        }
    }

    fn hash_bytes(
        &self,
        bytes: &[u8],
        origin: &str,
        events: &EventSender,
    ) -> Result<Fingerprint, LookalikeError> {
        let image = ImageDecoder::decode(bytes, origin)?;
        let (width, height) = image.dimensions();
        events.send(Event::Ingest(IngestEvent::Decoded { width, height }));

        let fingerprint = self.hasher.hash_image(&image)?;
        debug!(
            origin,
            width,
            height,
            algorithm = %self.hasher.kind(),
            fingerprint = %fingerprint,
            "Hashed query image"
        );
        events.send(Event::Ingest(IngestEvent::Hashed {
            fingerprint: fingerprint.to_hex(),
        }));

        Ok(fingerprint)
    }
}
