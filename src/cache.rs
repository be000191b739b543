//! Content-addressed on-disk image cache
//!
//! Keyed by hex(sha-256(url)): one file per image, raw bytes on disk,
//! base64 handed to callers. The cache only grows; nothing invalidates
//! entries. Workers share the directory with no locking - a concurrent
//! miss on the same key can fetch and write twice, which is tolerated
//! because the content is idempotent.

use crate::client::RemoteClient;
use crate::error::CacheError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A resolved image: base64 payload plus the cache location, when the
/// blob was served from or persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// On-disk location of the blob; `None` when caching is disabled or
    /// persistence failed.
    pub cache_path: Option<PathBuf>,
    /// Image bytes, base64-encoded.
    pub data_base64: String,
}

/// Read-through image cache over [`RemoteClient`].
#[derive(Debug, Clone)]
pub struct ImageCache {
    client: RemoteClient,
    dir: Option<PathBuf>,
}

impl ImageCache {
    /// Create a cache rooted at `dir`; `None` disables caching and every
    /// resolve becomes a pass-through fetch.
    #[inline]
    #[must_use]
    pub fn new(client: RemoteClient, dir: Option<PathBuf>) -> Self {
        Self { client, dir }
    }

    /// Deterministic cache key for a source URL.
    #[must_use]
    pub fn cache_key(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    /// Resolve a URL to its image bytes, via the cache when enabled.
    ///
    /// A readable entry under the key short-circuits the network. On a
    /// miss the image is fetched and then persisted; if persistence
    /// fails the data is still returned but no cache entry is
    /// established.
    ///
    /// # Errors
    /// Only fetch failures surface; callers treat them as non-fatal.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedImage, CacheError> {
        let entry = self.dir.as_ref().map(|dir| dir.join(Self::cache_key(url)));

        if let Some(path) = &entry {
            if let Ok(bytes) = tokio::fs::read(path).await {
                debug!(%url, path = %path.display(), "image cache hit");
                return Ok(ResolvedImage {
                    cache_path: Some(path.clone()),
                    data_base64: BASE64.encode(&bytes),
                });
            }
        }

        let bytes = self
            .client
            .fetch_image(url)
            .await
            .map_err(|source| CacheError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let cache_path = match &entry {
            Some(path) => self.persist(path, &bytes).await,
            None => None,
        };

        Ok(ResolvedImage {
            cache_path,
            data_base64: BASE64.encode(&bytes),
        })
    }

    /// Best-effort write of a fetched blob; returns the path only when
    /// the entry was established.
    async fn persist(&self, path: &Path, bytes: &[u8]) -> Option<PathBuf> {
        if let Some(parent) = path.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %path.display(), %err, "cannot create cache directory");
                return None;
            }
        }
        match tokio::fs::write(path, bytes).await {
            Ok(()) => Some(path.to_path_buf()),
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot persist cached image");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_deterministic() {
        let a = ImageCache::cache_key("http://img.example/p.jpg");
        let b = ImageCache::cache_key("http://img.example/p.jpg");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_key_differs_per_url() {
        let a = ImageCache::cache_key("http://img.example/a.jpg");
        let b = ImageCache::cache_key("http://img.example/b.jpg");
        assert_ne!(a, b);
    }
}
