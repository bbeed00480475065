use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;

/// Fixed key namespace every drawing file is stored under
pub const DRAWINGS_NAMESPACE: &str = "drawings";

/// Longest extension kept from an uploaded filename
const MAX_EXTENSION_LEN: usize = 10;

/// Binary payload store addressed by object key
///
/// Keys are opaque to callers apart from the `drawings/` namespace; URLs
/// returned by [`FileStore::url_for`] must stay stable for the lifetime of
/// the object.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` under `key`, replacing any existing object
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Remove the object stored under `key`
    async fn remove(&self, key: &str) -> Result<()>;

    /// Resolve a key into a URL clients can fetch the payload from
    fn url_for(&self, key: &str) -> String;
}

/// Build a fresh object key for an uploaded file
///
/// The original filename only contributes its extension, lowercased and
/// restricted to ASCII alphanumerics; anything else falls back to `bin`.
/// Example: `drawings/0190f6c2-....png`
pub fn object_key(id: Uuid, original_filename: &str) -> String {
    let extension = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_string());

    format!("{}/{}.{}", DRAWINGS_NAMESPACE, id, extension)
}
