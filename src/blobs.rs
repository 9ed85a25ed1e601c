//! Ephemeral in-memory byte handles for uploaded files.
//!
//! A handle stays valid until it is revoked. Revoking twice is a no-op.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobHandle(u64);

impl BlobHandle {
    pub fn id(self) -> u64 {
        self.0
    }

    /// Stable string form, used as a texture cache key.
    pub fn url(self) -> String {
        format!("blob:{}", self.0)
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: u64,
    blobs: HashMap<u64, Blob>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> BlobHandle {
        self.next_id += 1;
        let handle = BlobHandle(self.next_id);
        let blob = Blob {
            mime: mime.into(),
            bytes: bytes.into(),
        };
        log::debug!("created {} ({} bytes)", handle, blob.bytes.len());
        self.blobs.insert(handle.0, blob);
        handle
    }

    pub fn get(&self, handle: BlobHandle) -> Option<&Blob> {
        self.blobs.get(&handle.0)
    }

    /// Shared bytes of a live blob; cheap to move onto a worker.
    pub fn bytes(&self, handle: BlobHandle) -> Option<Arc<[u8]>> {
        self.blobs.get(&handle.0).map(|blob| blob.bytes.clone())
    }

    pub fn contains(&self, handle: BlobHandle) -> bool {
        self.blobs.contains_key(&handle.0)
    }

    /// Releases the bytes. Returns whether the handle was still live.
    pub fn revoke(&mut self, handle: BlobHandle) -> bool {
        let removed = self.blobs.remove(&handle.0).is_some();
        if removed {
            log::debug!("revoked {}", handle);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_until_revoked() {
        let mut store = BlobStore::new();
        let a = store.create("image/png", vec![1u8, 2, 3]);
        let b = store.create("image/png", vec![4u8]);
        assert_ne!(a, b);
        assert_ne!(a.url(), b.url());
        assert_eq!(store.get(a).unwrap().bytes.as_ref(), &[1, 2, 3]);

        assert!(store.revoke(a));
        assert!(!store.revoke(a));
        assert!(store.get(a).is_none());
        assert!(store.contains(b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_revoke() {
        let mut store = BlobStore::new();
        let first = store.create("model/stl", Vec::<u8>::new());
        store.revoke(first);
        let second = store.create("model/stl", Vec::<u8>::new());
        assert!(second.id() > first.id());
        assert_eq!(second.to_string(), second.url());
    }
}
