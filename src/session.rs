//! Screen routing and the ephemeral handoff between the upload screen and the
//! viewer.
//!
//! The store holds one entry per [`SessionKey`]. Each key has a fixed
//! [`ClearPolicy`]:
//! - `UploadedModel` is cleared on consume: the viewer takes it exactly once.
//!   It is also dropped when navigation leaves the upload flow, so an abandoned
//!   upload cannot be picked up later.
//!
//! Dropped entries are handed back to the caller so it can release their blobs.

use crate::assets::ModelFormat;
use crate::blobs::BlobHandle;
use crate::shapes::ShapeSelection;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Welcome,
    Gallery,
    Upload,
    Viewer(ShapeSelection),
}

impl Route {
    /// Parses a path. Anything unrecognised lands on the gallery.
    pub fn parse(path: &str) -> Route {
        let path = path.trim_end_matches('/');
        match path {
            "" => Route::Welcome,
            "/explore" => Route::Gallery,
            "/upload" => Route::Upload,
            _ => match path.strip_prefix("/shape/") {
                Some(segment) => match ShapeSelection::from_route(segment) {
                    Ok(selection) => Route::Viewer(selection),
                    Err(err) => {
                        log::warn!("{}; redirecting to the gallery", err);
                        Route::Gallery
                    }
                },
                None => {
                    log::warn!("no route for '{}'; redirecting to the gallery", path);
                    Route::Gallery
                }
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Welcome => "/".to_string(),
            Route::Gallery => "/explore".to_string(),
            Route::Upload => "/upload".to_string(),
            Route::Viewer(selection) => format!("/shape/{}", selection.route()),
        }
    }

    /// Routes between which a staged upload survives.
    fn is_upload_flow(&self) -> bool {
        matches!(
            self,
            Route::Upload | Route::Viewer(ShapeSelection::CustomModel)
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Metadata of an uploaded model waiting for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedModel {
    pub name: String,
    pub format: ModelFormat,
    pub blob: BlobHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    UploadedModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearPolicy {
    OnConsume,
    OnNavigateAway,
}

impl SessionKey {
    pub fn policies(self) -> &'static [ClearPolicy] {
        match self {
            SessionKey::UploadedModel => &[ClearPolicy::OnConsume, ClearPolicy::OnNavigateAway],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEntry {
    UploadedModel(UploadedModel),
}

impl SessionEntry {
    pub fn key(&self) -> SessionKey {
        match self {
            SessionEntry::UploadedModel(_) => SessionKey::UploadedModel,
        }
    }

    pub fn blob(&self) -> Option<BlobHandle> {
        match self {
            SessionEntry::UploadedModel(model) => Some(model.blob),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    entries: HashMap<SessionKey, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry, returning whatever it replaced.
    pub fn put(&mut self, entry: SessionEntry) -> Option<SessionEntry> {
        self.entries.insert(entry.key(), entry)
    }

    pub fn peek(&self, key: SessionKey) -> Option<&SessionEntry> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Reads an entry. Keys cleared on consume are removed by the read.
    pub fn take(&mut self, key: SessionKey) -> Option<SessionEntry> {
        if key.policies().contains(&ClearPolicy::OnConsume) {
            self.entries.remove(&key)
        } else {
            self.entries.get(&key).cloned()
        }
    }

    pub fn put_uploaded_model(&mut self, model: UploadedModel) -> Option<UploadedModel> {
        match self.put(SessionEntry::UploadedModel(model)) {
            Some(SessionEntry::UploadedModel(previous)) => Some(previous),
            None => None,
        }
    }

    pub fn take_uploaded_model(&mut self) -> Option<UploadedModel> {
        match self.take(SessionKey::UploadedModel) {
            Some(SessionEntry::UploadedModel(model)) => Some(model),
            None => None,
        }
    }

    /// Applies navigate-away policies for a move to `to`; returns the dropped entries.
    pub fn navigate(&mut self, to: &Route) -> Vec<SessionEntry> {
        let stale: Vec<SessionKey> = self
            .entries
            .keys()
            .copied()
            .filter(|key| {
                key.policies().contains(&ClearPolicy::OnNavigateAway) && !to.is_upload_flow()
            })
            .collect();
        stale
            .into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .inspect(|entry| log::debug!("session entry {:?} cleared leaving for {}", entry.key(), to))
            .collect()
    }

    pub fn clear(&mut self) -> Vec<SessionEntry> {
        self.entries.drain().map(|(_, entry)| entry).collect()
    }
}
