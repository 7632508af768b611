//! External collaborator contracts.
//!
//! The engine hands finished documents to an indexing/document store, asks an
//! identifier-classification service about opaque ids, and leaves rendering
//! to a view layer. None of that logic lives in this crate, only the
//! interfaces, plus an in-memory store used by the CLI and tests.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::document::{MapOptions, Release};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Document store contract: index canonical releases by opaque item id,
/// retrieve them, and answer exact-match subitem queries.
pub trait DocumentStore {
    fn index(&mut self, item_id: &str, release: &Release) -> Result<(), StoreError>;
    fn get(&self, item_id: &str) -> Result<Release, StoreError>;
    /// Item ids whose document references the given subitem key
    /// (`artist_id-<id>` or `file-<sha1>`).
    fn find_by_subitem(&self, subitem: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to fetch identifier {0}")]
    Fetch(String),
    #[error("unrecognized identifier {0}")]
    Unknown(String),
}

/// Entity kinds the external identifier namespace distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Artist,
    Release,
    ReleaseGroup,
    Recording,
}

/// Identifier-classification contract: opaque identifier string → entity kind.
pub trait IdentifierClassifier {
    fn classify(&self, identifier: &str) -> Result<EntityKind, ClassifyError>;
}

/// Rendering contract: canonical document plus its presence flags → a
/// human-facing view.
pub trait Renderer {
    fn render(&self, release: &Release, options: &MapOptions) -> String;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Ordered in-memory store; enough for the CLI and for exercising the
/// contract in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, Release>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn index(&mut self, item_id: &str, release: &Release) -> Result<(), StoreError> {
        self.items.insert(item_id.to_string(), release.clone());
        Ok(())
    }

    fn get(&self, item_id: &str) -> Result<Release, StoreError> {
        self.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(item_id.to_string()))
    }

    fn find_by_subitem(&self, subitem: &str) -> Result<Vec<String>, StoreError> {
        let matches = self
            .items
            .iter()
            .filter(|(_, release)| {
                let in_tracks = release.tracks.iter().any(|track| {
                    track.subitem.as_deref() == Some(subitem)
                        || track
                            .artist
                            .iter()
                            .any(|artist| artist.subitem.as_deref() == Some(subitem))
                });
                let in_artists = release
                    .artist
                    .iter()
                    .chain(release.other_artist.iter())
                    .any(|artist| artist.subitem.as_deref() == Some(subitem));
                in_tracks || in_artists
            })
            .map(|(id, _)| id.clone())
            .collect();
        Ok(matches)
    }
}

// ============================================================================
// TESTS
// ============================================================================
