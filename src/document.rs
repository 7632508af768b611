//! Canonical release document model.
//!
//! One release, normalized from both ingest paths: candidate-list scalar
//! fields (the consumer picks which candidate to display), an ordered track
//! list, linked-entity records, and automatic-match candidates against the
//! external identifier namespace. Scalar fields hold *lists* on purpose:
//! neither source is authoritative, so the document keeps every distinct
//! candidate in precedence order instead of guessing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version of the release document.
pub const RELEASE_VERSION: u32 = 12;
/// Schema version of the linked-entity record.
pub const LINKS_VERSION: u32 = 2;
/// Schema version of the link-type descriptors.
pub const LINK_TYPES_VERSION: u32 = 1;

// ============================================================================
// RELEASE DOCUMENT
// ============================================================================

/// An artist credit, optionally cross-referenced to a linked artist record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditedArtist {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subitem: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Url {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One track, derived from a linkable file record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// File identity, `file-<sha1>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subitem: Option<String>,
    pub title: Vec<String>,
    pub artist: Vec<CreditedArtist>,
    /// Track length in milliseconds.
    pub length: Vec<i64>,
    pub length_formatted: Vec<String>,
    pub number: Vec<String>,
    pub totaltracks: Vec<String>,
    /// Disc number, detected from filename/album text.
    pub medium: Vec<String>,
    pub acoustid: Vec<String>,
}

/// The canonical release document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub title: Vec<String>,
    pub date: Vec<String>,
    pub artist: Vec<CreditedArtist>,
    pub other_artist: Vec<CreditedArtist>,
    /// Comma-joined primary artist names; a rendering convenience, not
    /// authoritative data.
    pub combined_artist: String,
    pub label: Vec<Label>,
    pub catalog_number: Vec<String>,
    pub tracks: Vec<Track>,
    pub urls: Vec<Url>,
    pub version: u32,
}

impl Release {
    /// The empty canonical skeleton: every list pre-initialized, current
    /// schema version stamped.
    pub fn empty() -> Self {
        Release {
            title: Vec::new(),
            date: Vec::new(),
            artist: Vec::new(),
            other_artist: Vec::new(),
            combined_artist: String::new(),
            label: Vec::new(),
            catalog_number: Vec::new(),
            tracks: Vec::new(),
            urls: Vec::new(),
            version: RELEASE_VERSION,
        }
    }
}

impl Default for Release {
    fn default() -> Self {
        Release::empty()
    }
}

// ============================================================================
// LINKED ENTITIES
// ============================================================================

/// An artist known to the tracker, with its source-specific numeric id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedArtist {
    pub name: String,
    pub tracker_artist_id: i64,
    /// Role the credit appeared under (`artist`, `remixer`, `composer`, ...).
    #[serde(rename = "type")]
    pub kind: String,
}

/// A canonical-copy file from the archive listing, keyed by checksum.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedFile {
    pub sha1: String,
    pub format: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Length in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub acoustid: Vec<String>,
}

/// Entity records extracted alongside the release document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntities {
    pub artist_id: Vec<LinkedArtist>,
    pub file: Vec<LinkedFile>,
    pub version: u32,
}

impl Default for LinkedEntities {
    fn default() -> Self {
        LinkedEntities {
            artist_id: Vec::new(),
            file: Vec::new(),
            version: LINKS_VERSION,
        }
    }
}

// ============================================================================
// LINK TYPES
// ============================================================================

/// Descriptor for one linked collection: display name, the record field that
/// identifies a subitem, and the external entity types it may match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkType {
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkTypes {
    pub artist_id: LinkType,
    pub file: LinkType,
    pub version: u32,
}

// ============================================================================
// AUTOMATIC MATCHES
// ============================================================================

/// Candidate identifiers for the release itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMatches {
    pub release: Vec<String>,
    #[serde(rename = "release-group")]
    pub release_group: Vec<String>,
}

/// Candidate recording identifiers for one file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMatches {
    pub recording: Vec<String>,
}

/// Per-file matches keyed by `file-<sha1>`. Ordered map so serialized output
/// is stable across runs.
pub type SubitemMatches = BTreeMap<String, RecordingMatches>;

// ============================================================================
// MAP OPTIONS
// ============================================================================

/// Presence flags over the track list, consumed by the renderer to decide
/// which columns to show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOptions {
    pub mediums: bool,
    pub totaltracks: bool,
    pub acoustid: bool,
}
