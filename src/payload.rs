//! Raw source payload schemas and tolerant tree primitives.
//!
//! Both ingest paths deliver semi-structured trees: the tracker API returns a
//! nested JSON "group" document, the preservation archive a pair of trees
//! derived from its XML descriptors. Every field here is optional and every
//! deserializer degrades to a default instead of failing, so even a garbage
//! payload still materializes; the mapping layer decides what survives into
//! the canonical document.

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

// ============================================================================
// LENIENT DESERIALIZATION
// ============================================================================

/// Deserialize a field, substituting the type's default on any shape mismatch.
///
/// This replaces blanket catch-and-ignore around each extraction: every field
/// that may be malformed is annotated explicitly, and the failure mode (absent
/// value) is visible in the schema.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    // Buffer into a Value first so a mismatch never poisons the outer stream.
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Numeric ids arrive as JSON numbers or numeric strings depending on the
/// tracker API version; anything else degrades to absent.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decode HTML entities in tracker-supplied text (group names arrive escaped).
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

// ============================================================================
// ARCHIVE TREE PRIMITIVES
// ============================================================================

/// A text-bearing node in an XML-derived tree: either a bare scalar or an
/// object wrapping its character data in a `text` field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextNode {
    Plain(String),
    Number(f64),
    Tagged {
        #[serde(default)]
        text: Option<Box<TextNode>>,
    },
}

impl TextNode {
    /// The node's text value, if it has one.
    pub fn text(&self) -> Option<String> {
        match self {
            TextNode::Plain(s) => Some(s.clone()),
            TextNode::Number(n) => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{}", n))
                }
            }
            TextNode::Tagged { text } => text.as_deref().and_then(TextNode::text),
        }
    }
}

/// Zero, one, or many text nodes. XML-derived trees collapse single-element
/// lists into bare values, so both shapes deserialize to the same thing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values(pub Vec<TextNode>);

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => Values(Vec::new()),
            Value::Array(items) => Values(
                items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
            ),
            other => Values(serde_json::from_value(other).ok().into_iter().collect()),
        })
    }
}

impl Values {
    /// All text values in document order.
    pub fn texts(&self) -> Vec<String> {
        self.0.iter().filter_map(TextNode::text).collect()
    }

    /// The first text value, if any.
    pub fn first(&self) -> Option<String> {
        self.0.iter().find_map(TextNode::text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// TRACKER PAYLOAD
// ============================================================================

/// Tracker API payload: a release group plus its torrent editions.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerPayload {
    #[serde(deserialize_with = "lenient")]
    pub response: TrackerResponse,
}

impl TrackerPayload {
    /// Total parse: malformed trees become the empty payload.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerResponse {
    #[serde(deserialize_with = "lenient")]
    pub group: TrackerGroup,
    #[serde(deserialize_with = "lenient")]
    pub torrents: Vec<TrackerTorrent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerGroup {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "recordLabel", deserialize_with = "lenient")]
    pub record_label: Option<String>,
    #[serde(rename = "catalogueNumber", deserialize_with = "lenient")]
    pub catalogue_number: Option<String>,
    #[serde(rename = "wikiImage", deserialize_with = "lenient")]
    pub wiki_image: Option<String>,
    #[serde(rename = "musicInfo", deserialize_with = "lenient")]
    pub music_info: RoleMap,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerTorrent {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(rename = "remasterRecordLabel", deserialize_with = "lenient")]
    pub remaster_record_label: Option<String>,
    #[serde(rename = "remasterCatalogueNumber", deserialize_with = "lenient")]
    pub remaster_catalogue_number: Option<String>,
}

/// One artist credit inside a `musicInfo` role list.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerArtist {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// Ordered role → artist-list mapping. Roles keep their document order so
/// downstream first-seen-order dedup is deterministic; a hash map would
/// scramble it.
#[derive(Clone, Debug, Default)]
pub struct RoleMap(pub Vec<(String, Vec<TrackerArtist>)>);

impl RoleMap {
    pub fn get(&self, role: &str) -> Option<&Vec<TrackerArtist>> {
        self.0
            .iter()
            .find(|(name, _)| name == role)
            .map(|(_, artists)| artists)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Vec<TrackerArtist>)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for RoleMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RoleMapVisitor;

        impl<'de> Visitor<'de> for RoleMapVisitor {
            type Value = RoleMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a role to artist-list mapping")
            }

            fn visit_map<A>(self, mut access: A) -> Result<RoleMap, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut roles = Vec::new();
                while let Some(role) = access.next_key::<String>()? {
                    let value: Value = access.next_value()?;
                    // Roles holding something other than an artist list are dropped.
                    if let Ok(artists) = serde_json::from_value(value) {
                        roles.push((role, artists));
                    }
                }
                Ok(RoleMap(roles))
            }
        }

        deserializer.deserialize_map(RoleMapVisitor)
    }
}

// ============================================================================
// ARCHIVE PAYLOAD
// ============================================================================

/// Archive payload: the metadata descriptor and the file listing, two
/// independently-shaped trees that arrive (and fail) independently.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArchivePayload {
    #[serde(deserialize_with = "lenient")]
    pub meta: MetaTree,
    #[serde(deserialize_with = "lenient")]
    pub files: FilesTree,
}

impl ArchivePayload {
    /// Total parse: malformed trees become the empty payload.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Assemble from separately-fetched descriptor trees.
    pub fn from_parts(meta: Value, files: Value) -> Self {
        ArchivePayload {
            meta: serde_json::from_value(meta).unwrap_or_default(),
            files: serde_json::from_value(files).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetaTree {
    #[serde(deserialize_with = "lenient")]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: Values,
    pub album: Values,
    pub artist: Values,
    pub creator: Values,
    pub year: Values,
    pub publisher: Values,
    pub identifier: Values,
    #[serde(rename = "external-identifier")]
    pub external_identifier: Values,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilesTree {
    #[serde(deserialize_with = "lenient")]
    pub files: FileList,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileList {
    #[serde(deserialize_with = "one_or_many")]
    pub file: Vec<ArchiveFile>,
}

/// One file record from the archive listing. `name` and `source` come from
/// XML attributes, the rest from child elements.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArchiveFile {
    #[serde(rename = "_name", deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(rename = "_source", deserialize_with = "lenient")]
    pub source: Option<String>,
    pub format: Values,
    pub sha1: Values,
    pub title: Values,
    pub artist: Values,
    pub album: Values,
    pub track: Values,
    pub length: Values,
    /// Absent and empty are distinct: subitem matching only considers files
    /// that carry the field at all.
    #[serde(rename = "external-identifier", deserialize_with = "lenient")]
    pub external_identifier: Option<Values>,
}

/// A single-record list and a bare record deserialize identically; malformed
/// entries are dropped rather than failing the listing.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        other => serde_json::from_value(other).ok().into_iter().collect(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
