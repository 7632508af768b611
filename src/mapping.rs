//! Extraction rules that reconcile the two source payloads into one canonical
//! release document.
//!
//! Both sources are partial and unreliable, so every rule is independently
//! fallback-tolerant: a missing or malformed field degrades that one output
//! field to its empty default and nothing else. Mapping never fails and is
//! deterministic; worse input just produces an emptier document.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::collate::{comma_list, format_track_length, uniq, SortKey};
use crate::document::{
    CreditedArtist, ItemMatches, Label, LinkType, LinkTypes, LinkedArtist, LinkedEntities,
    LinkedFile, MapOptions, RecordingMatches, Release, SubitemMatches, Track, Url,
    LINKS_VERSION, LINK_TYPES_VERSION,
};
use crate::payload::{unescape_html, ArchiveFile, ArchivePayload, TrackerPayload, Values};

/// Both source payloads for one release, fetched and materialized by the
/// caller. Either side may be entirely empty.
#[derive(Clone, Debug, Default)]
pub struct MappedSources {
    pub tracker: TrackerPayload,
    pub archive: ArchivePayload,
}

/// Formats eligible for file linking: the lossless encodings plus the two
/// lossy encodings the archive accepts as canonical copies.
const ACCEPTABLE_FORMATS: [&str; 5] = [
    "Flac",
    "24bit Flac",
    "Apple Lossless Audio",
    "VBR MP3",
    "Ogg Vorbis",
];

const ACOUSTID_PREFIX: &str = "urn:acoustid:";
const ACOUSTID_UNKNOWN: &str = "urn:acoustid:unknown";
const RELEASE_ID_PREFIX: &str = "urn:mb_release_id:";
const RELEASE_GROUP_ID_PREFIX: &str = "urn:mb_releasegroup_id:";
const RECORDING_ID_PREFIX: &str = "urn:mb_recording_id:";

/// Disc markers in filenames and album text: "CD2", "Disc 1", "disk3".
static DISC_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(cd|dis[ck])\s*(\d+)").unwrap());

// ============================================================================
// MAPPER CAPABILITY
// ============================================================================

/// The capability surface of a source mapper.
pub trait Mapper {
    /// Descriptors for the linked collections this mapper produces.
    fn link_types(&self) -> LinkTypes;
    /// Extract linked-entity records (artists, files).
    fn extract_linked(&self, sources: &MappedSources) -> LinkedEntities;
    /// Map both payloads into the canonical release document.
    fn map(&self, sources: &MappedSources) -> Release;
    /// Candidate identifiers for the release itself.
    fn automatic_item_matches(&self, sources: &MappedSources) -> ItemMatches;
    /// Candidate recording identifiers per linkable file.
    fn automatic_subitem_matches(&self, sources: &MappedSources) -> SubitemMatches;
}

/// Closed enumeration of supported source pairings, resolved to a mapper at
/// startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    TrackerArchive,
}

impl SourceKind {
    pub fn mapper(self) -> &'static dyn Mapper {
        match self {
            SourceKind::TrackerArchive => &TrackerArchiveMapper,
        }
    }
}

/// Presence flags over the track list, for the renderer.
pub fn map_options(release: &Release) -> MapOptions {
    MapOptions {
        mediums: release.tracks.iter().any(|t| !t.medium.is_empty()),
        totaltracks: release.tracks.iter().any(|t| !t.totaltracks.is_empty()),
        acoustid: release.tracks.iter().any(|t| !t.acoustid.is_empty()),
    }
}

// ============================================================================
// TRACKER + ARCHIVE MAPPER
// ============================================================================

/// Mapper for the tracker-JSON / archive-XML source pairing.
pub struct TrackerArchiveMapper;

/// Credit roles are remapped to the names the linked-artist records use;
/// unknown roles pass through.
fn role_name(role: &str) -> &str {
    match role {
        "artists" => "artist",
        "with" => "with",
        "remixedBy" => "remixer",
        "composers" => "composer",
        other => other,
    }
}

/// Python-style truthiness for optional text: present and non-empty.
fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// A file is linkable only if it is the canonical/original copy, carries a
/// checksum, and uses a whitelisted format.
fn linkable_files(archive: &ArchivePayload) -> Vec<&ArchiveFile> {
    archive
        .files
        .files
        .file
        .iter()
        .filter(|f| f.source.as_deref() == Some("original"))
        .filter(|f| f.sha1.first().is_some())
        .filter(|f| {
            f.format
                .first()
                .is_some_and(|fmt| ACCEPTABLE_FORMATS.contains(&fmt.as_str()))
        })
        .collect()
}

/// Values with the given prefix, prefix stripped.
fn prefixed_values(values: &Values, prefix: &str) -> Vec<String> {
    values
        .texts()
        .into_iter()
        .filter_map(|text| text.strip_prefix(prefix).map(str::to_string))
        .collect()
}

/// Acoustic-fingerprint ids, excluding the tagger's "unknown" placeholder.
fn acoustid_values(values: &Values) -> Vec<String> {
    values
        .texts()
        .into_iter()
        .filter(|text| text.as_str() != ACOUSTID_UNKNOWN)
        .filter_map(|text| text.strip_prefix(ACOUSTID_PREFIX).map(str::to_string))
        .collect()
}

/// Parse an archive length field (fractional seconds) into milliseconds.
fn parse_length_ms(text: &str) -> Option<i64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .map(|secs| (secs * 1000.0).round() as i64)
}

/// Canonicalize a track-number segment: integer string when parseable,
/// verbatim otherwise.
fn canonical_number(raw: &str) -> String {
    raw.trim()
        .parse::<i64>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn extract_file(file: &ArchiveFile) -> LinkedFile {
    LinkedFile {
        sha1: file.sha1.first().unwrap_or_default(),
        format: file.format.first().unwrap_or_default(),
        filename: file.name.clone().unwrap_or_default(),
        title: file.title.first(),
        artist: file.artist.first(),
        length: file.length.first().as_deref().and_then(parse_length_ms),
        number: file.track.first(),
        acoustid: file
            .external_identifier
            .as_ref()
            .map(acoustid_values)
            .unwrap_or_default(),
    }
}

/// Exact-name index over the linked artists; on duplicate names the first
/// (first-seen) record wins.
fn artist_index(links: &LinkedEntities) -> FxHashMap<String, i64> {
    let mut index = FxHashMap::default();
    for artist in &links.artist_id {
        index
            .entry(artist.name.clone())
            .or_insert(artist.tracker_artist_id);
    }
    index
}

fn extract_track(file: &ArchiveFile, artists: &FxHashMap<String, i64>) -> Track {
    let mut track = Track::default();
    track.subitem = file.sha1.first().map(|sha1| format!("file-{}", sha1));
    track.title = file.title.first().into_iter().collect();

    if let Some(name) = file.artist.first() {
        // Exact-name cross-reference against the linked artists.
        let subitem = artists
            .get(&name)
            .map(|id| format!("artist_id-{}", id));
        track.artist = vec![CreditedArtist { name, subitem }];
    }

    if let Some(length) = file.length.first().as_deref().and_then(parse_length_ms) {
        track.length = vec![length];
        track.length_formatted = vec![format_track_length(length)];
    }

    // "<n>/<total>" style track field: first segment is the number, the
    // second (when present) the total.
    if let Some(text) = file.track.first() {
        let mut segments = text.splitn(2, '/');
        if let Some(number) = segments.next() {
            track.number.push(canonical_number(number));
        }
        if let Some(total) = segments.next() {
            track.totaltracks.push(canonical_number(total));
        }
    }

    let mut mediums = Vec::new();
    if let Some(name) = file.name.as_deref() {
        if let Some(captures) = DISC_PATTERN.captures(name) {
            mediums.push(captures[2].to_string());
        }
    }
    if let Some(album) = file.album.first() {
        if let Some(captures) = DISC_PATTERN.captures(&album) {
            mediums.push(captures[2].to_string());
        }
    }
    track.medium = uniq(mediums);

    track.acoustid = file
        .external_identifier
        .as_ref()
        .map(acoustid_values)
        .unwrap_or_default();

    track
}

/// The torrent whose id matches the numeric final `_`-delimited token of the
/// archive identifier; carries remaster label/catalogue overrides.
fn matching_torrent(sources: &MappedSources) -> Option<&crate::payload::TrackerTorrent> {
    let identifier = sources.archive.meta.metadata.identifier.first()?;
    let wanted: i64 = identifier.rsplit('_').next()?.parse().ok()?;
    sources
        .tracker
        .response
        .torrents
        .iter()
        .find(|torrent| torrent.id == Some(wanted))
}

impl Mapper for TrackerArchiveMapper {
    fn link_types(&self) -> LinkTypes {
        LinkTypes {
            artist_id: LinkType {
                name: "artist id".to_string(),
                key: "tracker_artist_id".to_string(),
                types: vec!["artist".to_string()],
            },
            file: LinkType {
                name: "file sha1".to_string(),
                key: "sha1".to_string(),
                types: vec!["recording".to_string()],
            },
            version: LINK_TYPES_VERSION,
        }
    }

    fn extract_linked(&self, sources: &MappedSources) -> LinkedEntities {
        let mut artists = Vec::new();
        for (role, members) in sources.tracker.response.group.music_info.iter() {
            for member in members {
                if let (Some(id), Some(name)) = (member.id, member.name.as_ref()) {
                    artists.push(LinkedArtist {
                        name: name.clone(),
                        tracker_artist_id: id,
                        kind: role_name(role).to_string(),
                    });
                }
            }
        }

        let files = linkable_files(&sources.archive)
            .into_iter()
            .map(extract_file)
            .collect();

        LinkedEntities {
            artist_id: uniq(artists),
            file: uniq(files),
            version: LINKS_VERSION,
        }
    }

    fn map(&self, sources: &MappedSources) -> Release {
        let mut release = Release::empty();
        let group = &sources.tracker.response.group;
        let metadata = &sources.archive.meta.metadata;

        // Title: tracker group name first, then archive album, then the
        // archive title with the "Various Artists / <title>" convention.
        let mut titles: Vec<String> = group
            .name
            .as_deref()
            .map(unescape_html)
            .into_iter()
            .collect();
        titles.extend(metadata.album.texts());
        if let Some(title) = metadata.title.first() {
            let segments: Vec<&str> = title.splitn(3, " / ").collect();
            match segments.as_slice() {
                ["Various Artists"] => {}
                ["Various Artists", second, ..] => titles.push(second.to_string()),
                [first, ..] => titles.push(first.to_string()),
                [] => {}
            }
        }
        release.title = uniq(titles);

        // Date
        release.date = uniq(metadata.year.texts());

        // Artists: tracker primary credits, with the archive artist/creator
        // fields as the fallback chain.
        let primary: Vec<CreditedArtist> = group
            .music_info
            .get("artists")
            .map(|artists| {
                artists
                    .iter()
                    .filter_map(|artist| {
                        let name = artist.name.clone()?;
                        let id = artist.id?;
                        Some(CreditedArtist {
                            name,
                            subitem: Some(format!("artist_id-{}", id)),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut others = Vec::new();
        for (role, members) in group.music_info.iter() {
            if role == "artists" {
                continue;
            }
            for member in members {
                if let (Some(id), Some(name)) = (member.id, member.name.as_ref()) {
                    others.push(CreditedArtist {
                        name: name.clone(),
                        subitem: Some(format!("artist_id-{}", id)),
                    });
                }
            }
        }
        release.other_artist = uniq(others);

        release.artist = if !primary.is_empty() {
            primary
        } else {
            let names = metadata.artist.texts();
            let names = if names.is_empty() {
                metadata.creator.texts()
            } else {
                names
            };
            names
                .into_iter()
                .map(|name| CreditedArtist { name, subitem: None })
                .collect()
        };
        release.combined_artist =
            comma_list(release.artist.iter().map(|artist| artist.name.as_str()));

        // Label and catalog number, tracker first, remaster overrides from
        // the torrent correlated through the archive identifier.
        let mut label_candidates = Vec::new();
        let mut catno_candidates = Vec::new();
        if let Some(label) = non_empty(group.record_label.as_deref()) {
            label_candidates.push(label.to_string());
        }
        if let Some(torrent) = matching_torrent(sources) {
            if let Some(label) = non_empty(torrent.remaster_record_label.as_deref()) {
                label_candidates.push(label.to_string());
            }
            if let Some(catno) = non_empty(torrent.remaster_catalogue_number.as_deref()) {
                catno_candidates.push(catno.to_string());
            }
        }
        label_candidates.extend(metadata.publisher.texts());
        release.label = uniq(label_candidates)
            .into_iter()
            .map(|name| Label { name })
            .collect();

        if let Some(catno) = non_empty(group.catalogue_number.as_deref()) {
            catno_candidates.push(catno.to_string());
        }
        release.catalog_number = uniq(catno_candidates);

        // Tracks, ordered by (medium, number).
        let links = self.extract_linked(sources);
        let artists = artist_index(&links);
        let mut tracks: Vec<Track> = linkable_files(&sources.archive)
            .into_iter()
            .map(|file| extract_track(file, &artists))
            .collect();
        tracks.sort_by_cached_key(|track| {
            (
                SortKey::from_list(&track.medium),
                SortKey::from_list(&track.number),
            )
        });
        release.tracks = tracks;

        // URLs
        if let Some(url) = group.wiki_image.clone() {
            release.urls.push(Url {
                url,
                kind: "cover art".to_string(),
            });
        }

        release
    }

    fn automatic_item_matches(&self, sources: &MappedSources) -> ItemMatches {
        let identifiers = &sources.archive.meta.metadata.external_identifier;
        ItemMatches {
            release: prefixed_values(identifiers, RELEASE_ID_PREFIX),
            release_group: prefixed_values(identifiers, RELEASE_GROUP_ID_PREFIX),
        }
    }

    fn automatic_subitem_matches(&self, sources: &MappedSources) -> SubitemMatches {
        let mut matches = SubitemMatches::new();
        for file in linkable_files(&sources.archive) {
            let Some(sha1) = file.sha1.first() else {
                continue;
            };
            let Some(identifiers) = file.external_identifier.as_ref() else {
                continue;
            };
            matches.insert(
                format!("file-{}", sha1),
                RecordingMatches {
                    recording: prefixed_values(identifiers, RECORDING_ID_PREFIX),
                },
            );
        }
        matches
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sources(tracker: serde_json::Value, archive: serde_json::Value) -> MappedSources {
        MappedSources {
            tracker: TrackerPayload::from_value(tracker),
            archive: ArchivePayload::from_value(archive),
        }
    }

    fn full_sources() -> MappedSources {
        sources(
            json!({
                "response": {
                    "group": {
                        "name": "Selected Ambient Works &amp; More",
                        "recordLabel": "Apollo",
                        "catalogueNumber": "AMB 3922",
                        "wikiImage": "https://img.example/cover.jpg",
                        "musicInfo": {
                            "artists": [{"id": 101, "name": "Aphex Twin"}],
                            "remixedBy": [{"id": 202, "name": "µ-Ziq"}],
                            "composers": [{"id": 303, "name": "R. James"}]
                        }
                    },
                    "torrents": [
                        {"id": 41, "remasterRecordLabel": "", "remasterCatalogueNumber": ""},
                        {"id": 42, "remasterRecordLabel": "Apollo Reissues",
                         "remasterCatalogueNumber": "AMB 3922 CD"}
                    ]
                }
            }),
            json!({
                "meta": {"metadata": {
                    "title": {"text": "Aphex Twin / Selected Ambient Works"},
                    "album": {"text": "Selected Ambient Works & More"},
                    "year": {"text": "1992"},
                    "publisher": {"text": "Apollo Records"},
                    "identifier": {"text": "release_group_42"},
                    "external-identifier": [
                        {"text": "urn:mb_release_id:aaaa-bbbb"},
                        {"text": "urn:mb_releasegroup_id:cccc-dddd"}
                    ]
                }},
                "files": {"files": {"file": [
                    {
                        "_name": "02 - Pulsewidth.flac",
                        "_source": "original",
                        "format": {"text": "Flac"},
                        "sha1": {"text": "feed02"},
                        "title": {"text": "Pulsewidth"},
                        "artist": {"text": "Aphex Twin"},
                        "album": {"text": "Selected Ambient Works"},
                        "track": {"text": "2/13"},
                        "length": {"text": "227.93"},
                        "external-identifier": [
                            {"text": "urn:acoustid:abc123"},
                            {"text": "urn:acoustid:unknown"},
                            {"text": "urn:mb_recording_id:rec-2"}
                        ]
                    },
                    {
                        "_name": "01 - Xtal.flac",
                        "_source": "original",
                        "format": {"text": "Flac"},
                        "sha1": {"text": "feed01"},
                        "title": {"text": "Xtal"},
                        "artist": {"text": "Aphex Twin"},
                        "album": {"text": "Selected Ambient Works"},
                        "track": {"text": "1/13"},
                        "length": {"text": "294.2"}
                    },
                    {
                        "_name": "01 - Xtal.mp3",
                        "_source": "derivative",
                        "format": {"text": "VBR MP3"},
                        "sha1": {"text": "deadbe"},
                        "title": {"text": "Xtal"}
                    },
                    {
                        "_name": "folder.jpg",
                        "_source": "original",
                        "format": {"text": "JPEG"}
                    }
                ]}}
            }),
        )
    }

    #[test]
    fn test_map_is_idempotent() {
        let sources = full_sources();
        let mapper = SourceKind::TrackerArchive.mapper();
        assert_eq!(mapper.map(&sources), mapper.map(&sources));
        assert_eq!(
            mapper.extract_linked(&sources),
            mapper.extract_linked(&sources)
        );
    }

    #[test]
    fn test_title_candidates_in_priority_order() {
        let release = TrackerArchiveMapper.map(&full_sources());
        assert_eq!(
            release.title,
            vec![
                // Unescaped tracker name and archive album collapse to one.
                "Selected Ambient Works & More",
                "Aphex Twin"
            ]
        );
    }

    #[test]
    fn test_title_various_artists_convention() {
        let src = sources(
            json!({}),
            json!({"meta": {"metadata": {
                "title": {"text": "Various Artists / Greatest Hits"}
            }}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.title, vec!["Greatest Hits"]);

        // No alternate segment to use.
        let src = sources(
            json!({}),
            json!({"meta": {"metadata": {"title": {"text": "Various Artists"}}}}),
        );
        assert!(TrackerArchiveMapper.map(&src).title.is_empty());
    }

    #[test]
    fn test_date_from_archive_year() {
        let release = TrackerArchiveMapper.map(&full_sources());
        assert_eq!(release.date, vec!["1992"]);
    }

    #[test]
    fn test_primary_artist_from_tracker() {
        let release = TrackerArchiveMapper.map(&full_sources());
        assert_eq!(release.artist.len(), 1);
        assert_eq!(release.artist[0].name, "Aphex Twin");
        assert_eq!(release.artist[0].subitem.as_deref(), Some("artist_id-101"));
        assert_eq!(release.combined_artist, "Aphex Twin");
        // Supporting roles land in other_artist.
        assert_eq!(release.other_artist.len(), 2);
    }

    #[test]
    fn test_artist_fallback_chain() {
        // No tracker artists: archive artist field wins.
        let src = sources(
            json!({}),
            json!({"meta": {"metadata": {"artist": {"text": "Tape Artist"}}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.artist[0].name, "Tape Artist");
        assert_eq!(release.artist[0].subitem, None);
        assert_eq!(release.combined_artist, "Tape Artist");

        // No artist field: creator.
        let src = sources(
            json!({}),
            json!({"meta": {"metadata": {"creator": ["C One", "C Two"]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.combined_artist, "C One, C Two");

        // Nothing anywhere.
        let release = TrackerArchiveMapper.map(&sources(json!({}), json!({})));
        assert!(release.artist.is_empty());
        assert_eq!(release.combined_artist, "");
    }

    #[test]
    fn test_label_and_catalog_precedence() {
        let release = TrackerArchiveMapper.map(&full_sources());
        let labels: Vec<&str> = release.label.iter().map(|l| l.name.as_str()).collect();
        // Group label, then the correlated torrent's remaster label, then the
        // archive publisher.
        assert_eq!(labels, vec!["Apollo", "Apollo Reissues", "Apollo Records"]);
        // Remaster catalogue number precedes the group's.
        assert_eq!(release.catalog_number, vec!["AMB 3922 CD", "AMB 3922"]);
    }

    #[test]
    fn test_torrent_correlation_ignores_blank_remaster_fields() {
        let src = sources(
            json!({"response": {
                "group": {"recordLabel": "Base"},
                "torrents": [{"id": 7, "remasterRecordLabel": "",
                              "remasterCatalogueNumber": ""}]
            }}),
            json!({"meta": {"metadata": {"identifier": {"text": "x_7"}}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        let labels: Vec<&str> = release.label.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(labels, vec!["Base"]);
        assert!(release.catalog_number.is_empty());
    }

    #[test]
    fn test_linkable_file_whitelist() {
        let links = TrackerArchiveMapper.extract_linked(&full_sources());
        // Derivative VBR MP3 and checksum-less JPEG are excluded.
        let sha1s: Vec<&str> = links.file.iter().map(|f| f.sha1.as_str()).collect();
        assert_eq!(sha1s, vec!["feed02", "feed01"]);
    }

    #[test]
    fn test_missing_checksum_excluded_regardless_of_format() {
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [{
                "_name": "a.flac", "_source": "original",
                "format": {"text": "Flac"}
            }]}}}),
        );
        assert!(TrackerArchiveMapper.extract_linked(&src).file.is_empty());
        assert!(TrackerArchiveMapper.map(&src).tracks.is_empty());
    }

    #[test]
    fn test_non_vbr_mp3_excluded() {
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [{
                "_name": "a.mp3", "_source": "original",
                "format": {"text": "MP3"}, "sha1": {"text": "aa"}
            }]}}}),
        );
        assert!(TrackerArchiveMapper.extract_linked(&src).file.is_empty());
    }

    #[test]
    fn test_linked_artists_role_remap_and_dedup() {
        let src = sources(
            json!({"response": {"group": {"musicInfo": {
                "artists": [{"id": 1, "name": "A"}, {"id": 1, "name": "A"}],
                "remixedBy": [{"id": 2, "name": "B"}],
                "conductor": [{"id": 3, "name": "C"}]
            }}}}),
            json!({}),
        );
        let links = TrackerArchiveMapper.extract_linked(&src);
        assert_eq!(links.version, LINKS_VERSION);
        let kinds: Vec<(&str, &str)> = links
            .artist_id
            .iter()
            .map(|a| (a.name.as_str(), a.kind.as_str()))
            .collect();
        assert_eq!(kinds, vec![("A", "artist"), ("B", "remixer"), ("C", "conductor")]);
    }

    #[test]
    fn test_linked_file_fields() {
        let links = TrackerArchiveMapper.extract_linked(&full_sources());
        let file = &links.file[0];
        assert_eq!(file.sha1, "feed02");
        assert_eq!(file.format, "Flac");
        assert_eq!(file.filename, "02 - Pulsewidth.flac");
        assert_eq!(file.title.as_deref(), Some("Pulsewidth"));
        assert_eq!(file.artist.as_deref(), Some("Aphex Twin"));
        assert_eq!(file.length, Some(227_930));
        assert_eq!(file.number.as_deref(), Some("2/13"));
        assert_eq!(file.acoustid, vec!["abc123"]);
    }

    #[test]
    fn test_acoustid_excludes_unknown_and_foreign_namespaces() {
        let values: Values = serde_json::from_value(json!([
            {"text": "urn:acoustid:ABC"},
            {"text": "urn:acoustid:unknown"},
            {"text": "urn:mb_recording_id:XYZ"}
        ]))
        .unwrap();
        assert_eq!(acoustid_values(&values), vec!["ABC"]);
    }

    #[test]
    fn test_track_numbers_and_totals() {
        let release = TrackerArchiveMapper.map(&full_sources());
        assert_eq!(release.tracks.len(), 2);
        let first = &release.tracks[0];
        assert_eq!(first.subitem.as_deref(), Some("file-feed01"));
        assert_eq!(first.number, vec!["1"]);
        assert_eq!(first.totaltracks, vec!["13"]);
        assert_eq!(first.length, vec![294_200]);
        assert_eq!(first.length_formatted, vec!["4:54"]);
        // Cross-referenced against the linked artist list.
        assert_eq!(first.artist[0].subitem.as_deref(), Some("artist_id-101"));
    }

    #[test]
    fn test_track_number_verbatim_when_not_numeric() {
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [{
                "_name": "a.flac", "_source": "original",
                "format": {"text": "Flac"}, "sha1": {"text": "aa"},
                "track": {"text": "A1/B2"}
            }]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.tracks[0].number, vec!["A1"]);
        assert_eq!(release.tracks[0].totaltracks, vec!["B2"]);
    }

    #[test]
    fn test_medium_detection_from_filename() {
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [{
                "_name": "CD2 - Track01.flac", "_source": "original",
                "format": {"text": "Flac"}, "sha1": {"text": "aa"},
                "album": {"text": "Some Album"}
            }]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.tracks[0].medium, vec!["2"]);
    }

    #[test]
    fn test_medium_detection_dedups_filename_and_album() {
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [{
                "_name": "Disc 3/01.flac", "_source": "original",
                "format": {"text": "Flac"}, "sha1": {"text": "aa"},
                "album": {"text": "Anthology (disk 3)"}
            }]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.tracks[0].medium, vec!["3"]);
    }

    #[test]
    fn test_track_ordering_by_medium_then_number() {
        fn file(sha1: &str, name: &str, track: &str) -> serde_json::Value {
            json!({
                "_name": name, "_source": "original",
                "format": {"text": "Flac"}, "sha1": {"text": sha1},
                "track": {"text": track}
            })
        }
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [
                file("aa", "CD2 - 01.flac", "1"),
                file("bb", "CD1 - 02.flac", "2"),
                file("cc", "CD1 - 01.flac", "1")
            ]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        let order: Vec<(&[String], &[String])> = release
            .tracks
            .iter()
            .map(|t| (t.medium.as_slice(), t.number.as_slice()))
            .collect();
        assert_eq!(
            order,
            vec![
                (&["1".to_string()][..], &["1".to_string()][..]),
                (&["1".to_string()][..], &["2".to_string()][..]),
                (&["2".to_string()][..], &["1".to_string()][..]),
            ]
        );
    }

    #[test]
    fn test_track_missing_medium_and_number_sorts_first() {
        fn file(sha1: &str, name: &str, track: Option<&str>) -> serde_json::Value {
            match track {
                Some(track) => json!({
                    "_name": name, "_source": "original",
                    "format": {"text": "Flac"}, "sha1": {"text": sha1},
                    "track": {"text": track}
                }),
                None => json!({
                    "_name": name, "_source": "original",
                    "format": {"text": "Flac"}, "sha1": {"text": sha1}
                }),
            }
        }
        let src = sources(
            json!({}),
            json!({"files": {"files": {"file": [
                file("aa", "CD1 - 01.flac", Some("1")),
                file("bb", "intro.flac", None)
            ]}}}),
        );
        let release = TrackerArchiveMapper.map(&src);
        assert_eq!(release.tracks[0].subitem.as_deref(), Some("file-bb"));
    }

    #[test]
    fn test_cover_art_url() {
        let release = TrackerArchiveMapper.map(&full_sources());
        assert_eq!(release.urls.len(), 1);
        assert_eq!(release.urls[0].url, "https://img.example/cover.jpg");
        assert_eq!(release.urls[0].kind, "cover art");

        let bare = TrackerArchiveMapper.map(&sources(json!({}), json!({})));
        assert!(bare.urls.is_empty());
    }

    #[test]
    fn test_automatic_item_matches() {
        let matches = TrackerArchiveMapper.automatic_item_matches(&full_sources());
        assert_eq!(matches.release, vec!["aaaa-bbbb"]);
        assert_eq!(matches.release_group, vec!["cccc-dddd"]);
    }

    #[test]
    fn test_automatic_subitem_matches_only_for_files_with_identifiers() {
        let matches = TrackerArchiveMapper.automatic_subitem_matches(&full_sources());
        // feed01 has no external-identifier field and gets no entry.
        assert_eq!(matches.len(), 1);
        assert_eq!(matches["file-feed02"].recording, vec!["rec-2"]);
    }

    #[test]
    fn test_link_types() {
        let types = TrackerArchiveMapper.link_types();
        assert_eq!(types.artist_id.key, "tracker_artist_id");
        assert_eq!(types.file.key, "sha1");
        assert_eq!(types.version, LINK_TYPES_VERSION);
    }

    #[test]
    fn test_map_options_truth_table() {
        let everything = Track {
            medium: vec!["1".into()],
            totaltracks: vec!["50".into()],
            acoustid: vec!["a644724e".into()],
            ..Track::default()
        };
        let nothing = Track::default();
        let partial = Track {
            acoustid: everything.acoustid.clone(),
            ..Track::default()
        };

        let release = |tracks: Vec<Track>| Release {
            tracks,
            ..Release::empty()
        };

        assert_eq!(
            map_options(&release(vec![everything.clone(), nothing.clone()])),
            MapOptions { mediums: true, totaltracks: true, acoustid: true }
        );
        assert_eq!(
            map_options(&release(vec![partial.clone(), everything.clone()])),
            MapOptions { mediums: true, totaltracks: true, acoustid: true }
        );
        assert_eq!(
            map_options(&release(vec![nothing.clone(), nothing.clone()])),
            MapOptions { mediums: false, totaltracks: false, acoustid: false }
        );
        assert_eq!(
            map_options(&release(vec![partial, nothing])),
            MapOptions { mediums: false, totaltracks: false, acoustid: true }
        );
    }

    #[test]
    fn test_empty_sources_yield_empty_document() {
        let release = TrackerArchiveMapper.map(&MappedSources::default());
        assert_eq!(release, Release::empty());
    }
}
