//! Ordering and dedup utilities shared by the mapping engine.

use std::cmp::Ordering;

/// First-seen-order dedup by value equality.
///
/// Works on any comparable element, including whole records; candidate lists
/// are small so the quadratic scan beats hashing every struct.
pub fn uniq<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Join names for display: `", "` separated, empty list → empty string.
pub fn comma_list<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().collect::<Vec<_>>().join(", ")
}

/// Render a track length in milliseconds as `m:ss`, or `h:mm:ss` from one
/// hour up. Rounds to the nearest second.
pub fn format_track_length(ms: i64) -> String {
    let total_secs = (ms as f64 / 1000.0).round() as i64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Sort key for track ordering.
///
/// Numbers order numerically and always precede strings; strings order
/// lexicographically among themselves. A missing value is numeric zero. This
/// pins down the mixed-type comparison the track sorter needs instead of
/// leaving it to chance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    Num(i64),
    Text(String),
}

impl SortKey {
    /// Key from a candidate list: first entry wins, empty list is zero,
    /// non-numeric text sorts as itself.
    pub fn from_list(values: &[String]) -> SortKey {
        match values.first() {
            None => SortKey::Num(0),
            Some(value) => value
                .parse::<i64>()
                .map(SortKey::Num)
                .unwrap_or_else(|_| SortKey::Text(value.clone())),
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Num(a), SortKey::Num(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Num(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Num(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// TESTS
// ============================================================================
