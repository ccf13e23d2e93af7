//! In-place playlist order rewriting
//!
//! Rows are never inserted, removed or moved. Existing playlist entry rows
//! are located by content (entry_index, track_id, playlist_id as three
//! consecutive u32 at a 2-byte aligned offset) and only their entry_index
//! field is overwritten. The output always has the input's length.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cursor::{peek_u32, put_u32};
use crate::model::PlaylistEntry;
use crate::row::PLAYLIST_ENTRY_SIZE;

/// DeviceSQL rows are 2-byte aligned
const ROW_ALIGNMENT: usize = 2;

/// Counters describing what a write did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    /// Ordinal fields rewritten
    pub modified: usize,
    /// Original entries whose row could not be located
    pub not_found: usize,
    /// Located rows left untouched because their playlist or instance is gone
    pub orphaned: usize,
    /// Edited entries with no existing row to carry them
    pub not_persisted: usize,
}

/// Result of [`apply_playlist_modifications`]
#[derive(Debug, Clone)]
pub struct PlaylistWrite {
    pub data: Vec<u8>,
    pub report: WriteReport,
}

type GroupKey = (u32, u32);

/// Entries grouped by (playlist_id, track_id), each group sorted by index
fn group_instances(entries: &[PlaylistEntry]) -> BTreeMap<GroupKey, Vec<PlaylistEntry>> {
    let mut groups: BTreeMap<GroupKey, Vec<PlaylistEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.playlist_id, entry.track_id))
            .or_default()
            .push(*entry);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|e| e.entry_index);
    }
    groups
}

/// One pass over the buffer, recording the first offset holding each
/// original entry. Stops once every entry has been found.
pub fn locate_entries(data: &[u8], entries: &[PlaylistEntry]) -> HashMap<PlaylistEntry, usize> {
    let mut pending: HashSet<PlaylistEntry> = entries.iter().copied().collect();
    let mut located = HashMap::with_capacity(pending.len());

    let mut pos = 0usize;
    while !pending.is_empty() && pos + PLAYLIST_ENTRY_SIZE <= data.len() {
        let candidate = PlaylistEntry {
            entry_index: peek_u32(data, pos),
            track_id: peek_u32(data, pos + 4),
            playlist_id: peek_u32(data, pos + 8),
        };
        if pending.remove(&candidate) {
            located.insert(candidate, pos);
        }
        pos += ROW_ALIGNMENT;
    }

    debug!(
        "Located {} of {} playlist entries (scanned {} bytes)",
        located.len(),
        located.len() + pending.len(),
        pos
    );
    located
}

/// Rewrite the ordinals of `original_entries` so the buffer reflects
/// `edited_entries`. The input buffer is not modified.
///
/// Instances of the same track within a playlist are matched by position:
/// the n-th original occurrence (by entry index) takes the ordinal of the
/// n-th edited occurrence. Occurrences without a counterpart, and entries of
/// playlists missing from the edited list, keep their bytes.
pub fn apply_playlist_modifications(
    original: &[u8],
    original_entries: &[PlaylistEntry],
    edited_entries: &[PlaylistEntry],
) -> PlaylistWrite {
    let mut data = original.to_vec();
    let mut report = WriteReport::default();

    let located = locate_entries(&data, original_entries);
    let original_groups = group_instances(original_entries);
    let edited_groups = group_instances(edited_entries);
    let edited_playlists: HashSet<u32> = edited_entries.iter().map(|e| e.playlist_id).collect();

    let unique_originals: HashSet<&PlaylistEntry> = original_entries.iter().collect();
    report.not_found = unique_originals
        .iter()
        .filter(|e| !located.contains_key(*e))
        .count();

    for (key, originals) in &original_groups {
        let edited = edited_groups.get(key).map(Vec::as_slice).unwrap_or(&[]);

        for (instance, entry) in originals.iter().enumerate() {
            let Some(&offset) = located.get(entry) else {
                continue;
            };

            if !edited_playlists.contains(&entry.playlist_id) {
                report.orphaned += 1;
                continue;
            }

            let Some(target) = edited.get(instance) else {
                report.orphaned += 1;
                continue;
            };

            if peek_u32(&data, offset) != target.entry_index
                && put_u32(&mut data, offset, target.entry_index)
            {
                report.modified += 1;
            }
        }
    }

    for (key, edited) in &edited_groups {
        let existing = original_groups.get(key).map(Vec::len).unwrap_or(0);
        report.not_persisted += edited.len().saturating_sub(existing);
    }

    if report.not_found > 0 {
        warn!(
            "{} playlist entries could not be located in the database",
            report.not_found
        );
    }
    if report.not_persisted > 0 {
        warn!(
            "{} new playlist entries have no existing row and were not written",
            report.not_persisted
        );
    }
    info!(
        "Playlist write: {} modified, {} not found, {} orphaned",
        report.modified, report.not_found, report.orphaned
    );

    PlaylistWrite { data, report }
}
