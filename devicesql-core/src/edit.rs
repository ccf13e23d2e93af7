//! Playlist edit operations on flat entry lists
//!
//! Each operation returns a new list; touched playlists are re-indexed
//! densely from 0 in their new order. Positions are zero-based places in a
//! playlist's order, not raw entry indices.

use crate::error::{Error, Result};
use crate::model::PlaylistEntry;

/// Split `entries` into the ordered entries of `playlist_id` and the rest
fn take_playlist(entries: &[PlaylistEntry], playlist_id: u32) -> (Vec<PlaylistEntry>, Vec<PlaylistEntry>) {
    let (mut playlist, rest): (Vec<_>, Vec<_>) = entries
        .iter()
        .copied()
        .partition(|e| e.playlist_id == playlist_id);
    playlist.sort_by_key(|e| e.entry_index);
    (playlist, rest)
}

fn reindexed(mut playlist: Vec<PlaylistEntry>) -> Vec<PlaylistEntry> {
    for (index, entry) in playlist.iter_mut().enumerate() {
        entry.entry_index = index as u32;
    }
    playlist
}

fn check_position(playlist_id: u32, position: usize, len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::PlaylistNotFound(playlist_id));
    }
    if position >= len {
        return Err(Error::EntryOutOfRange {
            playlist_id,
            position,
            len,
        });
    }
    Ok(())
}

/// Move the entry at `from` to `to` within one playlist
pub fn move_entry(
    entries: &[PlaylistEntry],
    playlist_id: u32,
    from: usize,
    to: usize,
) -> Result<Vec<PlaylistEntry>> {
    let (mut playlist, mut rest) = take_playlist(entries, playlist_id);
    check_position(playlist_id, from, playlist.len())?;
    check_position(playlist_id, to, playlist.len())?;

    let entry = playlist.remove(from);
    playlist.insert(to, entry);
    rest.extend(reindexed(playlist));
    Ok(rest)
}

/// Remove the entry at `position`
pub fn remove_entry(
    entries: &[PlaylistEntry],
    playlist_id: u32,
    position: usize,
) -> Result<Vec<PlaylistEntry>> {
    let (mut playlist, mut rest) = take_playlist(entries, playlist_id);
    check_position(playlist_id, position, playlist.len())?;

    playlist.remove(position);
    rest.extend(reindexed(playlist));
    Ok(rest)
}

/// Add a track at the end of a playlist, creating it if it has no entries
pub fn append_track(entries: &[PlaylistEntry], playlist_id: u32, track_id: u32) -> Vec<PlaylistEntry> {
    let (mut playlist, mut rest) = take_playlist(entries, playlist_id);
    playlist.push(PlaylistEntry::new(playlist_id, track_id, 0));
    rest.extend(reindexed(playlist));
    rest
}

/// Move the entry at `position` of one playlist to the end of another
pub fn move_to_playlist(
    entries: &[PlaylistEntry],
    from_playlist: u32,
    position: usize,
    to_playlist: u32,
) -> Result<Vec<PlaylistEntry>> {
    let (mut playlist, rest) = take_playlist(entries, from_playlist);
    check_position(from_playlist, position, playlist.len())?;

    let moved = playlist.remove(position);
    let mut result = rest;
    result.extend(reindexed(playlist));
    Ok(append_track(&result, to_playlist, moved.track_id))
}
