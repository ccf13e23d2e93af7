//! Database assembly
//!
//! Dimension tables are decoded first, then tracks (whose ids are resolved
//! to names against the dimension maps), then the playlist tree and its
//! entries. A table that is missing or unreadable becomes an empty
//! collection; a row that fails to decode is skipped.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReadOptions;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::header::TableDirectory;
use crate::model::{
    Album, Artist, Artwork, Color, Genre, Key, PlaylistEntry, PlaylistTreeNode, Track,
};
use crate::page::walk_table;
use crate::row::Row;

/// Everything decoded from one export database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub tracks: HashMap<u32, Track>,
    pub artists: HashMap<u32, Artist>,
    pub albums: HashMap<u32, Album>,
    pub genres: HashMap<u32, Genre>,
    pub keys: HashMap<u32, Key>,
    pub colors: HashMap<u32, Color>,
    pub artwork: HashMap<u32, Artwork>,
    pub playlists: HashMap<u32, PlaylistTreeNode>,
    /// Unordered playlist membership
    pub playlist_entries: Vec<PlaylistEntry>,
}

/// Parse a database image with default limits. Never fails; a hopeless
/// input yields an empty database.
pub fn parse(data: &[u8]) -> Database {
    parse_with(data, &ReadOptions::default())
}

pub fn parse_with(data: &[u8], options: &ReadOptions) -> Database {
    Database::parse_with(data, options)
}

/// Read and parse a database file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Database> {
    let data = std::fs::read(path.as_ref())?;
    Ok(parse(&data))
}

/// Decode every live row of `T`'s table, skipping rows that fail
fn decode_rows<T: Row>(data: &[u8], directory: &TableDirectory, options: &ReadOptions) -> Vec<T> {
    let mut cursor = ByteCursor::new(data);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for location in walk_table(data, directory, T::TABLE, options) {
        match T::decode(&mut cursor, location.row_offset) {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                warn!("Skipping {} row: {}", T::TABLE.name(), e);
            }
        }
    }

    debug!(
        "Decoded {} {} rows ({} skipped)",
        rows.len(),
        T::TABLE.name(),
        skipped
    );
    rows
}

fn keyed<T>(rows: Vec<T>, id: impl Fn(&T) -> u32) -> HashMap<u32, T> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        map.entry(id(&row)).or_insert(row);
    }
    map
}

/// Name for `id` in a dimension map, empty when 0 or unknown
fn resolve<T>(map: &HashMap<u32, T>, id: u32, name: impl Fn(&T) -> &str) -> String {
    if id == 0 {
        return String::new();
    }
    map.get(&id).map(|row| name(row).to_string()).unwrap_or_default()
}

impl Database {
    pub fn parse(data: &[u8]) -> Self {
        parse(data)
    }

    pub fn parse_with(data: &[u8], options: &ReadOptions) -> Self {
        let directory = TableDirectory::parse(data);
        if directory.is_empty() {
            warn!("No tables found in {} byte image", data.len());
            return Self::default();
        }

        let artists = keyed(decode_rows::<Artist>(data, &directory, options), |a| a.id);
        let albums = keyed(decode_rows::<Album>(data, &directory, options), |a| a.id);
        let genres = keyed(decode_rows::<Genre>(data, &directory, options), |g| g.id);
        let keys = keyed(decode_rows::<Key>(data, &directory, options), |k| k.id);
        let colors = keyed(decode_rows::<Color>(data, &directory, options), |c| c.id);
        let artwork = keyed(decode_rows::<Artwork>(data, &directory, options), |a| a.id);

        let tracks = decode_rows::<Track>(data, &directory, options)
            .into_iter()
            .map(|mut track| {
                track.artist = resolve(&artists, track.artist_id, |a| a.name.as_str());
                track.album = resolve(&albums, track.album_id, |a| a.name.as_str());
                track.genre = resolve(&genres, track.genre_id, |g| g.name.as_str());
                track.key = resolve(&keys, track.key_id, |k| k.name.as_str());
                track
            })
            .collect();
        let tracks = keyed(tracks, |t| t.id);

        let playlists = keyed(
            decode_rows::<PlaylistTreeNode>(data, &directory, options),
            |p| p.id,
        );
        let playlist_entries = decode_rows::<PlaylistEntry>(data, &directory, options);

        info!(
            "Parsed database: {} tracks, {} artists, {} albums, {} playlists, {} entries",
            tracks.len(),
            artists.len(),
            albums.len(),
            playlists.len(),
            playlist_entries.len()
        );

        Self {
            tracks,
            artists,
            albums,
            genres,
            keys,
            colors,
            artwork,
            playlists,
            playlist_entries,
        }
    }

    /// Entries of one playlist, ordered by entry index
    pub fn entries_for(&self, playlist_id: u32) -> Vec<PlaylistEntry> {
        let mut entries: Vec<PlaylistEntry> = self
            .playlist_entries
            .iter()
            .filter(|e| e.playlist_id == playlist_id)
            .copied()
            .collect();
        entries.sort_by_key(|e| e.entry_index);
        entries
    }

    /// Tracks of one playlist in playback order. Entries pointing at unknown
    /// tracks are left out.
    pub fn playlist_tracks(&self, playlist_id: u32) -> Vec<&Track> {
        self.entries_for(playlist_id)
            .iter()
            .filter_map(|e| self.tracks.get(&e.track_id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
            && self.artists.is_empty()
            && self.albums.is_empty()
            && self.genres.is_empty()
            && self.keys.is_empty()
            && self.colors.is_empty()
            && self.artwork.is_empty()
            && self.playlists.is_empty()
            && self.playlist_entries.is_empty()
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
