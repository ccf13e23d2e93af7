//! Entity records decoded from an export database
//!
//! Every numeric field defaults to 0 and every string field to empty when the
//! underlying bytes are missing or unreadable.

use serde::{Deserialize, Serialize};

/// One track, with its dimension ids resolved to display names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u32,
    pub title: String,
    /// Artist name, empty if `artist_id` is 0 or unknown
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub key: String,
    pub artist_id: u32,
    pub album_id: u32,
    pub genre_id: u32,
    pub key_id: u32,
    /// BPM × 100
    pub tempo: u32,
    /// Duration in seconds
    pub duration: u32,
    /// 0-5
    pub rating: u8,
    pub color_id: u32,
    /// Bitrate in kbps
    pub bitrate: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// File size in bytes
    pub file_size: u32,
    /// Path of the audio file on the volume
    pub file_path: String,
    pub file_name: String,
    pub track_number: u32,
    pub disc_number: u32,
    pub year: u32,
    pub comment: String,
    pub date_added: String,
    pub artwork_id: u32,
}

impl Track {
    pub fn bpm(&self) -> f64 {
        self.tempo as f64 / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: u32,
    pub artist_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Musical key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub id: u32,
    pub name: String,
}

/// Track color label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: u32,
    /// Image path on the volume
    pub path: String,
}

/// Folder or playlist in the playlist tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTreeNode {
    pub id: u32,
    /// 0 for top-level nodes
    pub parent_id: u32,
    pub name: String,
    pub is_folder: bool,
    pub sort_order: u32,
}

/// Membership of one track at one position in one playlist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub playlist_id: u32,
    pub track_id: u32,
    /// Zero-based position within the playlist
    pub entry_index: u32,
}

impl PlaylistEntry {
    pub fn new(playlist_id: u32, track_id: u32, entry_index: u32) -> Self {
        Self {
            playlist_id,
            track_id,
            entry_index,
        }
    }
}
