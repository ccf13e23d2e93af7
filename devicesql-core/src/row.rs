//! Row decoders, one per table
//!
//! Each decoder reads fixed-offset integer fields from the row start, then
//! resolves the strings the model needs. String offsets are relative to the
//! row start. A decoder fails only when its fixed prefix does not fit in the
//! buffer or the row carries no id; the caller skips that row.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::header::TableType;
use crate::model::{
    Album, Artist, Artwork, Color, Genre, Key, PlaylistEntry, PlaylistTreeNode, Track,
};

/// A record decodable from one table row
pub trait Row: Sized {
    const TABLE: TableType;

    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self>;
}

fn require(cur: &ByteCursor<'_>, row: usize, len: usize, what: &str) -> Result<()> {
    if cur.fits(row, len) {
        Ok(())
    } else {
        Err(Error::malformed(row, format!("{} row needs {} bytes", what, len)))
    }
}

fn require_id(id: u32, row: usize, what: &str) -> Result<u32> {
    if id == 0 {
        Err(Error::malformed(row, format!("{} row has id 0", what)))
    } else {
        Ok(id)
    }
}

/// Subtype bit selecting 16-bit ("far") string offsets
const SUBTYPE_FAR_OFFSETS: u16 = 0x04;

/// Read a name referenced by a near (u8) offset, or by a far (u16) offset
/// when the subtype asks for one
fn near_or_far_name(
    cur: &mut ByteCursor<'_>,
    row: usize,
    subtype: u16,
    near_at: usize,
    far_at: usize,
) -> String {
    let offset = if subtype & SUBTYPE_FAR_OFFSETS != 0 {
        cur.u16_at(row + far_at) as usize
    } else {
        cur.u8_at(row + near_at) as usize
    };
    cur.read_devicesql_string(row, offset)
}

// Track row field offsets
const TRACK_SUBTYPE: usize = 0x00;
const TRACK_SAMPLE_RATE: usize = 0x08;
const TRACK_FILE_SIZE: usize = 0x10;
const TRACK_ARTWORK_ID: usize = 0x1C;
const TRACK_KEY_ID: usize = 0x20;
const TRACK_BITRATE: usize = 0x30;
const TRACK_NUMBER: usize = 0x34;
const TRACK_TEMPO: usize = 0x38;
const TRACK_GENRE_ID: usize = 0x3C;
const TRACK_ALBUM_ID: usize = 0x40;
const TRACK_ARTIST_ID: usize = 0x44;
const TRACK_ID: usize = 0x48;
const TRACK_DISC_NUMBER: usize = 0x4C;
const TRACK_YEAR: usize = 0x50;
const TRACK_DURATION: usize = 0x54;
const TRACK_COLOR_ID: usize = 0x58;
const TRACK_RATING: usize = 0x59;

/// Number of string offsets in a track row
pub const TRACK_STRING_SLOTS: usize = 21;

/// Track string slots resolved into the model
pub mod track_slot {
    pub const DATE_ADDED: usize = 10;
    pub const COMMENT: usize = 16;
    pub const TITLE: usize = 17;
    pub const FILE_NAME: usize = 19;
    pub const FILE_PATH: usize = 20;
}

/// Where a track row keeps its string offset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTableLayout {
    /// A near-offset byte precedes the table
    Short,
    /// The table starts right after the fixed fields
    Long,
}

impl StringTableLayout {
    /// Bit 2 of the subtype selects the long layout
    pub fn from_subtype(subtype: u16) -> Self {
        if subtype & SUBTYPE_FAR_OFFSETS != 0 {
            StringTableLayout::Long
        } else {
            StringTableLayout::Short
        }
    }

    pub fn table_offset(self) -> usize {
        match self {
            StringTableLayout::Short => 0x5F,
            StringTableLayout::Long => 0x5E,
        }
    }

    /// Bytes up to the end of the string offset table
    pub fn row_len(self) -> usize {
        self.table_offset() + TRACK_STRING_SLOTS * 2
    }

    /// Read every string offset of the row
    pub fn string_offsets(self, cur: &mut ByteCursor<'_>, row: usize) -> [u16; TRACK_STRING_SLOTS] {
        let mut offsets = [0u16; TRACK_STRING_SLOTS];
        cur.seek(row + self.table_offset());
        for slot in offsets.iter_mut() {
            *slot = cur.read_u16();
        }
        offsets
    }
}

impl Row for Track {
    const TABLE: TableType = TableType::Tracks;

    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, TRACK_SUBTYPE + 2, "track")?;
        let layout = StringTableLayout::from_subtype(cur.u16_at(row + TRACK_SUBTYPE));
        require(cur, row, layout.row_len(), "track")?;

        let id = require_id(cur.u32_at(row + TRACK_ID), row, "track")?;
        let strings = layout.string_offsets(cur, row);
        let mut string = |slot: usize| cur.read_devicesql_string(row, strings[slot] as usize);

        let title = string(track_slot::TITLE);
        let file_name = string(track_slot::FILE_NAME);
        let file_path = string(track_slot::FILE_PATH);
        let comment = string(track_slot::COMMENT);
        let date_added = string(track_slot::DATE_ADDED);

        Ok(Track {
            id,
            title,
            artist_id: cur.u32_at(row + TRACK_ARTIST_ID),
            album_id: cur.u32_at(row + TRACK_ALBUM_ID),
            genre_id: cur.u32_at(row + TRACK_GENRE_ID),
            key_id: cur.u32_at(row + TRACK_KEY_ID),
            tempo: cur.u32_at(row + TRACK_TEMPO),
            duration: cur.u16_at(row + TRACK_DURATION) as u32,
            rating: cur.u8_at(row + TRACK_RATING).min(5),
            color_id: cur.u8_at(row + TRACK_COLOR_ID) as u32,
            bitrate: cur.u32_at(row + TRACK_BITRATE),
            sample_rate: cur.u32_at(row + TRACK_SAMPLE_RATE),
            file_size: cur.u32_at(row + TRACK_FILE_SIZE),
            file_path,
            file_name,
            track_number: cur.u32_at(row + TRACK_NUMBER),
            disc_number: cur.u16_at(row + TRACK_DISC_NUMBER) as u32,
            year: cur.u16_at(row + TRACK_YEAR) as u32,
            comment,
            date_added,
            artwork_id: cur.u32_at(row + TRACK_ARTWORK_ID),
            ..Track::default()
        })
    }
}

impl Row for Artist {
    const TABLE: TableType = TableType::Artists;

    /// subtype u16, index_shift u16, id u32, 0x03, near name offset u8,
    /// far name offset u16
    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 0x0A, "artist")?;
        let subtype = cur.u16_at(row);
        let id = require_id(cur.u32_at(row + 0x04), row, "artist")?;
        let name = near_or_far_name(cur, row, subtype, 0x09, 0x0A);
        Ok(Artist { id, name })
    }
}

impl Row for Album {
    const TABLE: TableType = TableType::Albums;

    /// subtype u16, index_shift u16, unknown u32, artist_id u32, id u32,
    /// unknown u32, 0x03, near name offset u8, far name offset u16
    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 0x16, "album")?;
        let subtype = cur.u16_at(row);
        let artist_id = cur.u32_at(row + 0x08);
        let id = require_id(cur.u32_at(row + 0x0C), row, "album")?;
        let name = near_or_far_name(cur, row, subtype, 0x15, 0x16);
        Ok(Album { id, artist_id, name })
    }
}

impl Row for Genre {
    const TABLE: TableType = TableType::Genres;

    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 5, "genre")?;
        let id = require_id(cur.u32_at(row), row, "genre")?;
        let name = cur.read_devicesql_string(row, 4);
        Ok(Genre { id, name })
    }
}

impl Row for Key {
    const TABLE: TableType = TableType::Keys;

    /// id u32, id2 u32, inline name
    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 9, "key")?;
        let id = require_id(cur.u32_at(row), row, "key")?;
        let name = cur.read_devicesql_string(row, 8);
        Ok(Key { id, name })
    }
}

impl Row for Color {
    const TABLE: TableType = TableType::Colors;

    /// 5 unknown bytes, id u16, unknown u8, inline name
    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 9, "color")?;
        let id = require_id(cur.u16_at(row + 5) as u32, row, "color")?;
        let name = cur.read_devicesql_string(row, 8);
        Ok(Color { id, name })
    }
}

impl Row for Artwork {
    const TABLE: TableType = TableType::Artwork;

    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 5, "artwork")?;
        let id = require_id(cur.u32_at(row), row, "artwork")?;
        let path = cur.read_devicesql_string(row, 4);
        Ok(Artwork { id, path })
    }
}

impl Row for PlaylistTreeNode {
    const TABLE: TableType = TableType::PlaylistTree;

    /// parent_id u32, unknown u32, sort_order u32, id u32, folder flag u32,
    /// inline name
    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, 0x15, "playlist tree")?;
        let parent_id = cur.u32_at(row);
        let sort_order = cur.u32_at(row + 0x08);
        let id = require_id(cur.u32_at(row + 0x0C), row, "playlist tree")?;
        let is_folder = cur.u32_at(row + 0x10) != 0;
        let name = cur.read_devicesql_string(row, 0x14);
        Ok(PlaylistTreeNode {
            id,
            parent_id,
            name,
            is_folder,
            sort_order,
        })
    }
}

/// Size of a playlist entry row: entry_index, track_id, playlist_id
pub const PLAYLIST_ENTRY_SIZE: usize = 12;

impl Row for PlaylistEntry {
    const TABLE: TableType = TableType::PlaylistEntries;

    fn decode(cur: &mut ByteCursor<'_>, row: usize) -> Result<Self> {
        require(cur, row, PLAYLIST_ENTRY_SIZE, "playlist entry")?;
        cur.seek(row);
        let entry_index = cur.read_u32();
        let track_id = cur.read_u32();
        let playlist_id = cur.read_u32();
        Ok(PlaylistEntry {
            playlist_id,
            track_id,
            entry_index,
        })
    }
}
