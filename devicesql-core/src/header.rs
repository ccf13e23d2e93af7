//! File header and table directory
//!
//! Page 0 of an export database starts with a fixed header followed by one
//! 16-byte pointer per table:
//! - Bytes 4-7: page_size
//! - Bytes 8-11: num_tables
//! - Bytes 12-15: next_unused_page
//! - Bytes 20-23: sequence
//! - Bytes 28+: table pointers (type, unused, first_page, last_page)

use std::collections::BTreeMap;
use std::io::Cursor;

use binrw::{binrw, BinRead};
use serde::Serialize;
use tracing::warn;

/// Offset of the first table pointer in the header page
pub const TABLE_DIRECTORY_OFFSET: usize = 28;

/// Size of one table pointer
pub const TABLE_POINTER_SIZE: usize = 16;

/// Table types in DeviceSQL
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TableType {
    Tracks = 0,
    Genres = 1,
    Artists = 2,
    Albums = 3,
    Labels = 4,
    Keys = 5,
    Colors = 6,
    PlaylistTree = 7,
    PlaylistEntries = 8,
    Artwork = 13,
    Columns = 16,
    HistoryPlaylists = 17,
    HistoryEntries = 18,
    History = 19,
}

impl TableType {
    pub fn from_tag(tag: u32) -> Option<Self> {
        let table = match tag {
            0 => TableType::Tracks,
            1 => TableType::Genres,
            2 => TableType::Artists,
            3 => TableType::Albums,
            4 => TableType::Labels,
            5 => TableType::Keys,
            6 => TableType::Colors,
            7 => TableType::PlaylistTree,
            8 => TableType::PlaylistEntries,
            13 => TableType::Artwork,
            16 => TableType::Columns,
            17 => TableType::HistoryPlaylists,
            18 => TableType::HistoryEntries,
            19 => TableType::History,
            _ => return None,
        };
        Some(table)
    }

    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            TableType::Tracks => "tracks",
            TableType::Genres => "genres",
            TableType::Artists => "artists",
            TableType::Albums => "albums",
            TableType::Labels => "labels",
            TableType::Keys => "keys",
            TableType::Colors => "colors",
            TableType::PlaylistTree => "playlist_tree",
            TableType::PlaylistEntries => "playlist_entries",
            TableType::Artwork => "artwork",
            TableType::Columns => "columns",
            TableType::HistoryPlaylists => "history_playlists",
            TableType::HistoryEntries => "history_entries",
            TableType::History => "history",
        }
    }
}

/// Fixed prefix of the header page
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHeader {
    /// Always 0
    pub unknown1: u32,
    /// Page size in bytes
    pub page_size: u32,
    /// Number of table pointers that follow
    pub num_tables: u32,
    /// Next unused page
    pub next_unused_page: u32,
    /// Unknown (observed as 0)
    pub unknown2: u32,
    /// Sequence counter
    pub sequence: u32,
    /// Gap before the table pointers
    pub gap: u32,
}

/// Pointer to a table's pages
#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, Copy)]
pub struct TablePointer {
    /// Table type ID
    pub table_type: u32,
    /// Unused slot
    pub empty_candidate: u32,
    /// First page index
    pub first_page: u32,
    /// Last page index
    pub last_page: u32,
}

impl TablePointer {
    fn is_absent(&self) -> bool {
        self.first_page == 0 && self.last_page == 0
    }
}

/// First and last page of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableExtent {
    pub first_page: u32,
    pub last_page: u32,
}

/// Table type tag → page extent, for every table present in the file
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableDirectory {
    pub page_size: u32,
    pub tables: BTreeMap<u32, TableExtent>,
}

impl TableDirectory {
    /// Parse the header page. A header that cannot be read yields an empty
    /// directory.
    pub fn parse(data: &[u8]) -> Self {
        let header = match FileHeader::read(&mut Cursor::new(data)) {
            Ok(header) => header,
            Err(e) => {
                warn!("Unreadable file header ({} bytes): {}", data.len(), e);
                return Self::default();
            }
        };

        let mut directory = Self {
            page_size: header.page_size,
            tables: BTreeMap::new(),
        };

        // Pointers must stay inside the header page as well as the buffer
        let limit = match header.page_size as usize {
            0 => data.len(),
            page_size => page_size.min(data.len()),
        };

        for i in 0..header.num_tables as usize {
            let ptr_offset = TABLE_DIRECTORY_OFFSET + i * TABLE_POINTER_SIZE;
            if ptr_offset + TABLE_POINTER_SIZE > limit {
                warn!(
                    "Table pointer {} of {} at offset {} lies beyond the header page",
                    i, header.num_tables, ptr_offset
                );
                break;
            }

            let bytes = &data[ptr_offset..ptr_offset + TABLE_POINTER_SIZE];
            let pointer = match TablePointer::read(&mut Cursor::new(bytes)) {
                Ok(pointer) => pointer,
                Err(e) => {
                    warn!("Unreadable table pointer {}: {}", i, e);
                    break;
                }
            };

            if pointer.is_absent() {
                continue;
            }

            directory
                .tables
                .entry(pointer.table_type)
                .or_insert(TableExtent {
                    first_page: pointer.first_page,
                    last_page: pointer.last_page,
                });
        }

        directory
    }

    pub fn get(&self, table: TableType) -> Option<TableExtent> {
        self.tables.get(&table.tag()).copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
