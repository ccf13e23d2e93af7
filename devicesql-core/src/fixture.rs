//! Synthetic database images for tests
//!
//! Pages are laid out the way the reader expects:
//! - 40-byte header
//! - Presence bitmap, padded to an even length
//! - One u16 row offset per slot
//! - Row heap, each row 2-byte aligned

use std::io::Cursor;

use binrw::BinWrite;

use crate::header::{FileHeader, TablePointer, TableType, TABLE_DIRECTORY_OFFSET, TABLE_POINTER_SIZE};
use crate::model::PlaylistEntry;
use crate::page::{bitmap_len, PageHeader, PAGE_HEADER_SIZE};
use crate::row::{track_slot, StringTableLayout, TRACK_STRING_SLOTS};
use crate::string::encode_string;

/// Page size used by every fixture
pub(crate) const PAGE_SIZE: usize = 4096;

/// A single page being built
pub(crate) struct PageBuilder {
    page_type: TableType,
    rows: Vec<Vec<u8>>,
    cleared: Vec<usize>,
}

impl PageBuilder {
    pub(crate) fn new(page_type: TableType) -> Self {
        Self {
            page_type,
            rows: Vec::new(),
            cleared: Vec::new(),
        }
    }

    pub(crate) fn with_rows(page_type: TableType, rows: Vec<Vec<u8>>) -> Self {
        Self {
            page_type,
            rows,
            cleared: Vec::new(),
        }
    }

    /// Add a row, returning its slot
    pub(crate) fn add_row(&mut self, data: &[u8]) -> usize {
        self.rows.push(data.to_vec());
        self.rows.len() - 1
    }

    /// Keep the row bytes but mark the slot absent
    pub(crate) fn clear_presence(&mut self, slot: usize) {
        self.cleared.push(slot);
    }

    fn finalize(self, page_index: u32, next_page: u32) -> Vec<u8> {
        let mut data = vec![0u8; PAGE_SIZE];
        let row_count = self.rows.len();
        let offsets_start = PAGE_HEADER_SIZE + bitmap_len(row_count);
        let heap_start = offsets_start + row_count * 2;
        let mut heap_pos = heap_start;

        for (slot, row) in self.rows.iter().enumerate() {
            heap_pos += heap_pos & 1;
            assert!(heap_pos + row.len() <= PAGE_SIZE, "fixture page overflow");
            data[heap_pos..heap_pos + row.len()].copy_from_slice(row);

            let offset_pos = offsets_start + slot * 2;
            data[offset_pos..offset_pos + 2].copy_from_slice(&(heap_pos as u16).to_le_bytes());
            if !self.cleared.contains(&slot) {
                data[PAGE_HEADER_SIZE + slot / 8] |= 1 << (slot % 8);
            }
            heap_pos += row.len();
        }

        let header = PageHeader {
            page_index,
            page_type: self.page_type.tag(),
            next_page,
            small_row_count: row_count.min(u8::MAX as usize) as u8,
            free_size: (PAGE_SIZE - heap_pos) as u16,
            used_size: (heap_pos - heap_start) as u16,
            large_row_count: row_count as u16,
            first_row_offset: heap_start as u16,
            ..PageHeader::default()
        };
        header
            .write(&mut Cursor::new(&mut data[..PAGE_HEADER_SIZE]))
            .expect("page header fits");
        data
    }
}

/// Whole-file builder: header page plus every table's pages, in order
pub(crate) struct ImageBuilder {
    tables: Vec<(TableType, Vec<PageBuilder>)>,
}

impl ImageBuilder {
    pub(crate) fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub(crate) fn table(mut self, table: TableType, pages: Vec<PageBuilder>) -> Self {
        self.tables.push((table, pages));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut pages: Vec<Vec<u8>> = Vec::new();
        let mut pointers = Vec::new();
        let mut next_index = 1u32;

        for (table, table_pages) in self.tables {
            let count = table_pages.len() as u32;
            if count == 0 {
                pointers.push(TablePointer {
                    table_type: table.tag(),
                    ..TablePointer::default()
                });
                continue;
            }

            let first = next_index;
            let last = first + count - 1;
            for (i, page) in table_pages.into_iter().enumerate() {
                let index = first + i as u32;
                let next = if index == last { 0 } else { index + 1 };
                pages.push(page.finalize(index, next));
            }
            pointers.push(TablePointer {
                table_type: table.tag(),
                empty_candidate: 0,
                first_page: first,
                last_page: last,
            });
            next_index = last + 1;
        }

        let mut header_page = vec![0u8; PAGE_SIZE];
        let header = FileHeader {
            page_size: PAGE_SIZE as u32,
            num_tables: pointers.len() as u32,
            next_unused_page: next_index,
            sequence: 1,
            ..FileHeader::default()
        };
        header
            .write(&mut Cursor::new(&mut header_page[..TABLE_DIRECTORY_OFFSET]))
            .expect("file header fits");
        for (i, pointer) in pointers.iter().enumerate() {
            let offset = TABLE_DIRECTORY_OFFSET + i * TABLE_POINTER_SIZE;
            pointer
                .write(&mut Cursor::new(&mut header_page[offset..offset + TABLE_POINTER_SIZE]))
                .expect("table pointer fits");
        }

        let mut output = header_page;
        for page in pages {
            output.extend_from_slice(&page);
        }
        output
    }
}

/// Track fields written by [`track_row`]
#[derive(Debug, Clone, Default)]
pub(crate) struct TrackFixture {
    pub id: u32,
    pub title: String,
    pub artist_id: u32,
    pub album_id: u32,
    pub genre_id: u32,
    pub key_id: u32,
    pub tempo: u32,
    pub duration: u16,
    pub rating: u8,
    pub color_id: u8,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub file_size: u32,
    pub file_path: String,
    pub file_name: String,
    pub track_number: u32,
    pub disc_number: u16,
    pub year: u16,
    pub comment: String,
    pub date_added: String,
    pub artwork_id: u32,
}

fn put32(row: &mut [u8], at: usize, value: u32) {
    row[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put16(row: &mut [u8], at: usize, value: u16) {
    row[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn track_row(track: &TrackFixture, layout: StringTableLayout) -> Vec<u8> {
    let fixed_len = layout.row_len();
    let mut row = vec![0u8; fixed_len + (fixed_len & 1)];

    let subtype = match layout {
        StringTableLayout::Long => 0x24,
        StringTableLayout::Short => 0x20,
    };
    put16(&mut row, 0x00, subtype);
    put32(&mut row, 0x08, track.sample_rate);
    put32(&mut row, 0x10, track.file_size);
    put32(&mut row, 0x1C, track.artwork_id);
    put32(&mut row, 0x20, track.key_id);
    put32(&mut row, 0x30, track.bitrate);
    put32(&mut row, 0x34, track.track_number);
    put32(&mut row, 0x38, track.tempo);
    put32(&mut row, 0x3C, track.genre_id);
    put32(&mut row, 0x40, track.album_id);
    put32(&mut row, 0x44, track.artist_id);
    put32(&mut row, 0x48, track.id);
    put16(&mut row, 0x4C, track.disc_number);
    put16(&mut row, 0x50, track.year);
    put16(&mut row, 0x54, track.duration);
    row[0x58] = track.color_id;
    row[0x59] = track.rating;

    let mut strings: [&str; TRACK_STRING_SLOTS] = [""; TRACK_STRING_SLOTS];
    strings[track_slot::TITLE] = &track.title;
    strings[track_slot::FILE_NAME] = &track.file_name;
    strings[track_slot::FILE_PATH] = &track.file_path;
    strings[track_slot::COMMENT] = &track.comment;
    strings[track_slot::DATE_ADDED] = &track.date_added;

    for (slot, text) in strings.iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        let offset = row.len() as u16;
        put16(&mut row, layout.table_offset() + slot * 2, offset);
        row.extend_from_slice(&encode_string(text));
    }
    row
}

fn with_string(mut row: Vec<u8>, text: &str) -> Vec<u8> {
    row.extend_from_slice(&encode_string(text));
    row
}

/// Artist row with a near (u8) name offset
pub(crate) fn artist_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = vec![0u8; 0x0A];
    put16(&mut row, 0, 0x60);
    put32(&mut row, 4, id);
    row[8] = 0x03;
    row[9] = 0x0A;
    with_string(row, name)
}

/// Artist row with a far (u16) name offset
pub(crate) fn artist_row_far(id: u32, name: &str) -> Vec<u8> {
    let mut row = vec![0u8; 0x0C];
    put16(&mut row, 0, 0x64);
    put32(&mut row, 4, id);
    row[8] = 0x03;
    put16(&mut row, 0x0A, 0x0C);
    with_string(row, name)
}

pub(crate) fn album_row(id: u32, artist_id: u32, name: &str) -> Vec<u8> {
    let mut row = vec![0u8; 0x16];
    put16(&mut row, 0, 0x80);
    put32(&mut row, 0x08, artist_id);
    put32(&mut row, 0x0C, id);
    row[0x14] = 0x03;
    row[0x15] = 0x16;
    with_string(row, name)
}

pub(crate) fn genre_row(id: u32, name: &str) -> Vec<u8> {
    with_string(id.to_le_bytes().to_vec(), name)
}

pub(crate) fn key_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = id.to_le_bytes().to_vec();
    row.extend_from_slice(&id.to_le_bytes());
    with_string(row, name)
}

pub(crate) fn color_row(id: u16, name: &str) -> Vec<u8> {
    let mut row = vec![0u8; 8];
    put16(&mut row, 5, id);
    with_string(row, name)
}

pub(crate) fn artwork_row(id: u32, path: &str) -> Vec<u8> {
    with_string(id.to_le_bytes().to_vec(), path)
}

pub(crate) fn playlist_tree_row(
    id: u32,
    parent_id: u32,
    sort_order: u32,
    is_folder: bool,
    name: &str,
) -> Vec<u8> {
    let mut row = vec![0u8; 0x14];
    put32(&mut row, 0x00, parent_id);
    put32(&mut row, 0x08, sort_order);
    put32(&mut row, 0x0C, id);
    put32(&mut row, 0x10, is_folder as u32);
    with_string(row, name)
}

pub(crate) fn entry_row(entry: PlaylistEntry) -> Vec<u8> {
    let mut row = vec![0u8; 12];
    put32(&mut row, 0, entry.entry_index);
    put32(&mut row, 4, entry.track_id);
    put32(&mut row, 8, entry.playlist_id);
    row
}

/// Playlist entries stored in [`sample_image`]
pub(crate) fn sample_entries() -> Vec<PlaylistEntry> {
    vec![
        // Friday
        PlaylistEntry::new(2, 10, 0),
        PlaylistEntry::new(2, 20, 1),
        PlaylistEntry::new(2, 30, 2),
        // Saturday, with track 10 twice
        PlaylistEntry::new(3, 10, 0),
        PlaylistEntry::new(3, 40, 1),
        PlaylistEntry::new(3, 30, 2),
        PlaylistEntry::new(3, 20, 3),
        PlaylistEntry::new(3, 10, 4),
        // Top
        PlaylistEntry::new(4, 40, 0),
    ]
}

fn sample_track(
    id: u32,
    title: &str,
    artist_id: u32,
    album_id: u32,
    genre_id: u32,
    key_id: u32,
) -> TrackFixture {
    TrackFixture {
        id,
        title: title.into(),
        artist_id,
        album_id,
        genre_id,
        key_id,
        tempo: 12000 + id,
        duration: 300,
        rating: 3,
        bitrate: 320,
        sample_rate: 44100,
        file_path: format!("/Contents/{}.mp3", title),
        file_name: format!("{}.mp3", title),
        ..TrackFixture::default()
    }
}

/// A small but complete database: every table present, two entry pages
pub(crate) fn sample_image() -> Vec<u8> {
    let entries = sample_entries();
    let (first_entries, rest_entries) = entries.split_at(5);

    let tracks = vec![
        track_row(&sample_track(10, "One More Time", 1, 1, 1, 1), StringTableLayout::Long),
        track_row(&sample_track(20, "Genesis", 2, 2, 2, 2), StringTableLayout::Short),
        track_row(&sample_track(30, "Digital Love", 1, 1, 99, 0), StringTableLayout::Long),
        track_row(&sample_track(40, "DANCE", 2, 2, 2, 2), StringTableLayout::Long),
    ];

    ImageBuilder::new()
        .table(
            TableType::PlaylistEntries,
            vec![
                PageBuilder::with_rows(
                    TableType::PlaylistEntries,
                    first_entries.iter().map(|e| entry_row(*e)).collect(),
                ),
                PageBuilder::with_rows(
                    TableType::PlaylistEntries,
                    rest_entries.iter().map(|e| entry_row(*e)).collect(),
                ),
            ],
        )
        .table(
            TableType::Artists,
            vec![PageBuilder::with_rows(
                TableType::Artists,
                vec![artist_row(1, "Daft Punk"), artist_row_far(2, "Justice")],
            )],
        )
        .table(
            TableType::Albums,
            vec![PageBuilder::with_rows(
                TableType::Albums,
                vec![album_row(1, 1, "Discovery"), album_row(2, 2, "Cross")],
            )],
        )
        .table(
            TableType::Genres,
            vec![PageBuilder::with_rows(
                TableType::Genres,
                vec![genre_row(1, "House"), genre_row(2, "Electro")],
            )],
        )
        .table(
            TableType::Keys,
            vec![PageBuilder::with_rows(
                TableType::Keys,
                vec![key_row(1, "8A"), key_row(2, "5B")],
            )],
        )
        .table(
            TableType::Colors,
            vec![PageBuilder::with_rows(
                TableType::Colors,
                vec![color_row(1, "Pink"), color_row(2, "Red")],
            )],
        )
        .table(
            TableType::Artwork,
            vec![PageBuilder::with_rows(
                TableType::Artwork,
                vec![artwork_row(1, "/PIONEER/Artwork/00001/a1.jpg")],
            )],
        )
        .table(
            TableType::Tracks,
            vec![PageBuilder::with_rows(TableType::Tracks, tracks)],
        )
        .table(
            TableType::PlaylistTree,
            vec![PageBuilder::with_rows(
                TableType::PlaylistTree,
                vec![
                    playlist_tree_row(1, 0, 0, true, "Sets"),
                    playlist_tree_row(2, 1, 0, false, "Friday"),
                    playlist_tree_row(3, 1, 1, false, "Saturday"),
                    playlist_tree_row(4, 0, 1, false, "Top"),
                ],
            )],
        )
        .build()
}
