//! Page chain traversal for DeviceSQL tables
//!
//! Every table is a singly linked list of fixed-size pages. Each page has:
//! - A 40-byte header (type at +8, next_page at +12, row counts at +20/+30)
//! - A row presence bitmap right after the header, padded to an even length
//! - One u16 row offset (relative to page start) per row slot
//!
//! The walker yields the absolute offset of every row marked present.

use std::collections::HashSet;
use std::io::Cursor;

use binrw::{binrw, BinRead};
use tracing::{debug, warn};

use crate::config::ReadOptions;
use crate::cursor::ByteCursor;
use crate::header::{TableDirectory, TableType};

/// Size of the page header
pub const PAGE_HEADER_SIZE: usize = 40;

/// Data page header
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PageHeader {
    /// Always 0
    pub unknown1: u32,
    /// Page index (0-based)
    pub page_index: u32,
    /// Table type tag
    pub page_type: u32,
    /// Next page index (0 if none)
    pub next_page: u32,
    /// Unknown
    pub unknown2: u32,
    /// 8-bit row count
    pub small_row_count: u8,
    /// Unknown
    pub unknown3: [u8; 3],
    /// Free heap space
    pub free_size: u16,
    /// Used heap space
    pub used_size: u16,
    /// Unknown
    pub unknown4: u16,
    /// 16-bit row count
    pub large_row_count: u16,
    /// Unknown
    pub unknown5: u32,
    /// Offset of the first row
    pub first_row_offset: u16,
    /// Unknown
    pub unknown6: u16,
}

impl PageHeader {
    /// The larger of the two row counts
    pub fn row_count(&self) -> usize {
        (self.small_row_count as usize).max(self.large_row_count as usize)
    }
}

/// Where a live row sits in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocation {
    /// Absolute offset of the row
    pub row_offset: usize,
    /// Absolute offset of the page holding it
    pub page_offset: usize,
}

/// Bitmap bytes for `row_count` slots, padded to an even count
pub fn bitmap_len(row_count: usize) -> usize {
    let bytes = row_count.div_ceil(8);
    bytes + (bytes & 1)
}

/// Row slots of the page currently being read
#[derive(Debug)]
struct PageRows {
    page_start: usize,
    row_count: usize,
    offsets_start: usize,
    slot: usize,
}

/// Why a page chain ended before reaching its sentinel or last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStop {
    /// The chain links back to a page already walked
    Revisit(u32),
    /// More pages than `max_pages_per_table`
    PageCap(usize),
    /// The next page lies outside the buffer
    BeyondFile(u32),
}

/// Lazy, one-shot iterator over the live rows of one table
pub struct PageWalker<'a> {
    cursor: ByteCursor<'a>,
    table: u32,
    page_size: usize,
    last_page: u32,
    next_page: Option<u32>,
    visited: HashSet<u32>,
    options: ReadOptions,
    current: Option<PageRows>,
    stop: Option<ChainStop>,
}

impl<'a> PageWalker<'a> {
    /// Walk the table with the given type tag. Tables missing from the
    /// directory produce an empty walk.
    pub fn new(
        data: &'a [u8],
        directory: &TableDirectory,
        table: u32,
        options: &ReadOptions,
    ) -> Self {
        let page_size = directory.page_size as usize;
        let extent = directory.tables.get(&table).copied();

        let next_page = match extent {
            Some(_) if page_size < PAGE_HEADER_SIZE => {
                warn!("Page size {} too small, skipping table {}", page_size, table);
                None
            }
            Some(extent) => Some(extent.first_page),
            None => None,
        };

        Self {
            cursor: ByteCursor::new(data),
            table,
            page_size,
            last_page: extent.map(|e| e.last_page).unwrap_or(0),
            next_page,
            visited: HashSet::new(),
            options: *options,
            current: None,
            stop: None,
        }
    }

    /// Number of pages entered so far
    pub fn pages_visited(&self) -> usize {
        self.visited.len()
    }

    /// Set when the chain was cut short by a cycle, the page cap or the end
    /// of the buffer
    pub fn stop_reason(&self) -> Option<ChainStop> {
        self.stop
    }

    /// Move to the next page in the chain. Returns false when the chain ends.
    fn advance_page(&mut self) -> bool {
        let Some(page) = self.next_page.take() else {
            return false;
        };

        if page == 0 {
            return false;
        }

        if self.visited.len() >= self.options.max_pages_per_table {
            warn!(
                "Table {} exceeds {} pages, stopping",
                self.table, self.options.max_pages_per_table
            );
            self.stop = Some(ChainStop::PageCap(self.options.max_pages_per_table));
            return false;
        }

        if !self.visited.insert(page) {
            warn!("Table {} revisits page {}, stopping", self.table, page);
            self.stop = Some(ChainStop::Revisit(page));
            return false;
        }

        let page_start = match (page as usize).checked_mul(self.page_size) {
            Some(start) if self.cursor.fits(start, PAGE_HEADER_SIZE) => start,
            _ => {
                warn!("Table {} page {} lies beyond the file", self.table, page);
                self.stop = Some(ChainStop::BeyondFile(page));
                return false;
            }
        };

        let bytes = &self.cursor.buffer()[page_start..page_start + PAGE_HEADER_SIZE];
        let header = match PageHeader::read(&mut Cursor::new(bytes)) {
            Ok(header) => header,
            Err(e) => {
                warn!("Unreadable header on page {}: {}", page, e);
                return false;
            }
        };

        if header.page_type != self.table {
            debug!(
                "Page {} belongs to table {}, not {}; chain ends",
                page, header.page_type, self.table
            );
            return false;
        }

        if page != self.last_page {
            self.next_page = Some(header.next_page);
        }

        let row_count = header.row_count();
        if row_count > self.options.max_rows_per_page {
            warn!(
                "Page {} claims {} rows (ceiling {}), treating as empty",
                page, row_count, self.options.max_rows_per_page
            );
            return true;
        }

        self.current = Some(PageRows {
            page_start,
            row_count,
            offsets_start: page_start + PAGE_HEADER_SIZE + bitmap_len(row_count),
            slot: 0,
        });
        true
    }

    fn next_row_in_page(&mut self) -> Option<RowLocation> {
        let rows = self.current.as_mut()?;
        let len = self.cursor.len();

        while rows.slot < rows.row_count {
            let slot = rows.slot;
            rows.slot += 1;

            let flags = self
                .cursor
                .u8_at(rows.page_start + PAGE_HEADER_SIZE + slot / 8);
            if flags & (1 << (slot % 8)) == 0 {
                continue;
            }

            let offset = self.cursor.u16_at(rows.offsets_start + slot * 2) as usize;
            let row_offset = rows.page_start + offset;
            if offset != 0 && row_offset < len {
                return Some(RowLocation {
                    row_offset,
                    page_offset: rows.page_start,
                });
            }
        }

        self.current = None;
        None
    }
}

impl Iterator for PageWalker<'_> {
    type Item = RowLocation;

    fn next(&mut self) -> Option<RowLocation> {
        loop {
            if let Some(row) = self.next_row_in_page() {
                return Some(row);
            }
            if !self.advance_page() {
                return None;
            }
        }
    }
}

/// Walk a known table
pub fn walk_table<'a>(
    data: &'a [u8],
    directory: &TableDirectory,
    table: TableType,
    options: &ReadOptions,
) -> PageWalker<'a> {
    PageWalker::new(data, directory, table.tag(), options)
}
