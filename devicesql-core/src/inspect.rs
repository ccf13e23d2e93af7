//! Structural overview of an export database
//!
//! Walks every table in the directory with the same page walker the reader
//! uses and reports page/row counts, plus warnings about the file layout.

use std::fmt;

use serde::Serialize;

use crate::config::ReadOptions;
use crate::header::{TableDirectory, TableType};
use crate::page::{ChainStop, PageWalker};

/// Page and row counts for one table
#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub table_type: u32,
    pub name: String,
    pub first_page: u32,
    pub last_page: u32,
    pub pages: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InspectReport {
    pub file_len: usize,
    pub page_size: u32,
    pub tables: Vec<TableStats>,
    pub warnings: Vec<String>,
}

impl InspectReport {
    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn rows_in(&self, table: TableType) -> usize {
        self.tables
            .iter()
            .find(|t| t.table_type == table.tag())
            .map(|t| t.rows)
            .unwrap_or(0)
    }
}

/// Inspect a database image
pub fn inspect(data: &[u8]) -> InspectReport {
    inspect_with(data, &ReadOptions::default())
}

pub fn inspect_with(data: &[u8], options: &ReadOptions) -> InspectReport {
    let directory = TableDirectory::parse(data);
    let mut report = InspectReport {
        file_len: data.len(),
        page_size: directory.page_size,
        ..InspectReport::default()
    };

    let page_size = directory.page_size as usize;
    if page_size == 0 {
        report.add_warning("Header page_size is 0");
        return report;
    }
    if data.len() < page_size {
        report.add_warning(format!(
            "File too small: {} bytes (page size {})",
            data.len(),
            page_size
        ));
    } else if data.len() % page_size != 0 {
        report.add_warning(format!(
            "File size {} is not a multiple of page size {}",
            data.len(),
            page_size
        ));
    }
    let actual_pages = data.len() / page_size;

    for (&tag, extent) in &directory.tables {
        let name = TableType::from_tag(tag)
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| format!("unknown_{}", tag));

        if extent.first_page as usize >= actual_pages {
            report.add_warning(format!(
                "Table {} first_page {} exceeds page count {}",
                name, extent.first_page, actual_pages
            ));
        }

        let mut walker = PageWalker::new(data, &directory, tag, options);
        let rows = walker.by_ref().count();
        let pages = walker.pages_visited();
        match walker.stop_reason() {
            Some(ChainStop::Revisit(page)) => {
                report.add_warning(format!("Table {} revisits page {}", name, page))
            }
            Some(ChainStop::PageCap(cap)) => {
                report.add_warning(format!("Table {} exceeds {} pages", name, cap))
            }
            Some(ChainStop::BeyondFile(page)) => {
                report.add_warning(format!("Table {} links to page {} beyond the file", name, page))
            }
            None => {}
        }

        report.tables.push(TableStats {
            table_type: tag,
            name,
            first_page: extent.first_page,
            last_page: extent.last_page,
            pages,
            rows,
        });
    }

    report
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File size: {} bytes", self.file_len)?;
        writeln!(f, "Page size: {}", self.page_size)?;
        writeln!(f)?;
        writeln!(f, "{:<20} {:>6} {:>6} {:>6} {:>8}", "table", "first", "last", "pages", "rows")?;
        for table in &self.tables {
            writeln!(
                f,
                "{:<20} {:>6} {:>6} {:>6} {:>8}",
                table.name, table.first_page, table.last_page, table.pages, table.rows
            )?;
        }
        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }
        Ok(())
    }
}
