//! devicesql-core: reader and playlist writer for DeviceSQL export databases
//!
//! This crate provides:
//! - A tolerant reader for export.pdb: corrupt or truncated input degrades to
//!   default values and skipped rows, never to an error
//! - An in-place playlist order writer that keeps the file byte-identical
//!   apart from the rewritten entry indices
//!
//! Based on Deep Symmetry's reverse engineering of the format.

pub mod config;
pub mod cursor;
pub mod database;
pub mod edit;
pub mod error;
pub mod header;
pub mod inspect;
pub mod model;
pub mod page;
pub mod row;
pub mod string;
pub mod tree;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixture;

pub use config::ReadOptions;
pub use database::{parse, parse_file, parse_with, Database};
pub use error::{Error, Result};
pub use header::TableType;
pub use model::{
    Album, Artist, Artwork, Color, Genre, Key, PlaylistEntry, PlaylistTreeNode, Track,
};
pub use tree::PlaylistTreeItem;
pub use writer::{apply_playlist_modifications, PlaylistWrite, WriteReport};
