//! Error types for devicesql-core
//!
//! Parsing never surfaces these for malformed input; they travel between the
//! row decoders and the assembler, and out of the file and edit helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed row at offset {offset:#x}: {reason}")]
    MalformedRow { offset: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Playlist {0} has no entries")]
    PlaylistNotFound(u32),

    #[error("Entry position {position} out of range for playlist {playlist_id} ({len} entries)")]
    EntryOutOfRange {
        playlist_id: u32,
        position: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRow {
            offset,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
