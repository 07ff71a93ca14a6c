//! ZIP archive reading and extraction.
//!
//! - [`structures`]: fixed records of the format (EOCD, ZIP64, entries)
//! - [`parser`]: locating and decoding those records through [`ReadAt`]
//! - [`extractor`]: decompressing members and writing them to disk
//!
//! STORED and DEFLATE members are supported, including ZIP64 archives.
//! Encryption and multi-disk archives are not.

mod extractor;
#[cfg(test)]
mod fixture;
mod parser;
mod structures;

use std::path::Path;
use std::sync::Arc;

pub use extractor::ArchiveExtractor;
pub use parser::ZipParser;
pub use structures::*;

use crate::error::{Error, Result};
use crate::io::LocalFileReader;

pub(crate) const FORMAT: &str = "ZIP";

/// Cursor reads that run out of bytes mean a record lied about its length.
pub(crate) fn truncated(e: std::io::Error) -> Error {
    Error::format(FORMAT, format!("truncated record: {e}"))
}

/// Open a local archive for listing or extraction.
///
/// An archive that cannot be opened is reported as a format mismatch, the
/// same as one that cannot be parsed.
pub fn open_archive(archive: &Path) -> Result<ArchiveExtractor<LocalFileReader>> {
    let reader = LocalFileReader::new(archive).map_err(|e| {
        Error::format(FORMAT, format!("cannot open {}: {e}", archive.display()))
    })?;
    Ok(ArchiveExtractor::new(Arc::new(reader)))
}

/// Unpack every member of `archive` into `staging`.
pub async fn extract_archive(archive: &Path, staging: &Path) -> Result<usize> {
    let extractor = open_archive(archive)?;
    extractor.extract_all(staging).await
}

/// List the members of a local archive.
pub async fn list_archive(archive: &Path) -> Result<Vec<ZipFileEntry>> {
    open_archive(archive)?.list_files().await
}
