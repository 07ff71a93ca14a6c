use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::io::fs::{ensure_dir, write_atomic};

use super::FORMAT;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Unpacks ZIP members read through a [`ReadAt`] source.
pub struct ArchiveExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ArchiveExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Decompress one member into memory and verify its CRC-32.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let reader = self.parser.reader();
        let data_offset = self.parser.get_data_offset(entry).await?;

        // Sizes come from the archive; check them against the file first.
        let data_end = data_offset.checked_add(entry.compressed_size);
        if data_end.is_none_or(|end| end > reader.size()) {
            return Err(Error::format(
                FORMAT,
                format!(
                    "{}: {} compressed bytes extend past end of archive",
                    entry.file_name, entry.compressed_size
                ),
            ));
        }

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        reader.read_exact_at(FORMAT, data_offset, &mut compressed).await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect a liar.
                let mut out = Vec::new();
                DeflateDecoder::new(compressed.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .map_err(|e| {
                        Error::format(FORMAT, format!("{}: corrupt deflate stream: {e}", entry.file_name))
                    })?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::format(
                    FORMAT,
                    format!(
                        "{}: unsupported compression method {method} (only STORED and DEFLATE)",
                        entry.file_name
                    ),
                ));
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(Error::format(
                FORMAT,
                format!(
                    "{}: expected {} bytes, got {}",
                    entry.file_name,
                    entry.uncompressed_size,
                    data.len()
                ),
            ));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(Error::format(
                FORMAT,
                format!("{}: CRC-32 mismatch", entry.file_name),
            ));
        }

        Ok(data)
    }

    /// Extract one member to `output_path`, creating parent directories.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        let data = self.extract_to_memory(entry).await?;
        write_atomic(output_path, &data).await
    }

    /// Extract every member below `dest`, keeping the archive's layout.
    ///
    /// `dest` may already exist. Members whose names would escape `dest` are
    /// skipped. Returns the number of files written.
    pub async fn extract_all(&self, dest: &Path) -> Result<usize> {
        ensure_dir(dest).await?;

        let entries = self.list_files().await?;
        let mut written = 0;

        for entry in &entries {
            let Some(relative) = entry.enclosed_path() else {
                warn!(name = %entry.file_name, "skipping archive member with unsafe path");
                continue;
            };
            let output_path = dest.join(relative);

            if entry.is_directory {
                ensure_dir(&output_path).await?;
                continue;
            }

            debug!(name = %entry.file_name, bytes = entry.uncompressed_size, "extracting");
            self.extract_to_file(entry, &output_path).await?;
            written += 1;
        }

        info!(
            dest = %dest.display(),
            files = written,
            entries = entries.len(),
            "archive extracted"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::fixture::{MemoryReader, zip64_archive};
    use tempfile::TempDir;

    fn extractor(bytes: Vec<u8>) -> ArchiveExtractor<MemoryReader> {
        ArchiveExtractor::new(Arc::new(MemoryReader(bytes)))
    }

    #[tokio::test]
    async fn extracts_zip64_member() {
        let tmp = TempDir::new().unwrap();
        let ex = extractor(zip64_archive("SP3D/20230615120000/slit.fits", b"stokes", None, b""));

        assert_eq!(ex.extract_all(tmp.path()).await.unwrap(), 1);
        let written = std::fs::read(tmp.path().join("SP3D/20230615120000/slit.fits")).unwrap();
        assert_eq!(written, b"stokes");
    }

    #[tokio::test]
    async fn sizes_beyond_the_archive_are_format_mismatch() {
        let ex = extractor(zip64_archive("slit.fits", b"stokes", Some(1 << 63), b""));
        let entries = ex.list_files().await.unwrap();
        assert_eq!(entries[0].compressed_size, 1 << 63);

        let err = ex.extract_to_memory(&entries[0]).await.unwrap_err();
        assert!(err.is_format_mismatch(), "{err}");
    }

    #[tokio::test]
    async fn corrupted_member_fails_crc() {
        let mut bytes = zip64_archive("slit.fits", b"stokes", None, b"");
        // Member data starts after the 30-byte header, the name and the extra field.
        bytes[30 + "slit.fits".len() + 20] ^= 0xFF;
        let ex = extractor(bytes);
        let entries = ex.list_files().await.unwrap();

        let err = ex.extract_to_memory(&entries[0]).await.unwrap_err();
        assert!(err.is_format_mismatch(), "{err}");
    }
}
