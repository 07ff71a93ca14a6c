pub mod fs;
mod local;

pub use local::LocalFileReader;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Random access reads from a data source.
///
/// Both the ZIP and the FITS readers are written against this trait so they
/// only fetch the byte ranges they need.
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer, returning the
    /// number of bytes read. May return fewer bytes than requested.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Total size of the data source in bytes.
    fn size(&self) -> u64;

    /// Short label for error messages (usually the file path).
    fn describe(&self) -> String;

    /// Fill `buf` completely starting at `offset`.
    ///
    /// Running past the end of the source is reported as a format mismatch
    /// of `format`, since it means a length field pointed outside the file.
    async fn read_exact_at(&self, format: &'static str, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(Error::format(
                    format,
                    format!(
                        "{}: unexpected end of data at offset {} (wanted {} more bytes)",
                        self.describe(),
                        offset + filled as u64,
                        buf.len() - filled
                    ),
                ));
            }
            filled += n;
        }
        Ok(())
    }
}
