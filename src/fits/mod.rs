//! Minimal FITS support for the primary HDU.
//!
//! Exposure files and assembled artifacts are single-HDU FITS files. Only
//! what the pipeline needs is implemented:
//!
//! - [`structures`]: cards, headers and the array layout they describe
//! - [`parser`]: reading a primary HDU through [`ReadAt`](crate::io::ReadAt)
//! - [`writer`]: emitting a primary HDU as 64-bit floats
//!
//! Extensions, random groups and tables are not supported.

mod parser;
mod structures;
mod writer;

use std::path::Path;
use std::sync::Arc;

pub use parser::{FitsImage, FitsParser};
pub use structures::*;
pub use writer::{encode, header_for, write_fits};

use crate::error::Result;
use crate::io::LocalFileReader;

pub(crate) const FORMAT: &str = "FITS";

/// Read the primary HDU of a local file.
pub async fn read_fits(path: &Path) -> Result<FitsImage> {
    let reader = Arc::new(LocalFileReader::new(path)?);
    FitsParser::new(reader).read_image().await
}

/// Read only the header and array layout of a local file.
pub async fn read_fits_layout(path: &Path) -> Result<(Header, ImageLayout)> {
    let reader = Arc::new(LocalFileReader::new(path)?);
    FitsParser::new(reader).read_layout().await
}
