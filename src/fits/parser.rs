//! FITS primary HDU reader.
//!
//! Headers are read one 2880-byte block at a time until the `END` card,
//! then the data segment is fetched in a single read and decoded from
//! big-endian into `f64`, applying `BZERO`/`BSCALE`.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::FORMAT;
use super::structures::*;

/// A decoded primary HDU.
#[derive(Debug, Clone)]
pub struct FitsImage {
    pub header: Header,
    /// Physical values in row-major order (`NAXISn` first, `NAXIS1` last).
    pub data: ArrayD<f64>,
}

/// Reader for the primary HDU of a FITS file.
pub struct FitsParser<R: ReadAt> {
    reader: Arc<R>,
}

impl<R: ReadAt> FitsParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Parse header cards up to `END`.
    ///
    /// Returns the header and the byte offset of the data segment.
    pub async fn read_header(&self) -> Result<(Header, u64)> {
        let mut header = Header::new();
        let mut offset = 0u64;
        let mut block = vec![0u8; BLOCK_SIZE];

        loop {
            if offset + BLOCK_SIZE as u64 > self.reader.size() {
                return Err(Error::format(
                    FORMAT,
                    format!("{}: header has no END card", self.reader.describe()),
                ));
            }
            self.reader.read_exact_at(FORMAT, offset, &mut block).await?;
            offset += BLOCK_SIZE as u64;

            for image in block.chunks_exact(CARD_SIZE) {
                let card = Card::parse(image)?;
                if header.is_empty() && card.keyword() != "SIMPLE" {
                    return Err(Error::format(
                        FORMAT,
                        format!("{}: first card is not SIMPLE", self.reader.describe()),
                    ));
                }
                if card.is_end() {
                    debug!(
                        source = %self.reader.describe(),
                        cards = header.len(),
                        blocks = offset / BLOCK_SIZE as u64,
                        "parsed FITS header"
                    );
                    return Ok((header, offset));
                }
                header.push(card);
            }
        }
    }

    /// Read the header and the primary array layout, without the data.
    pub async fn read_layout(&self) -> Result<(Header, ImageLayout)> {
        let (header, _) = self.read_header().await?;
        let layout = ImageLayout::from_header(&header)?;
        Ok((header, layout))
    }

    /// Read and decode the whole primary HDU.
    pub async fn read_image(&self) -> Result<FitsImage> {
        let (header, data_offset) = self.read_header().await?;
        let layout = ImageLayout::from_header(&header)?;

        let data_bytes = match layout.data_bytes() {
            Some(0) | None => {
                return Err(Error::format(
                    FORMAT,
                    format!("{}: primary HDU holds no usable array", self.reader.describe()),
                ));
            }
            Some(n) => n,
        };

        // The header is untrusted; never allocate more than the file holds.
        let available = self.reader.size().saturating_sub(data_offset);
        if data_bytes as u64 > available {
            return Err(Error::format(
                FORMAT,
                format!(
                    "{}: header declares {data_bytes} data bytes but only {available} follow",
                    self.reader.describe()
                ),
            ));
        }

        let mut raw = vec![0u8; data_bytes];
        self.reader.read_exact_at(FORMAT, data_offset, &mut raw).await?;

        let values = decode(&raw, &layout);
        let data = ArrayD::from_shape_vec(IxDyn(&layout.shape()), values)?;
        Ok(FitsImage { header, data })
    }
}

/// Decode big-endian samples into physical values.
fn decode(raw: &[u8], layout: &ImageLayout) -> Vec<f64> {
    let width = layout.bitpix.bytes_per_value();
    let samples = raw.chunks_exact(width);

    let stored: Vec<f64> = match layout.bitpix {
        Bitpix::U8 => samples.map(|b| b[0] as f64).collect(),
        Bitpix::I16 => samples.map(|b| BigEndian::read_i16(b) as f64).collect(),
        Bitpix::I32 => samples.map(|b| BigEndian::read_i32(b) as f64).collect(),
        Bitpix::I64 => samples.map(|b| BigEndian::read_i64(b) as f64).collect(),
        Bitpix::F32 => samples.map(|b| BigEndian::read_f32(b) as f64).collect(),
        Bitpix::F64 => samples.map(BigEndian::read_f64).collect(),
    };

    if layout.is_scaled() {
        stored
            .into_iter()
            .map(|v| layout.bzero + layout.bscale * v)
            .collect()
    } else {
        stored
    }
}
