//! FITS primary HDU writer.

use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use ndarray::ArrayViewD;

use crate::error::Result;
use crate::io::fs::write_atomic;

use super::structures::*;

/// Build the header for `shape`: fresh structural cards followed by the
/// non-structural cards of `template`, in their original order.
pub fn header_for(template: &Header, shape: &[usize]) -> Header {
    let mut header = Header::new();
    header.push(Card::logical("SIMPLE", true, "conforms to FITS standard"));
    header.push(Card::integer("BITPIX", Bitpix::F64.as_i64(), "array data type"));
    header.push(Card::integer("NAXIS", shape.len() as i64, "number of array dimensions"));
    for (i, len) in shape.iter().rev().enumerate() {
        header.push(Card::integer(&format!("NAXIS{}", i + 1), *len as i64, ""));
    }
    header.push(Card::logical("EXTEND", true, ""));
    for card in template.carried_cards() {
        header.push(card.clone());
    }
    header
}

/// Encode a primary HDU holding `data` as 64-bit floats.
pub fn encode(template: &Header, data: &ArrayViewD<'_, f64>) -> Vec<u8> {
    let header = header_for(template, data.shape());

    let header_len = padded_len((header.len() + 1) * CARD_SIZE);
    let data_len = padded_len(data.len() * Bitpix::F64.bytes_per_value());
    let mut out = Vec::with_capacity(header_len + data_len);

    for card in header.cards() {
        out.extend_from_slice(card.image());
    }
    out.extend_from_slice(Card::end().image());
    out.resize(header_len, b' ');

    out.resize(header_len + data_len, 0);

    // Logical iteration order is row-major, which is FITS order.
    let width = Bitpix::F64.bytes_per_value();
    for (chunk, value) in out[header_len..].chunks_exact_mut(width).zip(data.iter()) {
        BigEndian::write_f64(chunk, *value);
    }

    out
}

/// Write `data` with `template`'s cards to `path`, atomically.
pub async fn write_fits(path: &Path, template: &Header, data: &ArrayViewD<'_, f64>) -> Result<()> {
    let bytes = encode(template, data);
    write_atomic(path, &bytes).await
}
