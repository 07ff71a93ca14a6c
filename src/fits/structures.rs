use crate::error::{Error, Result};

use super::FORMAT;

/// FITS logical record length.
pub const BLOCK_SIZE: usize = 2880;

/// Length of one header card.
pub const CARD_SIZE: usize = 80;

/// Pixel encoding of the primary array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            8 => Some(Bitpix::U8),
            16 => Some(Bitpix::I16),
            32 => Some(Bitpix::I32),
            64 => Some(Bitpix::I64),
            -32 => Some(Bitpix::F32),
            -64 => Some(Bitpix::F64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Bitpix::U8 => 8,
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::I64 => 64,
            Bitpix::F32 => -32,
            Bitpix::F64 => -64,
        }
    }

    pub fn bytes_per_value(&self) -> usize {
        (self.as_i64().unsigned_abs() / 8) as usize
    }
}

/// One 80-byte header record, parsed into keyword, value and comment.
///
/// The original image is kept so cards can be copied into another header
/// byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    keyword: String,
    value: Option<String>,
    comment: Option<String>,
    image: [u8; CARD_SIZE],
}

impl Card {
    pub fn parse(image: &[u8]) -> Result<Self> {
        if image.len() != CARD_SIZE {
            return Err(Error::format(
                FORMAT,
                format!("header card has {} bytes, expected {CARD_SIZE}", image.len()),
            ));
        }
        if !image.is_ascii() {
            return Err(Error::format(FORMAT, "header card contains non-ASCII bytes"));
        }

        let mut raw = [0u8; CARD_SIZE];
        raw.copy_from_slice(image);
        let text = String::from_utf8_lossy(image);

        let keyword = text[..8].trim_end().to_string();
        let (value, comment) = if &text[8..10] == "= " {
            split_value_field(&text[10..])
        } else {
            let commentary = text[8..].trim_end();
            (None, (!commentary.is_empty()).then(|| commentary.to_string()))
        };

        Ok(Self {
            keyword,
            value,
            comment,
            image: raw,
        })
    }

    pub fn integer(keyword: &str, value: i64, comment: &str) -> Self {
        Self::fixed(keyword, &value.to_string(), comment)
    }

    pub fn logical(keyword: &str, value: bool, comment: &str) -> Self {
        Self::fixed(keyword, if value { "T" } else { "F" }, comment)
    }

    pub fn end() -> Self {
        let mut image = [b' '; CARD_SIZE];
        image[..3].copy_from_slice(b"END");
        Self {
            keyword: "END".to_string(),
            value: None,
            comment: None,
            image,
        }
    }

    /// Fixed-format card: value right-justified to column 30.
    fn fixed(keyword: &str, value: &str, comment: &str) -> Self {
        let mut text = format!("{keyword:<8}= {value:>20}");
        if !comment.is_empty() {
            text.push_str(" / ");
            text.push_str(comment);
        }

        let mut image = [b' '; CARD_SIZE];
        let bytes = text.as_bytes();
        let len = bytes.len().min(CARD_SIZE);
        image[..len].copy_from_slice(&bytes[..len]);

        Self {
            keyword: keyword.to_string(),
            value: Some(value.to_string()),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
            image,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn image(&self) -> &[u8; CARD_SIZE] {
        &self.image
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.value()?.parse().ok()
    }

    /// Floats may use the Fortran `D` exponent.
    pub fn as_float(&self) -> Option<f64> {
        self.value()?.replace(['D', 'd'], "E").parse().ok()
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self.value()? {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }

    pub fn is_end(&self) -> bool {
        self.keyword == "END"
    }

    /// Cards that describe the array layout and are regenerated on write.
    pub fn is_structural(&self) -> bool {
        match self.keyword.as_str() {
            "SIMPLE" | "BITPIX" | "NAXIS" | "EXTEND" | "BZERO" | "BSCALE" | "END" => true,
            k => k
                .strip_prefix("NAXIS")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}

/// Split the text after `= ` into value and comment. Quoted strings may
/// contain `/` and use `''` for an embedded quote.
fn split_value_field(field: &str) -> (Option<String>, Option<String>) {
    let trimmed = field.trim_start();

    let (value, rest) = if let Some(body) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut chars = body.char_indices().peekable();
        let mut end = body.len();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    value.push('\'');
                    chars.next();
                } else {
                    end = i + 1;
                    break;
                }
            } else {
                value.push(c);
            }
        }
        (Some(value.trim_end().to_string()), &body[end.min(body.len())..])
    } else {
        match trimmed.find('/') {
            Some(i) => (Some(trimmed[..i].trim().to_string()), &trimmed[i..]),
            None => (Some(trimmed.trim_end().to_string()), ""),
        }
    };

    let comment = rest
        .trim_start()
        .strip_prefix('/')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    (value.filter(|v| !v.is_empty()), comment)
}

/// Ordered header cards of one HDU, without the terminating `END`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn get(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword() == keyword)
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        self.get(keyword)?.as_integer()
    }

    pub fn float(&self, keyword: &str) -> Option<f64> {
        self.get(keyword)?.as_float()
    }

    pub fn logical(&self, keyword: &str) -> Option<bool> {
        self.get(keyword)?.as_logical()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards carried over when this header is attached to a new array.
    pub fn carried_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|c| !c.is_structural())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Primary array description derived from the structural keywords.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayout {
    pub bitpix: Bitpix,
    /// Axis lengths in FITS order (NAXIS1 first, fastest varying).
    pub axes: Vec<usize>,
    pub bzero: f64,
    pub bscale: f64,
}

impl ImageLayout {
    pub fn from_header(header: &Header) -> Result<Self> {
        if header.logical("SIMPLE") != Some(true) {
            return Err(Error::format(FORMAT, "SIMPLE = T is missing"));
        }

        let bitpix_value = header
            .integer("BITPIX")
            .ok_or_else(|| Error::format(FORMAT, "BITPIX is missing"))?;
        let bitpix = Bitpix::from_i64(bitpix_value)
            .ok_or_else(|| Error::format(FORMAT, format!("unsupported BITPIX {bitpix_value}")))?;

        let naxis = header
            .integer("NAXIS")
            .filter(|n| (0..=999).contains(n))
            .ok_or_else(|| Error::format(FORMAT, "NAXIS is missing or invalid"))?;

        let axes = (1..=naxis)
            .map(|i| {
                header
                    .integer(&format!("NAXIS{i}"))
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| Error::format(FORMAT, format!("NAXIS{i} is missing or invalid")))
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = Self {
            bitpix,
            axes,
            bzero: header.float("BZERO").unwrap_or(0.0),
            bscale: header.float("BSCALE").unwrap_or(1.0),
        };
        if layout.data_bytes().is_none() {
            return Err(Error::format(
                FORMAT,
                format!("array of {:?} does not fit in memory", layout.shape()),
            ));
        }
        Ok(layout)
    }

    /// Axis lengths in row-major order (slowest first).
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().rev().copied().collect()
    }

    /// `None` when the product of the axis lengths overflows.
    pub fn element_count(&self) -> Option<usize> {
        if self.axes.is_empty() {
            return Some(0);
        }
        self.axes.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
    }

    pub fn data_bytes(&self) -> Option<usize> {
        self.element_count()?
            .checked_mul(self.bitpix.bytes_per_value())
    }

    pub fn is_scaled(&self) -> bool {
        self.bzero != 0.0 || self.bscale != 1.0
    }
}

/// Round `len` up to a whole number of blocks.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
