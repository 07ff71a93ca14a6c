use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

use super::{FORMAT, truncated};

/// Member compression methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Check length and signature of a fixed record, returning a cursor over
/// the bytes that follow the signature.
fn record<'a>(data: &'a [u8], signature: &[u8], size: usize, name: &str) -> Result<Cursor<&'a [u8]>> {
    if data.len() < size || &data[..4] != signature {
        return Err(Error::format(FORMAT, format!("invalid {name}")));
    }
    Ok(Cursor::new(&data[4..size]))
}

/// End of central directory record (22 bytes without comment).
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut c = record(data, Self::SIGNATURE, Self::SIZE, "end of central directory")?;
        let mut read = || -> std::io::Result<Self> {
            let _disk_number = c.read_u16::<LittleEndian>()?;
            let _disk_with_cd = c.read_u16::<LittleEndian>()?;
            Ok(Self {
                disk_entries: c.read_u16::<LittleEndian>()?,
                total_entries: c.read_u16::<LittleEndian>()?,
                cd_size: c.read_u32::<LittleEndian>()?,
                cd_offset: c.read_u32::<LittleEndian>()?,
                comment_len: c.read_u16::<LittleEndian>()?,
            })
        };
        read().map_err(truncated)
    }

    /// Saturated fields mean the real values live in the ZIP64 record.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == u16::MAX
            || self.total_entries == u16::MAX
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }
}

/// ZIP64 end of central directory locator (20 bytes).
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut c = record(data, Self::SIGNATURE, Self::SIZE, "ZIP64 locator")?;
        c.set_position(4);
        let eocd64_offset = c.read_u64::<LittleEndian>().map_err(truncated)?;
        Ok(Self { eocd64_offset })
    }
}

/// ZIP64 end of central directory record (56 bytes minimum).
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut c = record(data, Self::SIGNATURE, Self::MIN_SIZE, "ZIP64 end of central directory")?;
        // record size, versions, disk numbers, entries on this disk
        c.set_position(8 + 2 + 2 + 4 + 4 + 8);
        let mut read = || -> std::io::Result<Self> {
            Ok(Self {
                total_entries: c.read_u64::<LittleEndian>()?,
                cd_size: c.read_u64::<LittleEndian>()?,
                cd_offset: c.read_u64::<LittleEndian>()?,
            })
        };
        read().map_err(truncated)
    }
}

pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Central directory entry for one archive member.
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// DOS date as (year, month, day).
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let d = self.last_mod_date;
        ((d >> 9) + 1980, ((d >> 5) & 0x0F) as u8, (d & 0x1F) as u8)
    }

    /// DOS time as (hour, minute, second).
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let t = self.last_mod_time;
        ((t >> 11) as u8, ((t >> 5) & 0x3F) as u8, ((t & 0x1F) * 2) as u8)
    }

    /// Relative path the member should be written to, or `None` when the
    /// name is absolute or climbs out of the destination.
    pub fn enclosed_path(&self) -> Option<PathBuf> {
        let name = self.file_name.replace('\\', "/");
        let mut path = PathBuf::new();
        for component in Path::new(&name).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (!path.as_os_str().is_empty()).then_some(path)
    }

    /// Compressed size as a percentage saved, for listings.
    pub fn saved_percent(&self) -> u64 {
        percent_saved(self.compressed_size, self.uncompressed_size)
    }
}

pub fn percent_saved(compressed: u64, uncompressed: u64) -> u64 {
    if uncompressed == 0 || compressed >= uncompressed {
        0
    } else {
        100 - compressed * 100 / uncompressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            last_mod_time: 0,
            last_mod_date: 0,
            is_directory: name.ends_with('/'),
        }
    }

    #[test]
    fn enclosed_path_rejects_traversal() {
        assert_eq!(
            entry("hinode/SP3D/20230615120000/a.fits").enclosed_path(),
            Some(PathBuf::from("hinode/SP3D/20230615120000/a.fits"))
        );
        assert_eq!(entry("./x/y.fits").enclosed_path(), Some(PathBuf::from("x/y.fits")));
        assert_eq!(entry("../evil.fits").enclosed_path(), None);
        assert_eq!(entry("/etc/passwd").enclosed_path(), None);
        assert_eq!(entry("a/../../b").enclosed_path(), None);
    }

    #[test]
    fn dos_timestamp_fields() {
        let mut e = entry("a");
        // 2023-06-15 12:30:10
        e.last_mod_date = ((2023 - 1980) << 9) | (6 << 5) | 15;
        e.last_mod_time = (12 << 11) | (30 << 5) | 5;
        assert_eq!(e.mod_date(), (2023, 6, 15));
        assert_eq!(e.mod_time(), (12, 30, 10));
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let err = EndOfCentralDirectory::from_bytes(&[0u8; 22]).err().unwrap();
        assert!(err.is_format_mismatch());
    }
}
