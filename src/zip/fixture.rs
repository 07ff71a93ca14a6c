//! Hand-built archives for exercising ZIP64 records without writing 4 GiB.

use async_trait::async_trait;
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;

use crate::error::Result;
use crate::io::ReadAt;

use super::structures::*;

/// Archive bytes held in memory.
pub(crate) struct MemoryReader(pub Vec<u8>);

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = offset.min(self.0.len() as u64) as usize;
        let n = buf.len().min(self.0.len() - start);
        buf[..n].copy_from_slice(&self.0[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.0.len() as u64
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// A single STORED member whose sizes, offset and directory location all live
/// in ZIP64 fields. `declared_size` replaces the member size written there.
pub(crate) fn zip64_archive(name: &str, data: &[u8], declared_size: Option<u64>, comment: &[u8]) -> Vec<u8> {
    let size = declared_size.unwrap_or(data.len() as u64);
    let mut crc = Crc::new();
    crc.update(data);
    let mut out = Vec::new();

    out.extend_from_slice(LFH_SIGNATURE);
    for v in [45u16, 0, 0, 0, 0x21] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }
    out.write_u32::<LittleEndian>(crc.sum()).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.extend_from_slice(name.as_bytes());
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(16).unwrap();
    out.write_u64::<LittleEndian>(size).unwrap();
    out.write_u64::<LittleEndian>(size).unwrap();
    out.extend_from_slice(data);

    let cd_offset = out.len() as u64;
    out.extend_from_slice(CDFH_SIGNATURE);
    for v in [45u16, 45, 0, 0, 0, 0x21] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }
    out.write_u32::<LittleEndian>(crc.sum()).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    for v in [name.len() as u16, 28, 0, 0, 0] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.extend_from_slice(name.as_bytes());
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(24).unwrap();
    for v in [size, size, 0] {
        out.write_u64::<LittleEndian>(v).unwrap();
    }
    let cd_size = out.len() as u64 - cd_offset;

    let eocd64_offset = out.len() as u64;
    out.extend_from_slice(Zip64EOCD::SIGNATURE);
    out.write_u64::<LittleEndian>(44).unwrap();
    out.write_u16::<LittleEndian>(45).unwrap();
    out.write_u16::<LittleEndian>(45).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    for v in [1, 1, cd_size, cd_offset] {
        out.write_u64::<LittleEndian>(v).unwrap();
    }

    out.extend_from_slice(Zip64EOCDLocator::SIGNATURE);
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
    out.write_u32::<LittleEndian>(1).unwrap();

    out.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
    for v in [0u16, 0, u16::MAX, u16::MAX] {
        out.write_u16::<LittleEndian>(v).unwrap();
    }
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u32::<LittleEndian>(u32::MAX).unwrap();
    out.write_u16::<LittleEndian>(comment.len() as u16).unwrap();
    out.extend_from_slice(comment);
    out
}
