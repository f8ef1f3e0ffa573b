use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::FatBrowseError;
use crate::fs::entry::DIR_ENTRY_SIZE;

/// Size of the boot sector holding the BIOS parameter block.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// BIOS parameter block fields locating the FAT, root directory and data
/// regions of a FAT12 volume.
///
/// Values are taken as-is from their fixed offsets in the boot sector.
/// Geometry is not cross-checked here; an inconsistent BPB surfaces later
/// as a `CorruptImage` error when a region read falls short.
#[derive(Debug, Clone, Copy)]
pub struct BiosParamBlock {
    /// Bytes per sector (offset 11).
    pub bytes_per_sector: u16,
    /// Number of FAT copies (offset 16).
    pub fat_copies: u8,
    /// Number of 32-byte root directory entries (offset 17).
    pub root_entry_count: u16,
    /// Total sectors on the volume (offset 19).
    pub total_sectors: u16,
    /// Sectors per FAT copy (offset 22).
    pub sectors_per_fat: u16,
}

impl BiosParamBlock {
    /// Parse the BPB out of the image's first sector.
    pub fn parse(boot: &[u8]) -> Result<Self, FatBrowseError> {
        if boot.len() < BOOT_SECTOR_SIZE {
            return Err(FatBrowseError::CorruptImage(format!(
                "boot sector is {} bytes, need {BOOT_SECTOR_SIZE}",
                boot.len()
            )));
        }

        let mut cursor = Cursor::new(boot);
        cursor.set_position(11);
        let bytes_per_sector = cursor.read_u16::<LittleEndian>()?;
        cursor.set_position(16);
        let fat_copies = cursor.read_u8()?;
        let root_entry_count = cursor.read_u16::<LittleEndian>()?;
        let total_sectors = cursor.read_u16::<LittleEndian>()?;
        cursor.set_position(22);
        let sectors_per_fat = cursor.read_u16::<LittleEndian>()?;

        if bytes_per_sector == 0 {
            return Err(FatBrowseError::CorruptImage(
                "bytes per sector is 0".into(),
            ));
        }

        Ok(Self {
            bytes_per_sector,
            fat_copies,
            root_entry_count,
            total_sectors,
            sectors_per_fat,
        })
    }

    /// Bytes in one FAT copy.
    pub fn fat_bytes(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_fat as usize
    }

    /// Bytes in the root directory entry table, before sector padding.
    pub fn root_dir_bytes(&self) -> usize {
        self.root_entry_count as usize * DIR_ENTRY_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boot_sector() -> [u8; BOOT_SECTOR_SIZE] {
        let mut boot = [0u8; BOOT_SECTOR_SIZE];
        boot[11..13].copy_from_slice(&512u16.to_le_bytes());
        boot[16] = 2;
        boot[17..19].copy_from_slice(&224u16.to_le_bytes());
        boot[19..21].copy_from_slice(&2880u16.to_le_bytes());
        boot[22..24].copy_from_slice(&9u16.to_le_bytes());
        boot
    }

    #[test]
    fn test_parse_fields() {
        let bpb = BiosParamBlock::parse(&boot_sector()).unwrap();
        assert_eq!(bpb.bytes_per_sector, 512);
        assert_eq!(bpb.fat_copies, 2);
        assert_eq!(bpb.root_entry_count, 224);
        assert_eq!(bpb.total_sectors, 2880);
        assert_eq!(bpb.sectors_per_fat, 9);
        assert_eq!(bpb.fat_bytes(), 9 * 512);
        assert_eq!(bpb.root_dir_bytes(), 224 * 32);
    }

    #[test]
    fn test_parse_short_buffer() {
        let err = BiosParamBlock::parse(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, FatBrowseError::CorruptImage(_)));
    }

    #[test]
    fn test_parse_zero_sector_size() {
        let mut boot = boot_sector();
        boot[11..13].copy_from_slice(&0u16.to_le_bytes());
        let err = BiosParamBlock::parse(&boot).unwrap_err();
        assert!(matches!(err, FatBrowseError::CorruptImage(_)));
    }
}
