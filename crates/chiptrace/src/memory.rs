//! Flat byte-addressable memory holding replay code and song data.
//!
//! The image is built once per job from a list of load blocks and cloned for
//! every subsong, so self-modifying replay code never leaks between subsongs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AddressFault, LoadError, Result};

/// Largest memory image a job may declare (2 MiB).
pub const MAX_MEMORY_SIZE: usize = 2 * 1024 * 1024;

/// A run of bytes to place at a fixed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBlock {
    /// First address written.
    pub address: u32,
    /// Declared length; must not exceed `data.len()`.
    pub length: usize,
    /// Payload.
    pub data: Vec<u8>,
}

impl LoadBlock {
    /// Block whose declared length is its payload length.
    pub fn new(address: u32, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            address,
            length: data.len(),
            data,
        }
    }

    /// Block with an explicit declared length, as container headers state it.
    pub fn declared(address: u32, length: usize, data: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            length,
            data: data.into(),
        }
    }
}

/// Access width for [`MemoryImage::read`] and [`MemoryImage::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 8 bits.
    Byte,
    /// 16 bits, little-endian.
    Word,
}

impl Width {
    /// Bytes covered by one access.
    pub const fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
        }
    }
}

/// Owned memory of a declared size.
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl MemoryImage {
    /// Zeroed image of `size` bytes.
    pub fn zeroed(size: usize) -> Result<Self> {
        if size == 0 || size > MAX_MEMORY_SIZE {
            return Err(LoadError::InvalidSize {
                size,
                max: MAX_MEMORY_SIZE,
            });
        }
        Ok(Self {
            bytes: vec![0; size],
        })
    }

    /// Build an image and copy `blocks` into it in order; later blocks
    /// overwrite earlier ones where they overlap.
    pub fn load(size: usize, blocks: &[LoadBlock]) -> Result<Self> {
        let mut image = Self::zeroed(size)?;
        for block in blocks {
            image.load_block(block)?;
        }
        Ok(image)
    }

    /// Copy one block into the image.
    pub fn load_block(&mut self, block: &LoadBlock) -> Result<()> {
        let size = self.bytes.len();
        let start = block.address as usize;
        let end = start
            .checked_add(block.length)
            .filter(|&end| end <= size)
            .ok_or(LoadError::OutOfBounds {
                address: block.address,
                length: block.length,
                size,
            })?;
        if block.data.len() < block.length {
            return Err(LoadError::TruncatedBlock {
                address: block.address,
                declared: block.length,
                actual: block.data.len(),
            });
        }
        self.bytes[start..end].copy_from_slice(&block.data[..block.length]);
        Ok(())
    }

    /// Declared size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whole image.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Read a byte or little-endian word.
    pub fn read(&self, address: u32, width: Width) -> std::result::Result<u32, AddressFault> {
        let range = self.range(address, width)?;
        let bytes = &self.bytes[range];
        Ok(match width {
            Width::Byte => bytes[0] as u32,
            Width::Word => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        })
    }

    /// Read one byte.
    pub fn read_byte(&self, address: u32) -> std::result::Result<u8, AddressFault> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(AddressFault { address })
    }

    /// Read a big-endian word (macro operands are stored big-endian).
    pub fn read_be_word(&self, address: u32) -> std::result::Result<u16, AddressFault> {
        let range = self.range(address, Width::Word)?;
        let bytes = &self.bytes[range];
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Write a byte or little-endian word. Only the low `width` bytes of
    /// `value` are stored.
    pub fn write(
        &mut self,
        address: u32,
        width: Width,
        value: u32,
    ) -> std::result::Result<(), AddressFault> {
        let range = self.range(address, width)?;
        let le = value.to_le_bytes();
        self.bytes[range].copy_from_slice(&le[..width.bytes()]);
        Ok(())
    }

    /// Write one byte.
    pub fn write_byte(&mut self, address: u32, value: u8) -> std::result::Result<(), AddressFault> {
        let slot = self
            .bytes
            .get_mut(address as usize)
            .ok_or(AddressFault { address })?;
        *slot = value;
        Ok(())
    }

    fn range(
        &self,
        address: u32,
        width: Width,
    ) -> std::result::Result<std::ops::Range<usize>, AddressFault> {
        let start = address as usize;
        match start.checked_add(width.bytes()) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            // Report the first byte that is out of range.
            _ => Err(AddressFault {
                address: address.max(self.bytes.len() as u32),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_applied_in_order() {
        let image = MemoryImage::load(
            0x100,
            &[
                LoadBlock::new(0x10, [1, 2, 3, 4]),
                LoadBlock::new(0x12, [9]),
            ],
        )
        .unwrap();
        assert_eq!(&image.as_slice()[0x10..0x14], &[1, 2, 9, 4]);
        assert_eq!(image.read_byte(0x0F), Ok(0));
    }

    #[test]
    fn words_are_little_endian() {
        let mut image = MemoryImage::load(0x10, &[LoadBlock::new(0, [0x34, 0x12])]).unwrap();
        assert_eq!(image.read(0, Width::Word), Ok(0x1234));
        assert_eq!(image.read_be_word(0), Ok(0x3412));

        image.write(4, Width::Word, 0xBEEF).unwrap();
        assert_eq!(image.read_byte(4), Ok(0xEF));
        assert_eq!(image.read_byte(5), Ok(0xBE));
    }

    #[test]
    fn block_ending_exactly_at_size_is_accepted() {
        let image = MemoryImage::load(4, &[LoadBlock::new(2, [7, 8])]).unwrap();
        assert_eq!(image.read(2, Width::Word), Ok(0x0807));
    }

    #[test]
    fn block_past_end_is_rejected() {
        let err = MemoryImage::load(4, &[LoadBlock::new(3, [7, 8])]).unwrap_err();
        assert_eq!(
            err,
            LoadError::OutOfBounds {
                address: 3,
                length: 2,
                size: 4
            }
        );
    }

    #[test]
    fn short_payload_is_truncated_block() {
        let err = MemoryImage::load(16, &[LoadBlock::declared(0, 8, [1, 2, 3])]).unwrap_err();
        assert_eq!(
            err,
            LoadError::TruncatedBlock {
                address: 0,
                declared: 8,
                actual: 3
            }
        );
    }

    #[test]
    fn longer_payload_copies_declared_length_only() {
        let image = MemoryImage::load(8, &[LoadBlock::declared(0, 2, [1, 2, 3])]).unwrap();
        assert_eq!(image.read_byte(2), Ok(0));
    }

    #[test]
    fn invalid_sizes() {
        assert!(matches!(
            MemoryImage::zeroed(0),
            Err(LoadError::InvalidSize { size: 0, .. })
        ));
        assert!(MemoryImage::zeroed(MAX_MEMORY_SIZE + 1).is_err());
        assert!(MemoryImage::zeroed(MAX_MEMORY_SIZE).is_ok());
    }

    #[test]
    fn out_of_range_accesses_fault() {
        let mut image = MemoryImage::zeroed(0x10).unwrap();
        assert_eq!(image.read_byte(0x10), Err(AddressFault { address: 0x10 }));
        assert_eq!(
            image.read(0x0F, Width::Word),
            Err(AddressFault { address: 0x10 })
        );
        assert_eq!(
            image.write_byte(0x20, 1),
            Err(AddressFault { address: 0x20 })
        );
    }
}
