use crate::error::{Error, Result};
use crate::process::RemoteAddress;

/// A fixed-layout record that can be decoded from a raw byte range.
///
/// Decoding is pure: pointer fields come back as [`RemoteAddress`] values and
/// are never followed.
pub trait Decode: Sized {
    /// Number of bytes the record occupies in the target
    const SIZE: usize;

    fn decode(buf: &ByteBuffer<'_>) -> Result<Self>;
}

/// Bounds-checked little-endian view over bytes copied out of the target.
#[derive(Debug, Clone, Copy)]
pub struct ByteBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                Error::malformed(format!(
                    "field at {:#x}+{} outside {}-byte record",
                    offset,
                    len,
                    self.bytes.len()
                ))
            })
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let b = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let b = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32> {
        let b = self.slice(offset, 4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn address_at(&self, offset: usize) -> Result<RemoteAddress> {
        self.u32_at(offset).map(RemoteAddress::new)
    }
}
