use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::process::{ByteBuffer, Decode, ProcessHandle, RemoteAddress};

/// How an address handed to the accessor is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Already an address in the target's space
    Absolute,
    /// Offset from the attached module's load base
    ModuleRelative,
}

/// Synchronous, bounded reads from an attached target.
///
/// A failed read never partially fills anything the caller owns; the error is
/// the only result. There are no retries at this level.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Load base of the attached main module
    fn base_address(&self) -> u64;

    /// False once the OS reports the process gone
    fn is_alive(&self) -> bool {
        true
    }

    fn resolve(&self, address: u64, mode: AddressingMode) -> u64 {
        match mode {
            AddressingMode::Absolute => address,
            AddressingMode::ModuleRelative => self.base_address().wrapping_add(address),
        }
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        self.read_u32(address).map(|v| v as i32)
    }

    /// Read a 32-bit pointer slot; the result is not validated
    fn read_address(&self, address: u64) -> Result<RemoteAddress> {
        self.read_u32(address).map(RemoteAddress::new)
    }

    fn read_value<T: Decode>(&self, address: u64, mode: AddressingMode) -> Result<T>
    where
        Self: Sized,
    {
        let address = self.resolve(address, mode);
        let bytes = self.read_bytes(address, T::SIZE)?;
        T::decode(&ByteBuffer::new(&bytes))
    }

    /// Decode the record a pointer refers to, rejecting null/negative pointers
    fn read_struct<T: Decode>(&self, address: RemoteAddress) -> Result<T>
    where
        Self: Sized,
    {
        if !address.is_valid() {
            return Err(Error::InvalidAddress(address.raw()));
        }
        self.read_value(address.as_u64(), AddressingMode::Absolute)
    }
}

/// Reads from a live process opened through the OS
pub struct MemoryReader {
    process: ProcessHandle,
}

impl MemoryReader {
    pub fn new(process: ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }
}

impl ReadMemory for MemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.process.read_bytes(address, size)
    }

    fn base_address(&self) -> u64 {
        self.process.info().base_address
    }

    fn is_alive(&self) -> bool {
        self.process.is_alive()
    }
}

/// Which process and module to attach to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessTarget {
    pub process_name: String,
    pub module_name: String,
}

impl ProcessTarget {
    pub fn new(process_name: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            module_name: module_name.into(),
        }
    }
}

/// Source of attached address spaces
pub trait ProcessProvider {
    type Memory: ReadMemory;

    fn attach(&mut self, target: &ProcessTarget) -> Result<Self::Memory>;
}

/// Attaches to real processes running on this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl ProcessProvider for SystemProcesses {
    type Memory = MemoryReader;

    fn attach(&mut self, target: &ProcessTarget) -> Result<Self::Memory> {
        ProcessHandle::find_and_open(&target.process_name, &target.module_name)
            .map(MemoryReader::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockMemoryBuilder;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: u16,
        b: RemoteAddress,
    }

    impl Decode for Pair {
        const SIZE: usize = 8;

        fn decode(buf: &ByteBuffer<'_>) -> Result<Self> {
            Ok(Self {
                a: buf.u16_at(0)?,
                b: buf.address_at(4)?,
            })
        }
    }

    #[test]
    fn test_module_relative_reads() {
        let reader = MockMemoryBuilder::new()
            .base(0x0040_0000)
            .u32(0x0040_0010, 0xDEAD_BEEF)
            .build();

        assert_eq!(
            reader.resolve(0x10, AddressingMode::ModuleRelative),
            0x0040_0010
        );
        assert_eq!(reader.resolve(0x10, AddressingMode::Absolute), 0x10);
        assert_eq!(reader.read_u32(0x0040_0010).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i32(0x0040_0010).unwrap(), 0xDEAD_BEEF_u32 as i32);
    }

    #[test]
    fn test_read_value_and_struct() {
        let reader = MockMemoryBuilder::new()
            .base(0x0040_0000)
            .bytes(0x0040_0100, &[7, 0, 0, 0, 0x00, 0x10, 0x00, 0x00])
            .build();

        let pair: Pair = reader
            .read_value(0x100, AddressingMode::ModuleRelative)
            .unwrap();
        assert_eq!(pair.a, 7);
        assert_eq!(pair.b, RemoteAddress::new(0x1000));

        let pair: Pair = reader
            .read_struct(RemoteAddress::new(0x0040_0100))
            .unwrap();
        assert_eq!(pair.a, 7);
    }

    #[test]
    fn test_read_struct_rejects_invalid_pointers() {
        let reader = MockMemoryBuilder::new().build();
        assert!(matches!(
            reader.read_struct::<Pair>(RemoteAddress::NULL),
            Err(Error::InvalidAddress(0))
        ));
        assert!(matches!(
            reader.read_struct::<Pair>(RemoteAddress::new(0x8000_0000)),
            Err(Error::InvalidAddress(0x8000_0000))
        ));
    }

    #[test]
    fn test_unmapped_read_fails() {
        let reader = MockMemoryBuilder::new().u32(0x2000, 1).build();
        assert!(matches!(
            reader.read_u32(0x2002),
            Err(Error::MemoryReadFailed { address: 0x2002, .. })
        ));
    }
}
