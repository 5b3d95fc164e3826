//! In-memory target used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::process::{ProcessProvider, ProcessTarget, ReadMemory};

#[derive(Debug)]
struct MockState {
    base: u64,
    bytes: HashMap<u64, u8>,
    alive: bool,
}

/// Sparse byte map standing in for a process address space.
///
/// Clones share the same memory, so a test can keep one handle and mutate the
/// "process" between ticks while the reader owns another.
#[derive(Debug, Clone)]
pub struct MockMemoryReader {
    state: Arc<Mutex<MockState>>,
}

impl MockMemoryReader {
    pub fn new(base: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                base,
                bytes: HashMap::new(),
                alive: true,
            })),
        }
    }

    pub fn write_bytes(&self, address: u64, bytes: &[u8]) {
        let mut state = self.state.lock().unwrap();
        for (i, b) in bytes.iter().enumerate() {
            state.bytes.insert(address + i as u64, *b);
        }
    }

    pub fn write_zeroes(&self, address: u64, len: usize) {
        self.write_bytes(address, &vec![0u8; len]);
    }

    pub fn write_u8(&self, address: u64, value: u8) {
        self.write_bytes(address, &[value]);
    }

    pub fn write_u16(&self, address: u64, value: u16) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_u32(&self, address: u64, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_i32(&self, address: u64, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Unmap a range so reads touching it fail
    pub fn unmap(&self, address: u64, len: usize) {
        let mut state = self.state.lock().unwrap();
        for i in 0..len as u64 {
            state.bytes.remove(&(address + i));
        }
    }

    pub fn set_alive(&self, alive: bool) {
        self.state.lock().unwrap().alive = alive;
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        if !state.alive {
            return Err(Error::MemoryReadFailed {
                address,
                message: "process exited".to_string(),
            });
        }
        (0..size as u64)
            .map(|i| state.bytes.get(&(address + i)).copied())
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("{} bytes not mapped", size),
            })
    }

    fn base_address(&self) -> u64 {
        self.state.lock().unwrap().base
    }

    fn is_alive(&self) -> bool {
        self.state.lock().unwrap().alive
    }
}

/// Fluent setup for small mock address spaces
pub struct MockMemoryBuilder {
    reader: MockMemoryReader,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            reader: MockMemoryReader::new(0x0040_0000),
        }
    }

    /// Set the module base; call before any writes
    pub fn base(self, base: u64) -> Self {
        self.reader.state.lock().unwrap().base = base;
        self
    }

    pub fn bytes(self, address: u64, bytes: &[u8]) -> Self {
        self.reader.write_bytes(address, bytes);
        self
    }

    pub fn u16(self, address: u64, value: u16) -> Self {
        self.reader.write_u16(address, value);
        self
    }

    pub fn u32(self, address: u64, value: u32) -> Self {
        self.reader.write_u32(address, value);
        self
    }

    pub fn build(self) -> MockMemoryReader {
        self.reader
    }
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hands out the shared mock memory while it is "running"
pub struct MockProcesses {
    memory: MockMemoryReader,
    attach_calls: Arc<AtomicUsize>,
}

impl MockProcesses {
    pub fn new(memory: MockMemoryReader) -> Self {
        Self {
            memory,
            attach_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn attach_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attach_calls)
    }
}

impl ProcessProvider for MockProcesses {
    type Memory = MockMemoryReader;

    fn attach(&mut self, target: &ProcessTarget) -> Result<Self::Memory> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        if self.memory.is_alive() {
            Ok(self.memory.clone())
        } else {
            Err(Error::ProcessNotFound(target.process_name.clone()))
        }
    }
}
