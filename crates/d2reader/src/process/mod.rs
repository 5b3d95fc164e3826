mod address;
mod buffer;
mod handle;
mod reader;

#[cfg(test)]
pub mod mock;

pub use address::RemoteAddress;
pub use buffer::{ByteBuffer, Decode};
pub use handle::{ProcessHandle, ProcessInfo, process_name_matches, wide_to_string};
pub use reader::{
    AddressingMode, MemoryReader, ProcessProvider, ProcessTarget, ReadMemory, SystemProcesses,
};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader, MockProcesses};
