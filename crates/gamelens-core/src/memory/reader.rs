use crate::error::{Error, Result};
use crate::memory::{MAX_READ_SIZE, ProcessHandle};

/// Raw read access to the memory of another process.
///
/// `read_bytes` may return fewer bytes than requested when the read runs off
/// the end of a mapped region; callers that need the full span treat that as
/// a truncated read.
pub trait ReadMemory: Send + Sync {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;
}

/// Reads memory of an opened process
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
        if size > MAX_READ_SIZE {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("{} bytes exceeds the read ceiling of {}", size, MAX_READ_SIZE),
            });
        }
        let mut buffer = vec![0u8; size];
        let read = self.process.read_into(address, &mut buffer)?;
        buffer.truncate(read);
        Ok(buffer)
    }
}
