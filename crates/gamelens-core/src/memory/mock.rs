//! In-memory stand-in for a foreign process, used by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use bytemuck::Pod;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::memory::layout::natives::StdWString;

const ARENA_BASE: u64 = 0x1000_0000;
const ALIGNMENT: usize = 16;
const TAIL_PADDING: usize = 4096;

/// Lays out a contiguous arena of synthetic memory
#[derive(Default)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `bytes` into the arena and return their address
    pub fn alloc(&mut self, bytes: &[u8]) -> u64 {
        let offset = self.data.len().next_multiple_of(ALIGNMENT);
        self.data.resize(offset, 0);
        self.data.extend_from_slice(bytes);
        ARENA_BASE + offset as u64
    }

    /// Reserve `size` zeroed bytes and return their address
    pub fn reserve(&mut self, size: usize) -> u64 {
        self.alloc(&vec![0u8; size])
    }

    pub fn alloc_pod<T: Pod>(&mut self, value: &T) -> u64 {
        self.alloc(bytemuck::bytes_of(value))
    }

    /// Encode `text` as a wide string descriptor, inline when it fits
    pub fn wide_string(&mut self, text: &str) -> StdWString {
        let units: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let length = (units.len() / 2) as i64;
        if length == 0 {
            return StdWString::default();
        }
        if length <= 7 {
            let mut inline = [0u8; 16];
            inline[..units.len()].copy_from_slice(&units);
            let (buffer, reserved) = inline.split_at(8);
            StdWString {
                buffer: u64::from_le_bytes(buffer.try_into().unwrap_or_default()),
                reserved_bytes: u64::from_le_bytes(reserved.try_into().unwrap_or_default()),
                length,
                capacity: 7,
            }
        } else {
            StdWString {
                buffer: self.alloc(&units),
                reserved_bytes: 0,
                length,
                capacity: length.max(15),
            }
        }
    }

    /// NUL-terminated UTF-16 string as read by the heuristic decoder
    pub fn alloc_unicode(&mut self, text: &str) -> u64 {
        let mut bytes: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        bytes.extend_from_slice(&[0; 4]);
        self.alloc(&bytes)
    }

    /// Overwrite previously allocated bytes
    pub fn write(&mut self, address: u64, bytes: &[u8]) {
        let offset = (address - ARENA_BASE) as usize;
        let end = offset + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
    }

    pub fn write_pod<T: Pod>(&mut self, address: u64, value: &T) {
        self.write(address, bytemuck::bytes_of(value));
    }

    pub fn build(mut self) -> MockMemoryReader {
        self.data.resize(self.data.len() + TAIL_PADDING, 0);
        MockMemoryReader {
            data: Arc::new(RwLock::new(self.data)),
            reads: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Serves reads from the arena; reads past its end are truncated.
///
/// Clones share the arena, so a patch is visible through every clone.
#[derive(Clone)]
pub struct MockMemoryReader {
    data: Arc<RwLock<Vec<u8>>>,
    reads: Arc<Mutex<HashMap<u64, usize>>>,
}

impl MockMemoryReader {
    /// Number of reads that started exactly at `address`
    pub fn read_count(&self, address: u64) -> usize {
        self.reads
            .lock()
            .map(|reads| reads.get(&address).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Overwrite arena bytes after the reader was built
    pub fn patch(&self, address: u64, bytes: &[u8]) {
        let offset = (address - ARENA_BASE) as usize;
        if let Ok(mut data) = self.data.write() {
            data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
    }

    pub fn patch_pod<T: Pod>(&self, address: u64, value: &T) {
        self.patch(address, bytemuck::bytes_of(value));
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads.entry(address).or_insert(0) += 1;
        }

        let data = self.data.read().map_err(|_| Error::MemoryReadFailed {
            address,
            message: "arena lock poisoned".to_string(),
        })?;
        let end = ARENA_BASE + data.len() as u64;
        if address < ARENA_BASE || address >= end {
            return Err(Error::MemoryReadFailed {
                address,
                message: "address is not mapped".to_string(),
            });
        }

        let offset = (address - ARENA_BASE) as usize;
        let available = (data.len() - offset).min(size);
        Ok(data[offset..offset + available].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NativeRead;

    #[test]
    fn test_alloc_is_aligned() {
        let mut builder = MockMemoryBuilder::new();
        let a = builder.alloc(&[1, 2, 3]);
        let b = builder.alloc(&[4]);
        assert_eq!(a, ARENA_BASE);
        assert_eq!(b, ARENA_BASE + 16);
    }

    #[test]
    fn test_reads_and_counts() {
        let mut builder = MockMemoryBuilder::new();
        let addr = builder.alloc(&42u32.to_le_bytes());
        let reader = builder.build();

        assert_eq!(reader.try_read_value::<u32>(addr), Some(42));
        assert_eq!(reader.read_count(addr), 1);
        assert!(reader.read_bytes(0x10, 4).is_err());
    }

    #[test]
    fn test_truncated_read() {
        let mut builder = MockMemoryBuilder::new();
        let addr = builder.alloc(&[7u8; 8]);
        let reader = builder.build();

        let bytes = reader.read_bytes(addr, 8 + TAIL_PADDING + 100).unwrap();
        assert_eq!(bytes.len(), 8 + TAIL_PADDING);
        assert!(reader.read_array::<u8>(addr, 8 + TAIL_PADDING + 100).is_empty());
    }

    #[test]
    fn test_patch_is_shared_by_clones() {
        let mut builder = MockMemoryBuilder::new();
        let addr = builder.alloc(&1u32.to_le_bytes());
        let reader = builder.build();
        let other = reader.clone();

        reader.patch_pod(addr, &9u32);
        assert_eq!(other.read_value::<u32>(addr), 9);
    }
}
