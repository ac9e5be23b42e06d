//! Defensive decoders for native container layouts.
//!
//! Every decoder fails soft: an invalid descriptor, a zero address or a
//! truncated read produces an empty or zeroed result and a log line. Only the
//! layout records in [`super::layout`] are read verbatim.

use std::collections::HashSet;

use bytemuck::Pod;
use encoding_rs::{UTF_16LE, WINDOWS_1252};
use tracing::{debug, trace, warn};

use super::ReadMemory;
use super::layout::natives::{
    BUCKET_EMPTY_FLAG, BUCKET_SLOT_WIDTH, LIST_NODE_DATA_OFFSET, MAP_NODE_DATA_OFFSET, StdBucket,
    StdList, StdListNodeHeader, StdMap, StdMapNodeHeader, StdVector, StdWString,
    WSTRING_INLINE_CAPACITY,
};

/// Largest tree map that will be traversed
pub const MAX_MAP_SIZE: i64 = 10_000;
/// Longest wide string (in UTF-16 units) that will be decoded
pub const MAX_WIDE_STRING_LENGTH: i64 = 1000;
/// Bytes read for a NUL-terminated narrow string
pub const NARROW_STRING_READ_SIZE: usize = 128;
/// Bytes read for a heuristically terminated UTF-16 string
pub const UNICODE_STRING_READ_SIZE: usize = 256;
/// Largest single read a decoder will issue
pub const MAX_READ_SIZE: usize = 64 * 1024 * 1024;

/// Extra nodes a traversal may visit beyond the declared size before it is
/// considered corrupt
const TRAVERSAL_SLACK: i64 = 5;

/// Zero and addresses with the sign bit set are never dereferenced
pub fn is_valid_address(address: u64) -> bool {
    address != 0 && (address as i64) > 0
}

/// Typed, fail-soft reads on top of [`ReadMemory`]
pub trait NativeRead: ReadMemory {
    /// Read one `T`, or `None` on an invalid address or truncated read
    fn try_read_value<T: Pod>(&self, address: u64) -> Option<T> {
        if !is_valid_address(address) {
            trace!("Skipping read of {} at {:#x}", std::any::type_name::<T>(), address);
            return None;
        }
        let size = std::mem::size_of::<T>();
        match self.read_bytes(address, size) {
            Ok(bytes) if bytes.len() == size => bytemuck::try_pod_read_unaligned(&bytes).ok(),
            Ok(bytes) => {
                debug!(
                    "Truncated read at {:#x}: {} of {} bytes",
                    address,
                    bytes.len(),
                    size
                );
                None
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    /// Read one `T`, zeroed on failure
    fn read_value<T: Pod>(&self, address: u64) -> T {
        self.try_read_value(address).unwrap_or_else(T::zeroed)
    }

    /// Read `count` consecutive `T`s; empty on failure or truncation
    fn read_array<T: Pod>(&self, address: u64, count: usize) -> Vec<T> {
        if !is_valid_address(address) || count == 0 {
            return Vec::new();
        }
        let element_size = std::mem::size_of::<T>();
        let Some(total) = element_size.checked_mul(count) else {
            debug!("Array of {} elements at {:#x} overflows", count, address);
            return Vec::new();
        };
        if total > MAX_READ_SIZE {
            warn!(
                "Refusing to read {} bytes at {:#x}, ceiling is {}",
                total, address, MAX_READ_SIZE
            );
            return Vec::new();
        }
        let bytes = match self.read_bytes(address, total) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("{}", e);
                return Vec::new();
            }
        };
        if bytes.len() < total {
            debug!(
                "Number of bytes read {} is less than requested {} at {:#x}",
                bytes.len(),
                total,
                address
            );
            return Vec::new();
        }
        bytes
            .chunks_exact(element_size.max(1))
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    fn read_std_vector<T: Pod>(&self, vector: &StdVector) -> Vec<T> {
        let element_size = std::mem::size_of::<T>() as i64;
        let length = (vector.last as i64).wrapping_sub(vector.first as i64);
        if element_size == 0 || length <= 0 || length % element_size != 0 {
            return Vec::new();
        }
        self.read_array(vector.first, (length / element_size) as usize)
    }

    fn read_wide_string(&self, string: &StdWString) -> String {
        if string.length <= 0
            || string.length > MAX_WIDE_STRING_LENGTH
            || string.capacity <= 0
            || string.capacity > MAX_WIDE_STRING_LENGTH
        {
            return String::new();
        }

        if string.capacity <= WSTRING_INLINE_CAPACITY {
            let mut inline = [0u8; 16];
            inline[..8].copy_from_slice(&string.buffer.to_le_bytes());
            inline[8..].copy_from_slice(&string.reserved_bytes.to_le_bytes());
            let (decoded, _) = UTF_16LE.decode_without_bom_handling(&inline);
            return decoded.chars().take(string.length as usize).collect();
        }

        let bytes: Vec<u8> = self.read_array(string.buffer, string.length as usize * 2);
        let (decoded, _) = UTF_16LE.decode_without_bom_handling(&bytes);
        decoded.into_owned()
    }

    /// NUL-terminated single-byte string of at most 128 bytes
    fn read_narrow_string(&self, address: u64) -> String {
        let bytes: Vec<u8> = self.read_array(address, NARROW_STRING_READ_SIZE);
        match memchr::memchr(0, &bytes) {
            Some(end) if end > 0 => {
                let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes[..end]);
                decoded.into_owned()
            }
            _ => String::new(),
        }
    }

    /// UTF-16 string terminated by the first run of three zero bytes
    fn read_heuristic_unicode_string(&self, address: u64) -> String {
        let bytes: Vec<u8> = self.read_array(address, UNICODE_STRING_READ_SIZE);
        let mut count = 0;
        for i in 0..bytes.len().saturating_sub(2) {
            if bytes[i] == 0 && bytes[i + 1] == 0 && bytes[i + 2] == 0 {
                count = if i % 2 == 0 { i } else { i + 1 };
                break;
            }
        }
        if count == 0 {
            return String::new();
        }
        let (decoded, _) = UTF_16LE.decode_without_bom_handling(&bytes[..count]);
        decoded.into_owned()
    }

    /// Flatten a red-black tree map into `(key, value)` pairs.
    ///
    /// Traversal starts at the sentinel's parent (the real root) and uses an
    /// explicit stack. It stops with a partial result once more than
    /// `size + 5` nodes were visited, and never yields more than `size` pairs.
    fn read_std_map_as_list<K: Pod, V: Pod>(
        &self,
        map: &StdMap,
        key_filter: Option<&dyn Fn(&K) -> bool>,
    ) -> Vec<(K, V)> {
        let mut collection = Vec::new();
        if map.size <= 0 || map.size > MAX_MAP_SIZE {
            return collection;
        }

        let head: StdMapNodeHeader = self.read_value(map.head);
        if !is_valid_address(head.parent) {
            return collection;
        }

        let key_offset = MAP_NODE_DATA_OFFSET;
        let value_offset = (MAP_NODE_DATA_OFFSET + std::mem::size_of::<K>() as u64)
            .next_multiple_of(std::mem::align_of::<V>() as u64);
        let limit = map.size as usize;

        let mut stack = vec![head.parent];
        let mut visited: i64 = 0;
        while let Some(address) = stack.pop() {
            visited += 1;
            if visited > map.size + TRAVERSAL_SLACK {
                warn!(
                    "Map at {:#x} exceeded {} nodes, returning partial result",
                    map.head,
                    map.size + TRAVERSAL_SLACK
                );
                break;
            }

            let Some(node) = self.try_read_value::<StdMapNodeHeader>(address) else {
                continue;
            };
            if node.is_nil != 0 {
                continue;
            }

            if collection.len() < limit {
                let key: K = self.read_value(address + key_offset);
                if key_filter.is_none_or(|filter| filter(&key)) {
                    let value: V = self.read_value(address + value_offset);
                    collection.push((key, value));
                }
            }

            for child in [node.left, node.right] {
                if is_valid_address(child) && child != map.head {
                    stack.push(child);
                }
            }
        }

        collection
    }

    /// Follow `next` links from the sentinel until back at the head
    fn read_std_list<T: Pod>(&self, list: &StdList) -> Vec<T> {
        let mut values = Vec::new();
        let head: StdListNodeHeader = self.read_value(list.head);
        let limit = list.size.max(0) + TRAVERSAL_SLACK;

        let mut current = head.next;
        while current != list.head {
            if current == 0 {
                warn!(
                    "Stopped reading list at {:#x} on a null next pointer; expected after the game closes",
                    list.head
                );
                break;
            }
            if values.len() as i64 >= limit {
                warn!("List at {:#x} exceeded {} nodes", list.head, limit);
                break;
            }
            let Some(node) = self.try_read_value::<StdListNodeHeader>(current) else {
                break;
            };
            values.push(self.read_value(current + LIST_NODE_DATA_OFFSET));
            current = node.next;
        }
        values
    }

    /// Payloads of every occupied bucket slot
    fn read_std_bucket<T: Pod>(&self, bucket: &StdBucket) -> Vec<T> {
        if bucket.data == 0 || bucket.capacity <= 0 {
            return Vec::new();
        }
        let Some(slots) = bucket
            .capacity
            .checked_add(1)
            .map(|count| (count / BUCKET_SLOT_WIDTH as i64) as usize)
        else {
            debug!("Bucket capacity {} at {:#x} overflows", bucket.capacity, bucket.data);
            return Vec::new();
        };
        let payload_size = std::mem::size_of::<T>();
        let slot_size = BUCKET_SLOT_WIDTH + BUCKET_SLOT_WIDTH * payload_size;
        let Some(total) = slots.checked_mul(slot_size) else {
            debug!("Bucket of {} slots at {:#x} overflows", slots, bucket.data);
            return Vec::new();
        };

        let bytes: Vec<u8> = self.read_array(bucket.data, total);
        let mut values = Vec::new();
        for slot in bytes.chunks_exact(slot_size) {
            let (flags, payloads) = slot.split_at(BUCKET_SLOT_WIDTH);
            for (flag, payload) in flags.iter().zip(payloads.chunks_exact(payload_size)) {
                if *flag != BUCKET_EMPTY_FLAG {
                    values.push(bytemuck::pod_read_unaligned(payload));
                }
            }
        }
        values
    }

    /// Read a pointer table and return the distinct non-zero entries in order
    fn read_unique_pointers(&self, vector: &StdVector) -> Vec<u64> {
        let mut seen = HashSet::new();
        self.read_std_vector::<u64>(vector)
            .into_iter()
            .filter(|&ptr| ptr != 0 && seen.insert(ptr))
            .collect()
    }
}

impl<R: ReadMemory + ?Sized> NativeRead for R {}
