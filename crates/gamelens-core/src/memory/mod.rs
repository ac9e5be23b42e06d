pub mod layout;
mod natives;
mod process;
mod reader;

#[cfg(test)]
pub mod mock;

pub use natives::{
    MAX_MAP_SIZE, MAX_READ_SIZE, MAX_WIDE_STRING_LENGTH, NARROW_STRING_READ_SIZE, NativeRead,
    UNICODE_STRING_READ_SIZE, is_valid_address,
};
pub use process::ProcessHandle;
pub use reader::{MemoryReader, ReadMemory};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
