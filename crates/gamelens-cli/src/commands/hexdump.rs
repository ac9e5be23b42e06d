//! Raw bytes at an address in hexdump layout.
//!
//! ```text
//! 0x000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use anyhow::Result;
use gamelens_core::{Config, ReadMemory};

use super::hex_utils::format_line;

pub fn run(config: &Config, pid: Option<u32>, address: u64, size: usize, ascii: bool) -> Result<()> {
    let reader = crate::open_reader(config, pid)?;
    let bytes = reader.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} of {} bytes):", address, bytes.len(), size);
    println!();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        println!("{}", format_line(i * 16, chunk, ascii));
    }
    Ok(())
}
