//! Hex address parsing.

use anyhow::Result;

/// Parse a hex address with or without a `0x` prefix
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// One hexdump line: offset, 16 hex columns split in two, optional ASCII
pub fn format_line(offset: usize, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:03X}: ", offset);
    for j in 0..16 {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }
    if ascii {
        line.push_str(" |");
        for j in 0..16 {
            line.push(match chunk.get(j) {
                Some(byte) if (0x20..0x7F).contains(byte) => *byte as char,
                Some(_) => '.',
                None => ' ',
            });
        }
        line.push('|');
    }
    line
}
