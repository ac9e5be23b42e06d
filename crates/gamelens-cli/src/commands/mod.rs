//! CLI command implementations.

pub mod dump;
pub mod hex_utils;
pub mod hexdump;
pub mod watch;
