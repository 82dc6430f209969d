pub extern crate bigint;
pub extern crate rustc_hex as hex;

pub mod bytes;
pub mod compact;
pub mod hash;

pub use compact::Compact;
