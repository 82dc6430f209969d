use crypto;
use hash::H32;

/// Data checksum
#[inline]
pub fn checksum(data: &[u8]) -> H32 {
	crypto::checksum(data)
}
