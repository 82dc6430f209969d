//! Hash functions used by the consensus core.

extern crate digest;
extern crate sha2;
extern crate ripemd160;
extern crate primitives;

pub use digest::Digest;
use sha2::Sha256;
use ripemd160::Ripemd160;
use primitives::hash::{H32, H160, H256};

/// SHA-256
#[inline]
pub fn sha256(input: &[u8]) -> H256 {
	let mut hasher = Sha256::default();
	hasher.input(input);
	H256::from(hasher.result().as_slice())
}

/// Double SHA-256
#[inline]
pub fn dhash256(input: &[u8]) -> H256 {
	sha256(&*sha256(input))
}

/// SHA-256 followed by RIPEMD-160
#[inline]
pub fn dhash160(input: &[u8]) -> H160 {
	let mut hasher = Ripemd160::default();
	hasher.input(&*sha256(input));
	H160::from(hasher.result().as_slice())
}

/// Data checksum: first four bytes of the double SHA-256 digest
#[inline]
pub fn checksum(data: &[u8]) -> H32 {
	let mut result = H32::default();
	result.copy_from_slice(&dhash256(data)[0..4]);
	result
}
