//! Serialized script, used inside transaction inputs and outputs.

use std::{fmt, ops};
use bytes::Bytes;
use keys::AddressHash;
use Opcode;

/// Serialized script, used inside transaction inputs and outputs.
#[derive(PartialEq, Clone)]
pub struct Script {
	data: Bytes,
}

impl From<&'static str> for Script {
	fn from(s: &'static str) -> Self {
		Script::new(s.into())
	}
}

impl From<Bytes> for Script {
	fn from(s: Bytes) -> Self {
		Script::new(s)
	}
}

impl From<Vec<u8>> for Script {
	fn from(v: Vec<u8>) -> Self {
		Script::new(v.into())
	}
}

impl From<Script> for Bytes {
	fn from(script: Script) -> Self {
		script.data
	}
}

impl Script {
	/// Script constructor.
	pub fn new(data: Bytes) -> Self {
		Script {
			data: data,
		}
	}

	pub fn to_bytes(&self) -> Bytes {
		self.data.clone()
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Extra-fast test for pay-to-public-key-hash (P2PKH) scripts.
	pub fn is_pay_to_public_key_hash(&self) -> bool {
		self.data.len() == 25 &&
			self.data[0] == Opcode::OP_DUP as u8 &&
			self.data[1] == Opcode::OP_HASH160 as u8 &&
			self.data[2] == 20 &&
			self.data[23] == Opcode::OP_EQUALVERIFY as u8 &&
			self.data[24] == Opcode::OP_CHECKSIG as u8
	}

	/// Extracts the destination key hash of a P2PKH script.
	pub fn parse_p2pkh_destination(&self) -> Option<AddressHash> {
		if self.is_pay_to_public_key_hash() {
			Some(AddressHash::from(&self.data[3..23]))
		} else {
			None
		}
	}

	/// Tests whether this is a hammer creation script: the creation-address
	/// P2PKH script followed by `OP_RETURN` and the raw gold script.
	/// Returns the embedded gold script on match.
	pub fn parse_hammer_creation(&self, creation_script: &Script) -> Option<Script> {
		let prefix_len = creation_script.len();
		if self.data.len() <= prefix_len + 1 {
			return None;
		}
		if &self.data[..prefix_len] != &creation_script.data[..] {
			return None;
		}
		if self.data[prefix_len] != Opcode::OP_RETURN as u8 {
			return None;
		}

		Some(Script::new((&self.data[prefix_len + 1..]).into()))
	}
}

impl ops::Deref for Script {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.data
	}
}

impl fmt::Debug for Script {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.data.fmt(f)
	}
}

#[cfg(test)]
mod tests {
	use Builder;
	use super::Script;

	#[test]
	fn test_is_pay_to_public_key_hash() {
		let script: Script = "76a9143b9722f91a2e50d913dadc3a6a137404d690d9a788ac".into();
		assert!(script.is_pay_to_public_key_hash());
		assert_eq!(
			script.parse_p2pkh_destination(),
			Some("3b9722f91a2e50d913dadc3a6a137404d690d9a7".into())
		);

		let truncated: Script = "76a9143b9722f91a2e50d913dadc3a6a137404d690d9a788".into();
		assert!(!truncated.is_pay_to_public_key_hash());
		assert_eq!(truncated.parse_p2pkh_destination(), None);
	}

	#[test]
	fn test_parse_hammer_creation() {
		let creation = Builder::build_p2pkh(&"1111111111111111111111111111111111111111".into());
		let gold = Builder::build_p2pkh(&"2222222222222222222222222222222222222222".into());

		let bct_script = Builder::default()
			.append_slice(&creation)
			.push_opcode(::Opcode::OP_RETURN)
			.append_slice(&gold)
			.into_script();

		let embedded = bct_script.parse_hammer_creation(&creation).unwrap();
		assert_eq!(embedded, gold);
		assert_eq!(
			embedded.parse_p2pkh_destination(),
			Some("2222222222222222222222222222222222222222".into())
		);

		// plain payment to the creation address is not a hammer creation
		assert!(creation.parse_hammer_creation(&creation).is_none());
		// wrong prefix
		assert!(bct_script.parse_hammer_creation(&gold).is_none());
	}
}
