//! Script builder

use bytes::Bytes;
use keys::AddressHash;
use {Opcode, Script};

/// Script builder
#[derive(Default)]
pub struct Builder {
	data: Bytes,
}

impl Builder {
	/// Builds p2pkh script pubkey
	pub fn build_p2pkh(address: &AddressHash) -> Script {
		Builder::default()
			.push_opcode(Opcode::OP_DUP)
			.push_opcode(Opcode::OP_HASH160)
			.push_bytes(&**address)
			.push_opcode(Opcode::OP_EQUALVERIFY)
			.push_opcode(Opcode::OP_CHECKSIG)
			.into_script()
	}

	/// Pushes opcode to the end of script
	pub fn push_opcode(mut self, opcode: Opcode) -> Self {
		self.data.push(opcode as u8);
		self
	}

	/// Appends a bool push operation to the end of script
	pub fn push_bool(self, value: bool) -> Self {
		if value {
			self.push_opcode(Opcode::OP_1)
		} else {
			self.push_opcode(Opcode::OP_0)
		}
	}

	/// Appends a minimally-encoded number push, as used in coinbase
	/// signature scripts
	pub fn push_num(self, num: i64) -> Self {
		if num == 0 {
			return self.push_opcode(Opcode::OP_0);
		}
		if num > 0 && num <= 16 {
			let mut result = self;
			result.data.push(Opcode::OP_1 as u8 + (num as u8 - 1));
			return result;
		}

		// little-endian with an explicit sign bit in the top byte
		let negative = num < 0;
		let mut abs = num.abs() as u64;
		let mut encoded = Vec::new();
		while abs > 0 {
			encoded.push((abs & 0xff) as u8);
			abs >>= 8;
		}
		if encoded.last().map_or(false, |byte| byte & 0x80 != 0) {
			encoded.push(if negative { 0x80 } else { 0 });
		} else if negative {
			let last = encoded.len() - 1;
			encoded[last] |= 0x80;
		}

		self.push_bytes(&encoded)
	}

	/// Appends a bytes push operation to the end of script;
	/// the push length is encoded as a single opcode byte
	pub fn push_bytes(mut self, bytes: &[u8]) -> Self {
		let len = bytes.len();
		assert!(len >= 1 && len <= 75, "cannot direct-push {} bytes", len);

		self.data.push(len as u8);
		self.data.extend_from_slice(bytes);
		self
	}

	/// Appends raw script bytes without a push opcode
	pub fn append_slice(mut self, data: &[u8]) -> Self {
		self.data.extend_from_slice(data);
		self
	}

	/// Builds final script
	pub fn into_script(self) -> Script {
		Script::new(self.data)
	}

	/// Builds final script bytes
	pub fn into_bytes(self) -> Bytes {
		self.data
	}
}
