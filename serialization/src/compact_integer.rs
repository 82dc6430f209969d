//! Variable-length integer used throughout Bitcoin serialized structures,
//! see https://bitcoin.org/en/developer-reference#compactsize-unsigned-integers

use std::fmt;
use {
	Serializable, Stream,
	Deserializable, Reader, Error as ReaderError
};

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct CompactInteger(u64);

impl fmt::Display for CompactInteger {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl From<CompactInteger> for usize {
	fn from(i: CompactInteger) -> Self {
		i.0 as usize
	}
}

impl From<CompactInteger> for u64 {
	fn from(i: CompactInteger) -> Self {
		i.0
	}
}

impl From<u8> for CompactInteger {
	fn from(i: u8) -> Self {
		CompactInteger(i as u64)
	}
}

impl From<u16> for CompactInteger {
	fn from(i: u16) -> Self {
		CompactInteger(i as u64)
	}
}

impl From<u32> for CompactInteger {
	fn from(i: u32) -> Self {
		CompactInteger(i as u64)
	}
}

impl From<usize> for CompactInteger {
	fn from(i: usize) -> Self {
		CompactInteger(i as u64)
	}
}

impl From<u64> for CompactInteger {
	fn from(i: u64) -> Self {
		CompactInteger(i)
	}
}

impl Serializable for CompactInteger {
	fn serialize(&self, stream: &mut Stream) {
		match self.0 {
			0..=0xfc => {
				stream.append(&(self.0 as u8));
			},
			0xfd..=0xffff => {
				stream
					.append(&0xfdu8)
					.append(&(self.0 as u16));
			},
			0x10000..=0xffff_ffff => {
				stream
					.append(&0xfeu8)
					.append(&(self.0 as u32));
			},
			_ => {
				stream
					.append(&0xffu8)
					.append(&self.0);
			}
		}
	}
}

impl Deserializable for CompactInteger {
	fn deserialize(reader: &mut Reader) -> Result<Self, ReaderError> {
		let result = match reader.read::<u8>()? {
			i @ 0..=0xfc => i.into(),
			0xfd => reader.read::<u16>()?.into(),
			0xfe => reader.read::<u32>()?.into(),
			_ => reader.read::<u64>()?.into(),
		};

		Ok(result)
	}
}
