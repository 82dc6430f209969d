//! Forgecoin networks.

use primitives::bigint::U256;
use primitives::compact::Compact;

lazy_static! {
	static ref MAX_BITS_MAINNET: U256 = "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".parse()
		.expect("hardcoded value should parse without errors");
	static ref MAX_BITS_TESTNET: U256 = "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".parse()
		.expect("hardcoded value should parse without errors");
	static ref MAX_BITS_REGTEST: U256 = "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".parse()
		.expect("hardcoded value should parse without errors");
}

/// Forgecoin network
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Network {
	/// The main network, where coins have real economic value.
	Mainnet,
	/// The public test network.
	Testnet,
	/// Local regression-test network.
	Regtest,
	/// Network for unit tests; proof of work difficulty is almost 0.
	Unitest,
}

impl Network {
	pub fn max_bits(&self) -> U256 {
		match *self {
			Network::Mainnet => MAX_BITS_MAINNET.clone(),
			Network::Testnet => MAX_BITS_TESTNET.clone(),
			Network::Regtest => MAX_BITS_REGTEST.clone(),
			Network::Unitest => Compact::max_value().into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use primitives::compact::Compact;
	use super::{Network, MAX_BITS_MAINNET, MAX_BITS_REGTEST};

	#[test]
	fn test_network_max_bits() {
		assert_eq!(Network::Mainnet.max_bits(), *MAX_BITS_MAINNET);
		assert_eq!(Network::Regtest.max_bits(), *MAX_BITS_REGTEST);
		assert_eq!(Network::Unitest.max_bits(), Compact::max_value().into());
	}
}
