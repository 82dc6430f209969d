/// Network this key or address belongs to.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Network {
	Mainnet,
	Testnet,
	Regtest,
}
