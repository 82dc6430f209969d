use chain::{Block, OutPoint};
use bytes::Bytes;
use hash::H256;

/// Unspent transaction output, as seen by the UTXO view.
#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
	/// Output value.
	pub value: u64,
	/// Height of the block the containing transaction was confirmed in.
	pub height: u32,
	/// Output script.
	pub script_pubkey: Bytes,
}

/// Full block storage interface; owned by the host node.
pub trait BlockProvider {
	/// Resolves a confirmed block by hash.
	fn block(&self, hash: &H256) -> Option<Block>;
}

/// UTXO set view; owned by the host node.
pub trait CoinProvider {
	/// Resolves an unspent coin by outpoint.
	fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;
}
