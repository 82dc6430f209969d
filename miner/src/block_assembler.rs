//! Assembles forge-mined blocks: a coinbase carrying the forge proof and
//! the gold payout, over the transactions selected by the host.

use chain::{Block, BlockHeader, Transaction, TransactionInput, TransactionOutput, merkle_root};
use network::ConsensusParams;
use primitives::bytes::Bytes;
use primitives::compact::Compact;
use primitives::hash::H256;
use script::{Builder, Opcode, Script};
use verification::{ForgeProof, block_subsidy};

/// Version-bits top bits, signalling no deployments.
const BLOCK_VERSION: i32 = 0x20000000;

/// Creates a forge-mined block on top of `prev_hash`. The coinbase pays
/// the subsidy and the given fees to the gold script; hammer creations
/// must not be among the transactions.
pub fn create_forge_block(
	prev_hash: H256,
	height: u32,
	time: u32,
	bits: Compact,
	proof: &ForgeProof,
	gold_script: Script,
	transactions: Vec<Transaction>,
	fees: u64,
	witness_commitment: Option<Bytes>,
	consensus: &ConsensusParams,
) -> Block {
	let mut outputs = vec![
		// the proof itself carries no value
		TransactionOutput {
			value: 0,
			script_pubkey: proof.to_script().into(),
		},
		TransactionOutput {
			value: block_subsidy(height, consensus) + fees,
			script_pubkey: gold_script.into(),
		},
	];
	if let Some(commitment) = witness_commitment {
		outputs.push(TransactionOutput {
			value: 0,
			script_pubkey: commitment,
		});
	}

	let coinbase = Transaction {
		version: 1,
		inputs: vec![TransactionInput::coinbase(
			Builder::default()
				.push_num(height as i64)
				.push_opcode(Opcode::OP_0)
				.into_bytes()
		)],
		outputs: outputs,
		lock_time: 0,
	};

	let mut block_transactions = vec![coinbase];
	block_transactions.extend(transactions);

	let hashes = block_transactions.iter().map(Transaction::hash).collect::<Vec<_>>();
	let header = BlockHeader {
		version: BLOCK_VERSION,
		previous_header_hash: prev_hash,
		merkle_root_hash: merkle_root(&hashes),
		time: time,
		bits: bits,
		nonce: consensus.forge_nonce_marker,
	};

	Block::new(header, block_transactions)
}

#[cfg(test)]
mod tests {
	use chain::Transaction;
	use keys::AddressHash;
	use network::{ConsensusParams, Network};
	use primitives::compact::Compact;
	use primitives::hash::{H256, H520};
	use script::Builder;
	use verification::{ForgeProof, block_subsidy};
	use super::create_forge_block;

	fn proof() -> ForgeProof {
		ForgeProof {
			hammer_nonce: 3,
			bct_height: 42,
			community_contrib: false,
			txid: H256::from([7u8; 32]),
			signature: H520::from([1u8; 65]).into(),
		}
	}

	#[test]
	fn test_forge_block_structure() {
		let consensus = ConsensusParams::new(Network::Regtest);
		let gold: AddressHash = "2222222222222222222222222222222222222222".into();
		let prev = H256::from([9u8; 32]);

		let block = create_forge_block(
			prev.clone(), 100, 1_000_500, Compact::new(0x2100ffff),
			&proof(), Builder::build_p2pkh(&gold), vec![], 1_500, None, &consensus,
		);

		assert_eq!(block.header().previous_header_hash, prev);
		assert_eq!(block.header().nonce, consensus.forge_nonce_marker);
		assert_eq!(block.transactions.len(), 1);

		let coinbase = &block.transactions[0];
		assert!(coinbase.is_coinbase());
		assert_eq!(coinbase.outputs.len(), 2);
		assert_eq!(coinbase.outputs[0].value, 0);
		assert_eq!(ForgeProof::from_script(&coinbase.outputs[0].script_pubkey).unwrap(), proof());
		assert_eq!(coinbase.outputs[1].value, block_subsidy(100, &consensus) + 1_500);

		// the header commits to the coinbase
		assert_eq!(block.header().merkle_root_hash, block.merkle_root());
	}

	#[test]
	fn test_forge_block_witness_commitment_output() {
		let consensus = ConsensusParams::new(Network::Regtest);
		let gold: AddressHash = "2222222222222222222222222222222222222222".into();

		let block = create_forge_block(
			H256::from([9u8; 32]), 100, 1_000_500, Compact::new(0x2100ffff),
			&proof(), Builder::build_p2pkh(&gold), vec![], 0,
			Some("6a24aa21a9ed".into()), &consensus,
		);

		let coinbase = &block.transactions[0];
		assert_eq!(coinbase.outputs.len(), 3);
		assert_eq!(coinbase.outputs[2].value, 0);
	}
}
