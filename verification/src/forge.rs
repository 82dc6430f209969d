//! Forge proof: the coinbase-embedded proof of hammer possession, its
//! deterministic per-tip randomness, and full forge block validation.

use std::str;
use byteorder::{ByteOrder, LittleEndian};
use chain::{Block, OutPoint, Transaction};
use crypto::dhash256;
use keys::{AddressHash, CompactSignature, Message, Public};
use network::ConsensusParams;
use primitives::bigint::U256;
use primitives::hash::{H256, H520};
use script::{Builder, Opcode, Script};
use ser::Stream;
use storage::{BlockIndex, BlockProvider, CoinProvider, EntryId};
use deployments::{Deployments, ForgeVersion};
use error::ForgeError;
use forge_work::forge_work_required;
use hammer::{creation_script, community_script, hammer_cost, parse_bct};

/// Exact size of an encoded forge proof script.
pub const FORGE_PROOF_SCRIPT_SIZE: usize = 144;

/// The proof embedded in `vout[0]` of a forge-mined coinbase.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeProof {
	/// Index of the solving hammer within its creation.
	pub hammer_nonce: u32,
	/// Height the hammer creation claims to be confirmed at.
	pub bct_height: u32,
	/// Whether the creation paid the optional community contribution.
	pub community_contrib: bool,
	/// Transaction id of the hammer creation.
	pub txid: H256,
	/// Recoverable signature over the deterministic message by the gold
	/// address key.
	pub signature: CompactSignature,
}

impl ForgeProof {
	/// Encodes the proof into its coinbase script.
	pub fn to_script(&self) -> Script {
		let mut nonce = [0u8; 4];
		LittleEndian::write_u32(&mut nonce, self.hammer_nonce);
		let mut height = [0u8; 4];
		LittleEndian::write_u32(&mut height, self.bct_height);

		Builder::default()
			.push_opcode(Opcode::OP_RETURN)
			.push_opcode(Opcode::OP_HAMMER)
			.push_bytes(&nonce)
			.push_bytes(&height)
			.push_bool(self.community_contrib)
			.push_bytes(self.txid.to_reversed_str().as_bytes())
			.push_bytes(&*self.signature)
			.into_script()
	}

	/// Decodes a proof from a coinbase script, checking the layout
	/// byte-exactly.
	pub fn from_script(script: &[u8]) -> Result<ForgeProof, ForgeError> {
		if script.len() < FORGE_PROOF_SCRIPT_SIZE {
			return Err(ForgeError::Structural("proof script is too short"));
		}
		if script[0] != Opcode::OP_RETURN as u8 || script[1] != Opcode::OP_HAMMER as u8 {
			return Err(ForgeError::Structural("proof script prefix mismatch"));
		}

		if script[2] != 4 {
			return Err(ForgeError::Structural("bad hammer nonce size marker"));
		}
		let hammer_nonce = LittleEndian::read_u32(&script[3..7]);

		if script[7] != 4 {
			return Err(ForgeError::Structural("bad creation height size marker"));
		}
		let bct_height = LittleEndian::read_u32(&script[8..12]);

		let community_contrib = if script[12] == Opcode::OP_1 as u8 {
			true
		} else if script[12] == Opcode::OP_0 as u8 {
			false
		} else {
			return Err(ForgeError::Structural("bad community contribution flag"));
		};

		if script[13] != 64 {
			return Err(ForgeError::Structural("bad txid size marker"));
		}
		let txid_hex = str::from_utf8(&script[14..78])
			.map_err(|_| ForgeError::Structural("txid field is not ascii"))?;
		let txid = txid_hex.parse::<H256>()
			.map_err(|_| ForgeError::Structural("txid field is not valid hex"))?
			.reversed();

		if script[78] != 65 {
			return Err(ForgeError::Structural("bad signature size marker"));
		}
		let signature = CompactSignature::from(H520::from(&script[79..144]));

		Ok(ForgeProof {
			hammer_nonce: hammer_nonce,
			bct_height: bct_height,
			community_contrib: community_contrib,
			txid: txid,
			signature: signature,
		})
	}
}

/// Deterministic per-tip randomness: a hex digest derived from the parent
/// block hash, binding hammer hashes and proof signatures to a specific
/// parent.
pub fn deterministic_rand_string(prev_hash: &H256) -> String {
	let mut stream = Stream::default();
	stream.append(&prev_hash.to_reversed_str());
	dhash256(&stream.out()).to_reversed_str()
}

/// The message a forge proof signs: the hash of the deterministic
/// randomness.
pub fn forge_message(det_rand: &str) -> Message {
	let mut stream = Stream::default();
	stream.append(&det_rand);
	dhash256(&stream.out())
}

/// Hash of one hammer under the deterministic randomness, compared
/// against the forge target as a 256-bit integer.
pub fn hammer_hash(det_rand: &str, txid_hex: &str, hammer_nonce: u32) -> U256 {
	let mut stream = Stream::default();
	stream
		.append(&det_rand)
		.append(&txid_hex)
		.append(&hammer_nonce);
	let digest = dhash256(&stream.out());
	U256::from(&*digest.reversed() as &[u8])
}

/// Enforces the forge/PoW interleaving rules for a forge block whose
/// parent is `prev`.
pub fn check_interleaving(index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams, version: ForgeVersion) -> Result<(), ForgeError> {
	if version >= ForgeVersion::V11 {
		// from 1.1: a bounded run of consecutive forge blocks
		let mut forge_blocks_at_tip = 0;
		let mut walk = prev;
		while index.entry(walk).forge_mined {
			forge_blocks_at_tip += 1;
			walk = index.entry(walk).prev.expect("genesis is never forge-mined; qed");
		}

		if forge_blocks_at_tip >= consensus.max_consecutive_forge_blocks {
			return Err(ForgeError::Interleaving("too many forge-mined blocks without a PoW block"));
		}
	} else if index.entry(prev).forge_mined {
		return Err(ForgeError::Interleaving("forge-mined block must follow a PoW block"));
	}

	Ok(())
}

/// Resolves the hammer creation by drilling into the canonical block at
/// the claimed height. Used when the UTXO set cannot serve the outpoint,
/// e.g. while reindexing.
fn drill_transaction(index: &BlockIndex, prev: EntryId, blocks: &dyn BlockProvider, claimed_height: u32, txid: &H256) -> Option<Transaction> {
	if claimed_height > index.entry(prev).height {
		return None;
	}

	let at = index.ancestor(prev, claimed_height)?;
	let block = blocks.block(&index.entry(at).hash)?;
	block.transactions.into_iter().find(|tx| tx.hash() == *txid)
}

fn donation_output_value(tx: &Transaction, community: &Script) -> Result<u64, ForgeError> {
	if tx.outputs.len() < 2 || &tx.outputs[1].script_pubkey[..] != &**community {
		return Err(ForgeError::Donation("community contribution indicated but not found"));
	}

	Ok(tx.outputs[1].value)
}

/// Validates a forge-mined block on top of `prev`. The UTXO view and the
/// block store are the only external capabilities used.
pub fn verify_forge_block(
	block: &Block,
	prev: EntryId,
	index: &BlockIndex,
	consensus: &ConsensusParams,
	deployments: &Deployments,
	coins: &dyn CoinProvider,
	blocks: &dyn BlockProvider,
) -> Result<(), ForgeError> {
	let height = index.entry(prev).height + 1;

	// forge must be active at the parent
	let version = deployments.forge_version(index, prev, consensus)
		.ok_or(ForgeError::Activation)?;

	check_interleaving(index, prev, consensus, version)?;

	// forge-mined blocks must not carry hammer creations
	let creation = creation_script(consensus);
	if block.transactions.iter().skip(1).any(|tx| parse_bct(tx, &creation).is_some()) {
		return Err(ForgeError::Bct("forge-mined block contains hammer creations"));
	}

	// coinbase layout
	let coinbase = match block.transactions.first() {
		Some(tx) if tx.is_coinbase() => tx,
		_ => return Err(ForgeError::Structural("first transaction is not a coinbase")),
	};
	if coinbase.outputs.len() < 2 || coinbase.outputs.len() > 3 {
		return Err(ForgeError::Structural("forge coinbase must have two or three outputs"));
	}

	let proof = ForgeProof::from_script(&coinbase.outputs[0].script_pubkey)?;
	trace!(target: "forge", "checking forge proof at height {}: hammer #{} of creation {}",
		height, proof.hammer_nonce, proof.txid.to_reversed_str());

	// the hammer hash must meet the current forge target
	let det_rand = deterministic_rand_string(&index.entry(prev).hash);
	let target = forge_work_required(index, prev, consensus, version).to_u256()
		.map_err(|_| ForgeError::Proof("forge target is malformed"))?;
	let txid_hex = proof.txid.to_reversed_str();
	if hammer_hash(&det_rand, &txid_hex, proof.hammer_nonce) >= target {
		return Err(ForgeError::Proof("hammer hash does not meet the forge target"));
	}

	// the gold output must be a key-hash payment to the proof signer
	let gold: AddressHash = Script::new(coinbase.outputs[1].script_pubkey.clone())
		.parse_p2pkh_destination()
		.ok_or(ForgeError::Structural("gold output is not a key-hash payment"))?;
	let message = forge_message(&det_rand);
	let signer = Public::recover_compact(&message, &proof.signature)
		.map_err(|_| ForgeError::Proof("cannot recover the proof signer"))?;
	if signer.address_hash() != gold {
		return Err(ForgeError::Proof("proof signer does not match the gold destination"));
	}

	// locate the hammer creation: the UTXO set serves incoming blocks;
	// the block store drill covers reindexing
	let creation_out = OutPoint { hash: proof.txid.clone(), index: 0 };
	let mut drilled_tx = None;
	let (bct_found_height, mut bct_value, bct_script) = match coins.coin(&creation_out) {
		Some(coin) => (coin.height, coin.value, Script::new(coin.script_pubkey)),
		None => {
			trace!(target: "forge", "creation outpoint not in the UTXO set, drilling block at {}", proof.bct_height);
			let tx = drill_transaction(index, prev, blocks, proof.bct_height, &proof.txid)
				.ok_or(ForgeError::DataUnavailable)?;
			let output = match tx.outputs.first() {
				Some(output) => (output.value, Script::new(output.script_pubkey.clone())),
				None => return Err(ForgeError::Bct("hammer creation has no outputs")),
			};
			drilled_tx = Some(tx);
			(proof.bct_height, output.0, output.1)
		},
	};

	if proof.community_contrib {
		let community = community_script(consensus);
		let donation_out = OutPoint { hash: proof.txid.clone(), index: 1 };
		let donation = if let Some(ref tx) = drilled_tx {
			donation_output_value(tx, &community)?
		} else if let Some(coin) = coins.coin(&donation_out) {
			if &coin.script_pubkey[..] != &*community {
				return Err(ForgeError::Donation("community contribution indicated but not found"));
			}
			coin.value
		} else {
			let tx = drill_transaction(index, prev, blocks, proof.bct_height, &proof.txid)
				.ok_or(ForgeError::DataUnavailable)?;
			donation_output_value(&tx, &community)?
		};

		let expected = (bct_value + donation) / consensus.community_contrib_factor;
		if donation != expected {
			return Err(ForgeError::Donation("community contribution pays a wrong amount"));
		}
		bct_value += donation;
	}

	if bct_found_height != proof.bct_height {
		return Err(ForgeError::Proof("claimed creation height does not match the found height"));
	}

	// hammer maturity window
	let depth = height.checked_sub(bct_found_height)
		.ok_or(ForgeError::Maturity("hammer creation has not matured yet"))?;
	if depth < consensus.hammer_gestation_blocks {
		return Err(ForgeError::Maturity("hammer creation has not matured yet"));
	}
	if depth > consensus.hammer_total_lifespan() {
		return Err(ForgeError::Maturity("hammer creation is too old"));
	}

	// the referenced output must be a hammer creation paying the same
	// gold destination
	let embedded_gold = bct_script.parse_hammer_creation(&creation)
		.ok_or(ForgeError::Bct("referenced output is not a hammer creation script"))?;
	if embedded_gold.parse_p2pkh_destination() != Some(gold) {
		return Err(ForgeError::Proof("hammer creation pays a different gold destination"));
	}

	// the creation must cover the claimed hammer index
	let cost = hammer_cost(bct_found_height, consensus);
	if bct_value < consensus.min_hammer_cost {
		return Err(ForgeError::Bct("creation fee is below the minimum hammer cost"));
	}
	if bct_value < cost {
		return Err(ForgeError::Bct("creation fee cannot afford a single hammer"));
	}
	let hammer_count = bct_value / cost;
	if proof.hammer_nonce as u64 >= hammer_count {
		return Err(ForgeError::Bct("creation did not produce enough hammers for the claimed nonce"));
	}

	trace!(target: "forge", "forge proof accepted at height {}", height);
	Ok(())
}
