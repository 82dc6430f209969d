//! The hammer model: creation transactions, cost, lifecycle status and
//! the read-only network accounting scan.

use std::cmp;
use chain::Transaction;
use network::ConsensusParams;
use script::{Builder, Script};
use storage::{BlockIndex, BlockProvider, EntryId};
use work::block_subsidy;

/// Lifecycle of a hammer relative to the current tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HammerStatus {
	/// Still gestating; cannot forge yet.
	Created,
	/// Mature; can forge a block.
	Ready,
	/// Lifespan exhausted.
	Dead,
}

/// Cost of a single hammer at the given height.
pub fn hammer_cost(height: u32, consensus: &ConsensusParams) -> u64 {
	cmp::max(consensus.min_hammer_cost, block_subsidy(height, consensus) / consensus.hammer_cost_factor)
}

/// Status of a hammer created at `bct_height`, as seen from `tip_height`.
pub fn hammer_status(bct_height: u32, tip_height: u32, consensus: &ConsensusParams) -> HammerStatus {
	let age = tip_height.saturating_sub(bct_height);
	if age < consensus.hammer_gestation_blocks {
		HammerStatus::Created
	} else if age < consensus.hammer_total_lifespan() {
		HammerStatus::Ready
	} else {
		HammerStatus::Dead
	}
}

/// P2PKH script of the unspendable hammer creation address.
pub fn creation_script(consensus: &ConsensusParams) -> Script {
	Builder::build_p2pkh(&consensus.hammer_creation_address)
}

/// P2PKH script of the community fund address.
pub fn community_script(consensus: &ConsensusParams) -> Script {
	Builder::build_p2pkh(&consensus.forge_community_address)
}

/// A recognised hammer creation output.
#[derive(Debug, PartialEq)]
pub struct BctOutput {
	/// Total hammer fee paid into the creation output.
	pub fee_paid: u64,
	/// The embedded gold script the forged rewards must be paid to.
	pub gold_script: Script,
}

/// Recognises a hammer creation transaction structurally: a non-coinbase
/// transaction whose first output pays the creation script with the gold
/// script appended.
pub fn parse_bct(tx: &Transaction, creation: &Script) -> Option<BctOutput> {
	if tx.is_coinbase() || tx.outputs.is_empty() {
		return None;
	}

	let script = Script::new(tx.outputs[0].script_pubkey.clone());
	let gold_script = script.parse_hammer_creation(creation)?;

	Some(BctOutput {
		fee_paid: tx.outputs[0].value,
		gold_script: gold_script,
	})
}

/// Total fee of a BCT including a valid community contribution; `None`
/// if the donation output exists but pays a wrong amount.
fn bct_total_fee(tx: &Transaction, fee_paid: u64, community: &Script, consensus: &ConsensusParams) -> Option<u64> {
	if tx.outputs.len() > 1 && &tx.outputs[1].script_pubkey[..] == &**community {
		let donation = tx.outputs[1].value;
		let expected = (fee_paid + donation) / consensus.community_contrib_factor;
		if donation != expected {
			return None;
		}
		return Some(fee_paid + donation);
	}

	Some(fee_paid)
}

/// Hammer population at one block age offset from the tip.
#[derive(Debug, Default, Clone, Copy)]
pub struct HammerPopPoint {
	pub created: u64,
	pub ready: u64,
}

/// Aggregate hammer counts over the whole network.
#[derive(Debug, Default)]
pub struct ForgeNetworkInfo {
	pub created_hammers: u64,
	pub created_bcts: u64,
	pub ready_hammers: u64,
	pub ready_bcts: u64,
	/// Rewards all currently-living hammers could earn over their
	/// remaining lifespan.
	pub potential_lifespan_rewards: u64,
	/// Age-indexed population curve, empty unless requested.
	pub population: Vec<HammerPopPoint>,
}

/// Scans the hammer lifespan window below the tip and totals the created
/// and ready hammers on the network. Read-only; returns `None` when the
/// node is still syncing or a required block is not available (pruned or
/// missing), letting the caller decide.
pub fn network_forge_info(
	index: &BlockIndex,
	tip: EntryId,
	consensus: &ConsensusParams,
	blocks: &dyn BlockProvider,
	forge11_active: bool,
	initial_block_download: bool,
	recalc_graph: bool,
) -> Option<ForgeNetworkInfo> {
	if initial_block_download {
		return None;
	}

	let total_lifespan = consensus.hammer_total_lifespan();
	let tip_height = index.entry(tip).height;

	let typical_spacing = if forge11_active {
		consensus.forge_block_spacing_target_typical_11
	} else {
		consensus.forge_block_spacing_target_typical
	};
	let mut info = ForgeNetworkInfo::default();
	info.potential_lifespan_rewards = consensus.hammer_lifespan_blocks as u64
		* block_subsidy(tip_height, consensus) / typical_spacing as u64;
	if recalc_graph {
		info.population = vec![HammerPopPoint::default(); total_lifespan as usize];
	}

	let creation = creation_script(consensus);
	let community = community_script(consensus);

	let mut walk = tip;
	for age in 0..total_lifespan {
		let entry = index.entry(walk);

		// forge-mined blocks cannot contain hammer creations
		if !entry.forge_mined {
			let block = match blocks.block(&entry.hash) {
				Some(block) => block,
				None => {
					warn!(target: "forge", "block {} unavailable; can't calculate network hammer count", entry.hash.to_reversed_str());
					return None;
				},
			};

			let block_height = entry.height;
			let cost = hammer_cost(block_height, consensus);
			for tx in block.transactions() {
				let bct = match parse_bct(tx, &creation) {
					Some(bct) => bct,
					None => continue,
				};
				let total_fee = match bct_total_fee(tx, bct.fee_paid, &community, consensus) {
					Some(fee) => fee,
					None => continue,
				};

				let hammers = total_fee / cost;
				if age < consensus.hammer_gestation_blocks {
					info.created_hammers += hammers;
					info.created_bcts += 1;
				} else {
					info.ready_hammers += hammers;
					info.ready_bcts += 1;
				}

				if recalc_graph {
					let ready_from = block_height + consensus.hammer_gestation_blocks;
					let dies_at = ready_from + consensus.hammer_lifespan_blocks;
					for h in block_height..dies_at {
						if h <= tip_height || h - tip_height >= total_lifespan {
							continue;
						}
						let point = &mut info.population[(h - tip_height) as usize];
						if h < ready_from {
							point.created += hammers;
						} else {
							point.ready += hammers;
						}
					}
				}
			}
		}

		walk = match entry.prev {
			Some(prev) => prev,
			// ran out of blocks; the window is simply shorter
			None => break,
		};
	}

	Some(info)
}
