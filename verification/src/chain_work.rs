//! Per-block chain work: base work from the target, the forge inheritance
//! of the backing PoW block, and the version-dependent `k` multipliers.

use network::ConsensusParams;
use primitives::bigint::U256;
use primitives::compact::Compact;
use storage::{BlockIndex, EntryId};
use forge_work::forge_difficulty;
use ForgeVersion;

/// Expected work to produce a hash at or below the target:
/// 2^256 / (target + 1), computed as (~target / (target + 1)) + 1 since
/// 2^256 does not fit in 256 bits. Zero for a zero or malformed target.
pub fn work_from_target(bits: Compact) -> U256 {
	let target = match bits.to_u256() {
		Ok(target) => target,
		Err(_) => return U256::default(),
	};
	if target.is_zero() {
		return U256::default();
	}

	(!target / (target + U256::one())) + U256::one()
}

/// The forge-block chain-work multiplier: scales linearly with the forge
/// difficulty, reaching `max_k` at `max_forge_diff`.
pub fn forge_k(forge_diff: u64, min_k: u32, max_k: u32, max_forge_diff: u64) -> u32 {
	let clamped = if forge_diff > max_forge_diff { max_forge_diff } else { forge_diff };
	let range = (max_k - min_k) as u64;
	(clamped * range / max_forge_diff) as u32 + min_k
}

/// The PoW-block chain-work multiplier: starts at `max_k_pow` right after
/// a forge block and decays per PoW block since; halved below each forge
/// difficulty split, floored at one.
pub fn pow_k(blocks_since_forge: u32, last_forge_diff: u64, consensus: &ConsensusParams) -> u32 {
	let mut k = consensus.max_k_pow.saturating_sub(blocks_since_forge);
	if last_forge_diff < consensus.pow_split1 {
		k >>= 1;
	}
	if last_forge_diff < consensus.pow_split2 {
		k >>= 1;
	}

	if k < 1 {
		1
	} else {
		k
	}
}

fn mul_saturating(value: U256, factor: u32) -> U256 {
	let (result, overflow) = value.overflowing_mul(U256::from(factor as u64));
	if overflow {
		U256::max_value()
	} else {
		result
	}
}

/// Work contributed by a block with the given bits on top of `prev`.
/// Forge-mined blocks inherit the work of the PoW block backing them;
/// from 1.1 both kinds are additionally scaled by a `k` multiplier.
/// `version` is the forge version in effect for this block, or `None`
/// while Forge is inactive.
pub fn block_work(bits: Compact, forge_mined: bool, prev: Option<EntryId>, index: &BlockIndex, consensus: &ConsensusParams, version: Option<ForgeVersion>) -> U256 {
	let base = work_from_target(bits);
	if base.is_zero() {
		return base;
	}

	if forge_mined {
		let prev = match prev {
			Some(prev) => prev,
			None => return U256::default(),
		};

		// the forge block inherits the work of the most recent PoW block
		let mut walk = prev;
		while index.entry(walk).forge_mined {
			walk = index.entry(walk).prev
				.expect("interleaving rules place a PoW block below every forge block; qed");
		}
		let backing = work_from_target(index.entry(walk).header.bits);
		if backing.is_zero() {
			return U256::default();
		}
		let mut work = base + backing;

		work = match version {
			Some(ForgeVersion::V11) => {
				let diff = forge_difficulty(bits);
				mul_saturating(work, forge_k(diff, consensus.min_k, consensus.max_k, consensus.max_forge_diff))
			},
			Some(ForgeVersion::V12) | Some(ForgeVersion::V13) => {
				let diff = forge_difficulty(bits);
				mul_saturating(work, forge_k(diff, consensus.min_k2, consensus.max_k2, consensus.max_forge_diff))
			},
			_ => work,
		};

		work
	} else {
		match version {
			Some(ForgeVersion::V11) | Some(ForgeVersion::V12) | Some(ForgeVersion::V13) => {
				let prev = match prev {
					Some(prev) => prev,
					None => return base,
				};

				// look back up to max_k_pow blocks for the last forge block
				let mut blocks_since_forge = 0;
				let mut last_forge_diff = 0u64;
				let mut walk = Some(prev);
				while blocks_since_forge < consensus.max_k_pow {
					let current = match walk {
						Some(id) => id,
						None => {
							blocks_since_forge = consensus.max_k_pow;
							break;
						},
					};
					let entry = index.entry(current);
					if entry.forge_mined {
						last_forge_diff = forge_difficulty(entry.header.bits);
						break;
					}
					blocks_since_forge += 1;
					walk = entry.prev;
				}

				mul_saturating(base, pow_k(blocks_since_forge, last_forge_diff, consensus))
			},
			_ => base,
		}
	}
}
