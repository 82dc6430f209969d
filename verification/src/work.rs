use std::cmp;
use chain::COIN;
use network::ConsensusParams;
use primitives::bigint::U256;
use primitives::compact::Compact;
use primitives::hash::H256;
use storage::{BlockIndex, EntryId};

/// Number of past blocks sampled by the Dark Gravity Wave retarget.
const DGW_PAST_BLOCKS: u32 = 24;

/// Block subsidy at the given height: the emission schedule halves at
/// every halving interval and stops at the total-money-supply height.
pub fn block_subsidy(height: u32, consensus: &ConsensusParams) -> u64 {
	if height >= consensus.total_money_supply_height {
		return 0;
	}

	let halvings = height / consensus.subsidy_halving_interval;
	if halvings >= 64 {
		return 0;
	}

	(50 * COIN) >> halvings
}

/// Returns true if the hash is lower or equal than the target represented
/// by compact bits.
pub fn is_valid_proof_of_work_hash(bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	let value = U256::from(&*hash.reversed() as &[u8]);
	value <= target
}

/// Returns true if the hash is lower or equal than the target and the
/// target is lower or equal than the network maximum.
pub fn is_valid_proof_of_work(max_work_bits: Compact, bits: Compact, hash: &H256) -> bool {
	let maximum = match max_work_bits.to_u256() {
		Ok(max) => max,
		_err => return false,
	};

	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	let value = U256::from(&*hash.reversed() as &[u8]);
	target <= maximum && value <= target
}

/// Multiplies a target by a small factor, saturating to `limit` instead of
/// wrapping; the caller clamps to the same limit anyway.
fn mul_clamped(value: U256, factor: u64, limit: &U256) -> U256 {
	let (result, overflow) = value.overflowing_mul(U256::from(factor));
	if overflow || result > *limit {
		limit.clone()
	} else {
		result
	}
}

/// Returns the work required for the block following `prev`.
/// Below the legacy fork height the per-interval retarget applies;
/// above it, Dark Gravity Wave.
pub fn work_required(index: &BlockIndex, prev: EntryId, forge11_active: bool, block_time: u32, consensus: &ConsensusParams) -> Compact {
	if index.entry(prev).height >= consensus.last_scrypt_block {
		dark_gravity_wave(index, prev, forge11_active, block_time, consensus)
	} else {
		work_required_legacy(index, prev, block_time, consensus)
	}
}

/// Legacy per-interval retarget.
fn work_required_legacy(index: &BlockIndex, prev: EntryId, block_time: u32, consensus: &ConsensusParams) -> Compact {
	let limit_bits: Compact = consensus.pow_limit.clone().into();
	let interval = consensus.difficulty_adjustment_interval();
	let prev_entry = index.entry(prev);
	let height = prev_entry.height + 1;

	// only change once per difficulty adjustment interval
	if height % interval != 0 {
		if consensus.allow_min_difficulty_blocks {
			// Special difficulty rule for testnet: if the new block's
			// timestamp is more than twice the target spacing ahead,
			// allow mining of a min-difficulty block.
			if block_time > prev_entry.time() + consensus.pow_target_spacing * 2 {
				return limit_bits;
			}

			// return the last non-special-min-difficulty-rules block
			let mut walk = prev;
			loop {
				let entry = index.entry(walk);
				let not_boundary = entry.height % interval != 0;
				match entry.prev {
					Some(parent) if not_boundary && entry.header.bits == limit_bits => walk = parent,
					_ => return entry.header.bits,
				}
			}
		}
		return prev_entry.header.bits;
	}

	// go back the full period unless it's the first retarget after genesis
	let blocks_to_go_back = if height != interval { interval } else { interval - 1 };
	let first = index.ancestor(prev, prev_entry.height - blocks_to_go_back)
		.expect("retarget heights start at interval - 1; qed");

	calculate_next_work_required(prev_entry.header.bits, prev_entry.time(), index.entry(first).time(), consensus)
}

/// Applies the legacy clamped retarget formula.
fn calculate_next_work_required(last_bits: Compact, last_time: u32, first_time: u32, consensus: &ConsensusParams) -> Compact {
	if consensus.no_pow_retargeting {
		return last_bits;
	}

	// limit adjustment step
	let target_timespan = consensus.pow_target_timespan as i64;
	let mut actual_timespan = last_time as i64 - first_time as i64;
	actual_timespan = cmp::max(actual_timespan, target_timespan / 4);
	actual_timespan = cmp::min(actual_timespan, target_timespan * 4);

	let mut retarget: U256 = last_bits.into();

	// the intermediate value can overflow by one bit, so shift around the limit
	let shift = retarget.bits() as u32 > consensus.pow_limit.bits() as u32 - 1;
	if shift {
		retarget = retarget >> 1;
	}
	retarget = retarget * U256::from(actual_timespan as u64);
	retarget = retarget / U256::from(target_timespan as u64);
	if shift {
		retarget = retarget << 1;
	}

	if retarget > consensus.pow_limit {
		consensus.pow_limit.clone().into()
	} else {
		retarget.into()
	}
}

/// Dark Gravity Wave v3 with forge awareness: forge-mined blocks are
/// transparent to the PoW difficulty, and a stale tip progressively
/// lowers difficulty until the limit is reached.
fn dark_gravity_wave(index: &BlockIndex, prev: EntryId, forge11_active: bool, block_time: u32, consensus: &ConsensusParams) -> Compact {
	let limit = &consensus.pow_limit;
	let limit_bits: Compact = limit.clone().into();

	// allow minimum difficulty blocks if we haven't seen a block for
	// ostensibly ten blocks worth of time
	if consensus.allow_min_difficulty_blocks &&
		block_time > index.entry(prev).time() + consensus.pow_target_spacing * 10 {
		return limit_bits;
	}

	// from 1.1, skip over forge-mined blocks at the tip
	let mut last = prev;
	if forge11_active {
		while index.entry(last).forge_mined {
			last = index.entry(last).prev.expect("a forge-mined genesis is rejected at validation; qed");
		}
	}

	// make sure there are at least DGW_PAST_BLOCKS PoW blocks since the
	// legacy fork, otherwise return the limit
	if index.entry(last).height < consensus.last_scrypt_block + DGW_PAST_BLOCKS {
		return limit_bits;
	}

	// weighted mean of the targets of the past DGW_PAST_BLOCKS PoW blocks
	let mut walk = last;
	let mut average = U256::default();
	for count in 1..DGW_PAST_BLOCKS + 1 {
		while index.entry(walk).forge_mined {
			walk = index.entry(walk).prev.expect("forge blocks never reach back to genesis; qed");
		}

		let target: U256 = index.entry(walk).header.bits.into();
		average = if count == 1 {
			target
		} else {
			(average * U256::from(count) + target) / U256::from(count + 1)
		};

		if count != DGW_PAST_BLOCKS {
			walk = index.entry(walk).prev.expect("height is above last_scrypt_block + DGW_PAST_BLOCKS; qed");
		}
	}

	let last_time = index.entry(last).time() as i64;
	let target_timespan = (DGW_PAST_BLOCKS * consensus.pow_target_spacing) as i64;
	let mut actual_timespan = last_time - index.entry(walk).time() as i64;
	actual_timespan = cmp::max(actual_timespan, target_timespan / 3);
	actual_timespan = cmp::min(actual_timespan, target_timespan * 3);

	let mut new_target = average * U256::from(actual_timespan as u64) / U256::from(target_timespan as u64);

	// stale-tip rescue: progressively lower difficulty while no block
	// arrives, resetting to the limit after thirty spacings
	let spacing = consensus.pow_target_spacing as i64;
	let slack = block_time as i64 - last_time;
	if slack > spacing * 30 {
		new_target = limit.clone();
	} else if slack > spacing * 25 {
		new_target = mul_clamped(new_target, 100_000, limit);
	} else if slack > spacing * 20 {
		new_target = mul_clamped(new_target, 10_000, limit);
	} else if slack > spacing * 15 {
		new_target = mul_clamped(new_target, 1_000, limit);
	} else if slack > spacing * 10 {
		new_target = mul_clamped(new_target, 100, limit);
	}

	if new_target > *limit {
		new_target = limit.clone();
	}

	new_target.into()
}
