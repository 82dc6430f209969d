//! Forge (hammer hash) difficulty: per-version retarget engines and the
//! fixed-point forge difficulty used by the chain-work bonus.

use network::{ConsensusParams, FORGE_DIFF_SCALE};
use primitives::bigint::U256;
use primitives::compact::Compact;
use storage::{BlockIndex, EntryId};
use ForgeVersion;

lazy_static! {
	/// The standard difficulty-1 target (compact 0x1d00ffff), the baseline
	/// of the fixed-point forge difficulty.
	static ref DIFFICULTY_1_TARGET: U256 = "00000000ffff0000000000000000000000000000000000000000000000000000".parse()
		.expect("hardcoded value should parse without errors");
}

/// Returns the hammer hash target for the block following `prev`,
/// dispatched on the forge version active there.
pub fn forge_work_required(index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams, version: ForgeVersion) -> Compact {
	match version {
		ForgeVersion::V10 => forge_work_required_ema(index, prev, consensus),
		ForgeVersion::V11 => forge_work_required_sma(index, prev, consensus, consensus.forge_difficulty_window, &consensus.pow_limit_forge),
		ForgeVersion::V12 => forge_work_required_sma(index, prev, consensus, consensus.forge_difficulty_window2, &consensus.pow_limit_forge2),
		ForgeVersion::V13 => forge_work_required_normalised(index, prev, consensus),
	}
}

/// Forge 1.0: EMA snap towards the target spacing, seeded from the most
/// recent forge block's target.
fn forge_work_required_ema(index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> Compact {
	let limit = &consensus.pow_limit_forge;

	// find the last forge block and count PoW blocks passed on the way
	let mut walk = prev;
	let mut pow_blocks = 0u64;
	let last_target = loop {
		let entry = index.entry(walk);
		// ran out of walkable history without finding a forge block
		if entry.prev.is_none() || entry.height < consensus.min_forge_check_height {
			return limit.clone().into();
		}

		if entry.forge_mined {
			break match entry.header.bits.to_u256() {
				Ok(target) => target,
				Err(_) => return limit.clone().into(),
			};
		}

		walk = entry.prev.expect("checked above; qed");
		pow_blocks += 1;
	};

	// a forge block at the tip leaves no room for another one before 1.1:
	// the target becomes impossible
	if pow_blocks == 0 {
		return Compact::from_u256(U256::default());
	}

	let spacing = consensus.forge_block_spacing_target as u64;
	let interval = (consensus.forge_target_adjust_aggression / consensus.forge_block_spacing_target) as u64;
	let numerator = (interval - 1) * spacing + 2 * pow_blocks;
	let denominator = (interval + 1) * spacing;

	let (scaled, overflow) = last_target.overflowing_mul(U256::from(numerator));
	let mut new_target = if overflow {
		// the true value is far beyond the limit either way
		limit.clone()
	} else {
		scaled / U256::from(denominator)
	};

	if new_target > *limit {
		new_target = limit.clone();
	}

	new_target.into()
}

/// Forge 1.1/1.2: plain SMA over the targets of the last `window` forge
/// blocks.
fn forge_work_required_sma(index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams, window: u32, limit: &U256) -> Compact {
	let mut sum = U256::default();
	let mut forge_blocks = 0u32;

	let mut walk = prev;
	while forge_blocks < window {
		let entry = index.entry(walk);
		if entry.prev.is_none() || entry.height < consensus.min_forge_check_height {
			break;
		}

		if entry.forge_mined {
			let target: U256 = entry.header.bits.into();
			let (next, overflow) = sum.overflowing_add(target);
			if overflow {
				return limit.clone().into();
			}
			sum = next;
			forge_blocks += 1;
		}

		walk = entry.prev.expect("checked above; qed");
	}

	if forge_blocks == 0 {
		trace!(target: "forge", "no forge blocks found in history, using limit target");
		return limit.clone().into();
	}

	let mut new_target = sum / U256::from(forge_blocks);
	if new_target > *limit {
		new_target = limit.clone();
	}

	new_target.into()
}

/// Forge 1.3: SMA over a fixed window of blocks of any kind, normalised
/// by the expected forge block count.
fn forge_work_required_normalised(index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> Compact {
	let limit = &consensus.pow_limit_forge2;
	let window = consensus.forge_difficulty_window2;
	let target_block_count = (window / consensus.forge_block_spacing_target) as u64;

	let mut sum = U256::default();
	let mut forge_blocks = 0u32;
	let mut walk = prev;
	for _ in 0..window {
		let entry = index.entry(walk);
		if entry.prev.is_none() || entry.height < consensus.min_forge_check_height {
			trace!(target: "forge", "not enough blocks in sampling window, using limit target");
			return limit.clone().into();
		}

		if entry.forge_mined {
			let target: U256 = entry.header.bits.into();
			let (next, overflow) = sum.overflowing_add(target);
			if overflow {
				return limit.clone().into();
			}
			sum = next;
			forge_blocks += 1;
		}

		walk = entry.prev.expect("checked above; qed");
	}

	if forge_blocks == 0 {
		return limit.clone().into();
	}

	let average = sum / U256::from(forge_blocks);
	let (scaled, overflow) = average.overflowing_mul(U256::from(target_block_count));
	let mut new_target = if overflow {
		limit.clone()
	} else {
		scaled / U256::from(forge_blocks)
	};

	if new_target > *limit {
		new_target = limit.clone();
	}

	new_target.into()
}

/// Fixed-point forge difficulty of a target: the ratio of the difficulty-1
/// target to the given target in `FORGE_DIFF_SCALE` units, computed on
/// 64-bit normalized mantissas so that every implementation rounds
/// identically.
pub fn forge_difficulty(bits: Compact) -> u64 {
	let target = match bits.to_u256() {
		Ok(target) => target,
		Err(_) => return 0,
	};
	if target.is_zero() {
		return u64::max_value();
	}

	let (base_m, base_e) = mantissa64(&*DIFFICULTY_1_TARGET);
	let (target_m, target_e) = mantissa64(&target);

	// difficulty = (base_m * 2^base_e) / (target_m * 2^target_e)
	let mut q = base_m as u128 * FORGE_DIFF_SCALE as u128 / target_m as u128;
	if base_e >= target_e {
		let shift = base_e - target_e;
		if shift >= q.leading_zeros() {
			return u64::max_value();
		}
		q <<= shift;
	} else {
		let shift = target_e - base_e;
		q = if shift >= 128 { 0 } else { q >> shift };
	}

	if q > u64::max_value() as u128 {
		u64::max_value()
	} else {
		q as u64
	}
}

/// Top 64 bits of a 256-bit value together with the dropped bit count.
fn mantissa64(value: &U256) -> (u64, u32) {
	let bits = value.bits() as u32;
	if bits > 64 {
		((*value >> (bits as usize - 64)).low_u64(), bits - 64)
	} else {
		(value.low_u64(), 0)
	}
}

#[cfg(test)]
mod tests {
	use chain::BlockHeader;
	use network::{ConsensusParams, Network, FORGE_DIFF_SCALE};
	use primitives::bigint::U256;
	use primitives::compact::Compact;
	use storage::{BlockIndex, EntryId};
	use ForgeVersion;
	use super::{forge_work_required, forge_difficulty};

	const POW_BITS: u32 = 0x1e0ffff0;

	struct ChainBuilder {
		index: BlockIndex,
		ids: Vec<EntryId>,
		last: BlockHeader,
	}

	impl ChainBuilder {
		fn new() -> Self {
			let header = BlockHeader {
				version: 4,
				previous_header_hash: Default::default(),
				merkle_root_hash: Default::default(),
				time: 1_000_000,
				bits: Compact::new(POW_BITS),
				nonce: 0,
			};
			let mut index = BlockIndex::new();
			let ids = vec![index.insert(header.clone(), false, U256::one()).unwrap()];
			ChainBuilder { index: index, ids: ids, last: header }
		}

		fn generate(&mut self, count: u32, bits: u32, forge_mined: bool) {
			for _ in 0..count {
				let header = BlockHeader {
					version: 4,
					previous_header_hash: self.last.hash(),
					merkle_root_hash: Default::default(),
					time: self.last.time + 10,
					bits: Compact::new(bits),
					nonce: if forge_mined { 192 } else { 0 },
				};
				self.ids.push(self.index.insert(header.clone(), forge_mined, U256::one()).unwrap());
				self.last = header;
			}
		}

		fn tip(&self) -> EntryId {
			*self.ids.last().unwrap()
		}
	}

	#[test]
	fn test_ema_no_forge_history_returns_limit() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut chain = ChainBuilder::new();
		chain.generate(40, POW_BITS, false);

		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V10);
		assert_eq!(work, consensus.pow_limit_forge.clone().into());
	}

	#[test]
	fn test_ema_forge_tip_is_impossible_target() {
		// before 1.1 a forge block must follow a PoW block, so the target
		// after a forge tip is unreachable
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut chain = ChainBuilder::new();
		chain.generate(200, POW_BITS, false);
		chain.generate(1, 0x1d00ffff, true);

		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V10);
		assert_eq!(work.to_u256(), Ok(U256::default()));
	}

	#[test]
	fn test_ema_eases_with_pow_blocks() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let forge_bits = 0x1d00ffffu32;
		let mut chain = ChainBuilder::new();
		chain.generate(200, POW_BITS, false);
		chain.generate(1, forge_bits, true);
		chain.generate(4, POW_BITS, false);

		// interval = 30 / 2 = 15; with 4 PoW blocks since the last forge
		// block: target * ((14 * 2 + 8) / (16 * 2))
		let expected = Compact::new(forge_bits).to_u256().unwrap() * U256::from(36u64) / U256::from(32u64);
		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V10);
		assert_eq!(work, Compact::from_u256(expected));
	}

	#[test]
	fn test_sma_averages_forge_targets() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut chain = ChainBuilder::new();
		chain.generate(200, POW_BITS, false);
		// alternating forge blocks with two different targets
		for _ in 0..10 {
			chain.generate(1, 0x1c0ffff0, true);
			chain.generate(1, POW_BITS, false);
			chain.generate(1, 0x1c07fff8, true);
			chain.generate(1, POW_BITS, false);
		}

		let a = Compact::new(0x1c0ffff0).to_u256().unwrap();
		let b = Compact::new(0x1c07fff8).to_u256().unwrap();
		let expected = (a + b) / U256::from(2u64);

		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V11);
		assert_eq!(work, Compact::from_u256(expected));
	}

	#[test]
	fn test_sma_no_forge_blocks_returns_limit() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut chain = ChainBuilder::new();
		chain.generate(100, POW_BITS, false);

		let work11 = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V11);
		assert_eq!(work11, consensus.pow_limit_forge.clone().into());

		let work12 = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V12);
		assert_eq!(work12, consensus.pow_limit_forge2.clone().into());
	}

	#[test]
	fn test_normalised_scales_by_forge_share() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let forge_bits = 0x1c0ffff0u32;
		let mut chain = ChainBuilder::new();
		chain.generate(200, POW_BITS, false);
		// half of the last 24 blocks are forge blocks, matching the
		// spacing target exactly
		for _ in 0..12 {
			chain.generate(1, forge_bits, true);
			chain.generate(1, POW_BITS, false);
		}

		// target_block_count = 24 / 2 = 12 and forge count = 12, so the
		// normalisation is a no-op and the result is the plain average
		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V13);
		assert_eq!(work, Compact::new(forge_bits));
	}

	#[test]
	fn test_normalised_short_window_returns_limit() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let mut chain = ChainBuilder::new();
		chain.generate(10, POW_BITS, false);

		let work = forge_work_required(&chain.index, chain.tip(), &consensus, ForgeVersion::V13);
		assert_eq!(work, consensus.pow_limit_forge2.clone().into());
	}

	#[test]
	fn test_forge_difficulty_fixed_point() {
		// difficulty of the baseline target is exactly 1.0
		assert_eq!(forge_difficulty(Compact::new(0x1d00ffff)), FORGE_DIFF_SCALE);

		// a target twice as hard doubles the difficulty
		let half = Compact::new(0x1d00ffff).to_u256().unwrap() >> 1;
		let diff = forge_difficulty(Compact::from_u256(half));
		assert!(diff >= 2 * FORGE_DIFF_SCALE - 2 && diff <= 2 * FORGE_DIFF_SCALE + 2);

		// an easy forge target has a difficulty far below one
		let easy = ConsensusParams::new(Network::Mainnet).pow_limit_forge.clone();
		let diff = forge_difficulty(Compact::from_u256(easy));
		assert!(diff < FORGE_DIFF_SCALE / 100_000);
		assert!(diff > 0);

		// a zero target is infinitely hard
		assert_eq!(forge_difficulty(Compact::from_u256(U256::default())), u64::max_value());
	}
}
