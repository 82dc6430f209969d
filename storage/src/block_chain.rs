//! Dense view of the currently-active branch: element `i` is the canonical
//! block at height `i`.

use hash::H256;
use {BlockIndex, EntryId};

#[derive(Default)]
pub struct Chain {
	canon: Vec<EntryId>,
}

impl Chain {
	pub fn new() -> Self {
		Chain::default()
	}

	/// Canonical block at the given height, if within the active branch.
	pub fn at(&self, height: u32) -> Option<EntryId> {
		self.canon.get(height as usize).cloned()
	}

	/// The active tip.
	pub fn tip(&self) -> Option<EntryId> {
		self.canon.last().cloned()
	}

	/// Height of the active tip.
	pub fn best_height(&self) -> Option<u32> {
		match self.canon.len() {
			0 => None,
			len => Some(len as u32 - 1),
		}
	}

	/// O(1) test for whether an entry lies on the active branch.
	pub fn contains(&self, index: &BlockIndex, id: EntryId) -> bool {
		self.at(index.entry(id).height) == Some(id)
	}

	/// Makes `id` the new tip: resizes the vector to its height, then
	/// rewrites entries down the `prev` chain until an unchanged entry
	/// is met.
	pub fn set_tip(&mut self, index: &BlockIndex, id: EntryId) {
		let height = index.entry(id).height;
		self.canon.resize(height as usize + 1, id);

		let mut walk = Some(id);
		while let Some(current) = walk {
			let entry = index.entry(current);
			let slot = &mut self.canon[entry.height as usize];
			if *slot == current && current != id {
				// the rest of the branch is already in place
				break;
			}
			*slot = current;
			walk = entry.prev;
		}
	}

	/// Clears the view.
	pub fn clear(&mut self) {
		self.canon.clear();
	}

	/// Builds a block locator starting at `from` (the tip when `None`):
	/// exponentially larger steps back once more than 10 hashes are
	/// collected, always ending with genesis.
	pub fn block_locator(&self, index: &BlockIndex, from: Option<EntryId>) -> Vec<H256> {
		let mut step = 1u32;
		let mut have = Vec::with_capacity(32);

		let mut current = match from.or_else(|| self.tip()) {
			Some(id) => id,
			None => return have,
		};

		loop {
			let entry = index.entry(current);
			have.push(entry.hash.clone());
			// stop when we have added the genesis block
			if entry.height == 0 {
				break;
			}

			let next_height = entry.height.saturating_sub(step);
			current = if self.contains(index, current) {
				// use the O(1) chain view if possible
				self.at(next_height).expect("next_height <= entry.height <= tip height; qed")
			} else {
				// otherwise, use the O(log n) skiplist
				index.ancestor(current, next_height).expect("next_height < entry.height; qed")
			};

			if have.len() > 10 {
				step *= 2;
			}
		}

		have
	}

	/// Finds the last block of the active branch that is an ancestor of
	/// `id`.
	pub fn find_fork(&self, index: &BlockIndex, id: EntryId) -> Option<EntryId> {
		let tip_height = self.best_height()?;

		let mut walk = if index.entry(id).height > tip_height {
			index.ancestor(id, tip_height).expect("tip_height < entry height; qed")
		} else {
			id
		};

		loop {
			if self.contains(index, walk) {
				return Some(walk);
			}
			walk = index.entry(walk).prev?;
		}
	}

	/// Finds the earliest canonical block whose `time_max` is at least
	/// the given time. Binary search: `time_max` is non-decreasing along
	/// the chain.
	pub fn find_earliest_at_least(&self, index: &BlockIndex, time: u32) -> Option<EntryId> {
		let mut lo = 0usize;
		let mut hi = self.canon.len();
		while lo < hi {
			let mid = lo + (hi - lo) / 2;
			if index.entry(self.canon[mid]).time_max < time {
				lo = mid + 1;
			} else {
				hi = mid;
			}
		}

		self.canon.get(lo).cloned()
	}
}

/// The index and active-branch view, updated together under the host's
/// consensus lock.
#[derive(Default)]
pub struct ChainState {
	pub index: BlockIndex,
	pub chain: Chain,
}

impl ChainState {
	pub fn new() -> Self {
		ChainState::default()
	}

	/// The active tip's entry id, height and hash.
	pub fn best_block(&self) -> Option<(EntryId, u32, H256)> {
		let tip = self.chain.tip()?;
		let entry = self.index.entry(tip);
		Some((tip, entry.height, entry.hash.clone()))
	}
}

#[cfg(test)]
mod tests {
	use chain::BlockHeader;
	use primitives::bigint::U256;
	use primitives::compact::Compact;
	use {BlockIndex, EntryId};
	use super::Chain;

	fn genesis_header() -> BlockHeader {
		BlockHeader {
			version: 4,
			previous_header_hash: Default::default(),
			merkle_root_hash: Default::default(),
			time: 1_000_000,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		}
	}

	fn next_header(prev: &BlockHeader, time_step: u32) -> BlockHeader {
		BlockHeader {
			version: 4,
			previous_header_hash: prev.hash(),
			merkle_root_hash: Default::default(),
			time: prev.time + time_step,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		}
	}

	fn build(len: u32) -> (BlockIndex, Chain, Vec<EntryId>, BlockHeader) {
		let mut index = BlockIndex::new();
		let mut chain = Chain::new();
		let mut ids = Vec::new();
		let mut header = genesis_header();
		ids.push(index.insert(header.clone(), false, U256::one()).unwrap());
		for _ in 1..len {
			let next = next_header(&header, 10);
			ids.push(index.insert(next.clone(), false, U256::one()).unwrap());
			header = next;
		}
		chain.set_tip(&index, *ids.last().unwrap());
		(index, chain, ids, header)
	}

	#[test]
	fn test_set_tip_and_contains() {
		let (index, chain, ids, _) = build(30);
		assert_eq!(chain.best_height(), Some(29));
		assert_eq!(chain.tip(), Some(ids[29]));
		for (height, id) in ids.iter().enumerate() {
			assert_eq!(chain.at(height as u32), Some(*id));
			assert!(chain.contains(&index, *id));
		}
	}

	#[test]
	fn test_reorg_to_side_branch() {
		let (mut index, mut chain, ids, _) = build(10);

		// build a longer side branch from height 5
		let fork_parent = index.entry(ids[5]).header.clone();
		let mut header = next_header(&fork_parent, 99);
		let mut side_ids = vec![index.insert(header.clone(), false, U256::one()).unwrap()];
		for _ in 0..5 {
			let next = next_header(&header, 99);
			side_ids.push(index.insert(next.clone(), false, U256::one()).unwrap());
			header = next;
		}

		let side_tip = *side_ids.last().unwrap();
		assert_eq!(chain.find_fork(&index, side_tip), Some(ids[5]));

		chain.set_tip(&index, side_tip);
		assert_eq!(chain.best_height(), Some(11));
		assert!(chain.contains(&index, ids[5]));
		assert!(!chain.contains(&index, ids[6]));
		assert!(side_ids.iter().all(|id| chain.contains(&index, *id)));
	}

	#[test]
	fn test_block_locator() {
		let (index, chain, ids, _) = build(100);
		let locator = chain.block_locator(&index, None);

		// first 11 hashes step back one by one, then strides double,
		// and the locator always ends at genesis
		assert_eq!(locator[0], index.entry(ids[99]).hash);
		assert_eq!(locator[10], index.entry(ids[89]).hash);
		assert_eq!(*locator.last().unwrap(), index.entry(ids[0]).hash);
		assert!(locator.len() < 32);
	}

	#[test]
	fn test_find_earliest_at_least() {
		let (index, chain, ids, _) = build(50);
		// times start at 1_000_000 and step by 10
		assert_eq!(chain.find_earliest_at_least(&index, 0), Some(ids[0]));
		assert_eq!(chain.find_earliest_at_least(&index, 1_000_001), Some(ids[1]));
		assert_eq!(chain.find_earliest_at_least(&index, 1_000_250), Some(ids[25]));
		assert_eq!(chain.find_earliest_at_least(&index, 2_000_000), None);
	}
}
