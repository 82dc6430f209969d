//! In-memory block index: an arena of per-block metadata entries forming
//! a DAG rooted at genesis. Entries are addressed by stable ids; `prev`
//! and `skip` pointers are non-owning lookups into the arena.

use std::cmp;
use std::collections::HashMap;
use chain::BlockHeader;
use primitives::bigint::U256;
use hash::H256;

/// Stable identifier of an entry within a `BlockIndex` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

/// Per-block metadata.
#[derive(Debug, Clone)]
pub struct BlockIndexEntry {
	/// Header hash.
	pub hash: H256,
	/// The block header itself.
	pub header: BlockHeader,
	/// Height of this block: number of ancestors along `prev`.
	pub height: u32,
	/// Parent entry; `None` for genesis.
	pub prev: Option<EntryId>,
	/// Skiplist pointer to a chosen ancestor; `None` for genesis.
	pub skip: Option<EntryId>,
	/// Total chain work up to and including this block.
	pub chain_work: U256,
	/// Whether this block was forge-mined, resolved at acceptance time
	/// (nonce marker plus Forge active at the parent).
	pub forge_mined: bool,
	/// Maximum header time along the ancestor path, inclusive.
	pub time_max: u32,
}

impl BlockIndexEntry {
	pub fn time(&self) -> u32 {
		self.header.time
	}
}

/// Turn the lowest '1' bit in the binary representation of a number into a '0'.
#[inline]
fn invert_lowest_one(n: u32) -> u32 {
	n & n.wrapping_sub(1)
}

/// Compute what height to jump back to for an entry's skip pointer.
/// Any height strictly lower is acceptable; this expression performs well
/// in simulations (max ~110 steps to go back up to 2**18 blocks).
pub fn skip_height(height: u32) -> u32 {
	if height < 2 {
		return 0;
	}

	if height & 1 != 0 {
		invert_lowest_one(invert_lowest_one(height - 1)) + 1
	} else {
		invert_lowest_one(height)
	}
}

/// Arena of block index entries. The arena exclusively owns the entries;
/// everything else refers to them by `EntryId` or hash.
#[derive(Default)]
pub struct BlockIndex {
	entries: Vec<BlockIndexEntry>,
	by_hash: HashMap<H256, EntryId>,
}

impl BlockIndex {
	pub fn new() -> Self {
		BlockIndex::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn entry(&self, id: EntryId) -> &BlockIndexEntry {
		&self.entries[id.0 as usize]
	}

	pub fn lookup(&self, hash: &H256) -> Option<EntryId> {
		self.by_hash.get(hash).cloned()
	}

	/// Inserts a block with its precomputed per-block work. The parent must
	/// already be present, except for a genesis block (zero previous hash
	/// into an empty index). Returns `None` for an orphan or duplicate.
	pub fn insert(&mut self, header: BlockHeader, forge_mined: bool, work: U256) -> Option<EntryId> {
		let hash = header.hash();
		if self.by_hash.contains_key(&hash) {
			return None;
		}

		let prev = if header.previous_header_hash.is_zero() && self.entries.is_empty() {
			None
		} else {
			Some(self.lookup(&header.previous_header_hash)?)
		};

		let (height, chain_work, time_max) = match prev {
			Some(prev_id) => {
				let parent = self.entry(prev_id);
				(
					parent.height + 1,
					parent.chain_work + work,
					cmp::max(parent.time_max, header.time),
				)
			},
			None => (0, work, header.time),
		};

		// skip pointer is set once, at construction
		let skip = prev.and_then(|prev_id| self.ancestor(prev_id, skip_height(height)));

		let id = EntryId(self.entries.len() as u32);
		self.entries.push(BlockIndexEntry {
			hash: hash.clone(),
			header: header,
			height: height,
			prev: prev,
			skip: skip,
			chain_work: chain_work,
			forge_mined: forge_mined,
			time_max: time_max,
		});
		self.by_hash.insert(hash, id);
		Some(id)
	}

	/// Finds the ancestor of `id` at the given height, following skip
	/// pointers where they do not overshoot. Fails only when the height is
	/// above the entry's own.
	pub fn ancestor(&self, id: EntryId, height: u32) -> Option<EntryId> {
		let mut walk = self.entry(id);
		if height > walk.height {
			return None;
		}

		let mut walk_id = id;
		let mut height_walk = walk.height;
		while height_walk > height {
			let height_skip = skip_height(height_walk);
			let height_skip_prev = skip_height(height_walk - 1);
			let take_skip = match walk.skip {
				Some(_) => height_skip == height ||
					(height_skip > height && !(height_skip_prev < height_skip.saturating_sub(2) &&
								height_skip_prev >= height)),
				None => false,
			};

			// only follow skip if prev->skip isn't better than skip->prev
			if take_skip {
				walk_id = walk.skip.expect("take_skip is only true when skip is set; qed");
				height_walk = height_skip;
			} else {
				walk_id = walk.prev.expect("height_walk > height >= 0 so entry is not genesis; qed");
				height_walk -= 1;
			}
			walk = self.entry(walk_id);
		}

		Some(walk_id)
	}

	/// Finds the last common ancestor of two entries.
	pub fn last_common_ancestor(&self, mut a: EntryId, mut b: EntryId) -> EntryId {
		let height_a = self.entry(a).height;
		let height_b = self.entry(b).height;
		if height_a > height_b {
			a = self.ancestor(a, height_b).expect("height_b < height_a; ancestor exists; qed");
		} else if height_b > height_a {
			b = self.ancestor(b, height_a).expect("height_a < height_b; ancestor exists; qed");
		}

		while a != b {
			a = self.entry(a).prev.expect("branches at equal height meet at genesis; qed");
			b = self.entry(b).prev.expect("branches at equal height meet at genesis; qed");
		}

		a
	}
}

#[cfg(test)]
mod tests {
	use chain::BlockHeader;
	use primitives::bigint::U256;
	use primitives::compact::Compact;
	use super::{BlockIndex, EntryId, skip_height, invert_lowest_one};

	pub fn test_header(prev: &BlockHeader, time_step: u32) -> BlockHeader {
		BlockHeader {
			version: 4,
			previous_header_hash: prev.hash(),
			merkle_root_hash: Default::default(),
			time: prev.time + time_step,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		}
	}

	pub fn genesis_header() -> BlockHeader {
		BlockHeader {
			version: 4,
			previous_header_hash: Default::default(),
			merkle_root_hash: Default::default(),
			time: 1_000_000,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		}
	}

	fn build_chain(len: u32) -> (BlockIndex, Vec<EntryId>) {
		let mut index = BlockIndex::new();
		let mut ids = Vec::new();
		let mut header = genesis_header();
		ids.push(index.insert(header.clone(), false, U256::one()).unwrap());
		for _ in 1..len {
			let next = test_header(&header, 10);
			ids.push(index.insert(next.clone(), false, U256::one()).unwrap());
			header = next;
		}
		(index, ids)
	}

	#[test]
	fn test_skip_height_well_formed() {
		// invert_lowest_one(invert_lowest_one(n - 1)) + 1 <= n for all n >= 2
		for n in 2u32..10_000 {
			assert!(invert_lowest_one(invert_lowest_one(n - 1)) + 1 <= n);
			assert!(skip_height(n) < n);
		}
		assert_eq!(skip_height(0), 0);
		assert_eq!(skip_height(1), 0);
	}

	#[test]
	fn test_ancestor_heights() {
		let (index, ids) = build_chain(200);
		let tip = *ids.last().unwrap();
		for h in 0..200 {
			let ancestor = index.ancestor(tip, h).unwrap();
			assert_eq!(index.entry(ancestor).height, h);
			assert_eq!(ancestor, ids[h as usize]);
		}
		assert_eq!(index.ancestor(tip, 200), None);
	}

	#[test]
	fn test_insert_orphan_rejected() {
		let (mut index, _) = build_chain(3);
		let mut orphan = genesis_header();
		orphan.previous_header_hash = [0xab; 32].into();
		assert_eq!(index.insert(orphan, false, U256::one()), None);
	}

	#[test]
	fn test_insert_duplicate_rejected() {
		let (mut index, _) = build_chain(3);
		assert_eq!(index.insert(genesis_header(), false, U256::one()), None);
	}

	#[test]
	fn test_chain_work_accumulates() {
		let (index, ids) = build_chain(10);
		for (i, id) in ids.iter().enumerate() {
			assert_eq!(index.entry(*id).chain_work, U256::from(i as u64 + 1));
		}
	}

	#[test]
	fn test_last_common_ancestor() {
		let (mut index, ids) = build_chain(10);
		// fork off at height 5
		let fork_parent = index.entry(ids[5]).header.clone();
		let mut side = test_header(&fork_parent, 99);
		let mut side_id = index.insert(side.clone(), false, U256::one()).unwrap();
		for _ in 0..5 {
			let next = test_header(&side, 99);
			side_id = index.insert(next.clone(), false, U256::one()).unwrap();
			side = next;
		}

		let lca = index.last_common_ancestor(*ids.last().unwrap(), side_id);
		assert_eq!(lca, ids[5]);
	}
}
