use storage::{BlockIndex, EntryId};

/// Number of blocks the past-time median is computed over.
const MEDIAN_TIMESPAN: usize = 11;

/// Median time of the 11 blocks ending at (and including) the given entry.
pub fn median_time_past(index: &BlockIndex, id: EntryId) -> u32 {
	let mut timestamps = Vec::with_capacity(MEDIAN_TIMESPAN);
	let mut walk = Some(id);
	while let Some(current) = walk {
		if timestamps.len() == MEDIAN_TIMESPAN {
			break;
		}
		let entry = index.entry(current);
		timestamps.push(entry.time());
		walk = entry.prev;
	}

	timestamps.sort();
	timestamps[timestamps.len() / 2]
}

#[cfg(test)]
mod tests {
	use chain::BlockHeader;
	use primitives::bigint::U256;
	use primitives::compact::Compact;
	use storage::BlockIndex;
	use super::median_time_past;

	fn header(prev: Option<&BlockHeader>, time: u32) -> BlockHeader {
		BlockHeader {
			version: 4,
			previous_header_hash: prev.map(|h| h.hash()).unwrap_or_default(),
			merkle_root_hash: Default::default(),
			time: time,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		}
	}

	#[test]
	fn test_median_time_past() {
		let mut index = BlockIndex::new();
		let genesis = header(None, 1000);
		let mut id = index.insert(genesis.clone(), false, U256::one()).unwrap();
		let mut last = genesis;
		for i in 1..20u32 {
			let next = header(Some(&last), 1000 + i * 10);
			id = index.insert(next.clone(), false, U256::one()).unwrap();
			last = next;
		}

		// times of the last 11 blocks are 1090..=1190 step 10; median is 1140
		assert_eq!(median_time_past(&index, id), 1140);
	}

	#[test]
	fn test_median_time_past_short_chain() {
		let mut index = BlockIndex::new();
		let genesis = header(None, 1000);
		let g = index.insert(genesis.clone(), false, U256::one()).unwrap();
		assert_eq!(median_time_past(&index, g), 1000);

		let b1 = header(Some(&genesis), 1050);
		let id = index.insert(b1, false, U256::one()).unwrap();
		assert_eq!(median_time_past(&index, id), 1050);
	}
}
