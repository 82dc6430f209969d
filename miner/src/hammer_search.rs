//! Multi-threaded hammer search: candidate hammers are partitioned into
//! per-thread bins and hashed against the forge target until a solution
//! is found, the hammers run out, or the tip moves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use parking_lot::Mutex;
use keys::AddressHash;
use primitives::bigint::U256;
use primitives::hash::H256;
use verification::{HammerStatus, hammer_hash};

/// Abort conditions are polled once per this many hammer hashes; the
/// atomic load is cheap but not free on the hot path.
const ABORT_POLL_INTERVAL: u32 = 1000;

/// A wallet's view of one hammer creation.
#[derive(Debug, Clone)]
pub struct BctSummary {
	/// Transaction id of the creation.
	pub txid: H256,
	/// Height the creation confirmed at.
	pub bct_height: u32,
	/// Number of hammers the creation paid for.
	pub hammer_count: u32,
	/// Key hash the forged rewards are paid to.
	pub gold_address: AddressHash,
	/// Whether the creation carries a community contribution output.
	pub community_contrib: bool,
	/// Lifecycle status at the current tip.
	pub status: HammerStatus,
}

/// A contiguous run of hammers from a single creation, assigned to one
/// search bin.
#[derive(Debug, Clone, PartialEq)]
pub struct HammerRange {
	pub txid: H256,
	pub bct_height: u32,
	pub gold_address: AddressHash,
	pub community_contrib: bool,
	pub offset: u32,
	pub count: u32,
}

/// The witness of a successful search: any qualifying hammer, not a
/// canonical one.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSolution {
	pub range: HammerRange,
	pub hammer_index: u32,
}

/// Splits the ready hammers across `bins` bins so that each bin carries
/// roughly the same number of hammers, preserving creation order.
pub fn partition_hammers(bcts: &[BctSummary], bins: usize) -> Vec<Vec<HammerRange>> {
	let total: u64 = bcts.iter().map(|bct| bct.hammer_count as u64).sum();
	if total == 0 {
		return Vec::new();
	}

	let per_bin = (total + bins as u64 - 1) / bins as u64;
	let mut result = Vec::with_capacity(bins);
	let mut current = Vec::new();
	let mut hammers_in_bin = 0u64;

	for bct in bcts {
		let mut offset = 0;
		while offset < bct.hammer_count {
			let space_left = per_bin - hammers_in_bin;
			let take = ::std::cmp::min((bct.hammer_count - offset) as u64, space_left) as u32;
			current.push(HammerRange {
				txid: bct.txid.clone(),
				bct_height: bct.bct_height,
				gold_address: bct.gold_address.clone(),
				community_contrib: bct.community_contrib,
				offset: offset,
				count: take,
			});
			offset += take;
			hammers_in_bin += take as u64;

			if hammers_in_bin == per_bin {
				result.push(::std::mem::replace(&mut current, Vec::new()));
				hammers_in_bin = 0;
			}
		}
	}

	if !current.is_empty() {
		result.push(current);
	}

	result
}

struct SearchShared {
	solution_found: AtomicBool,
	early_abort: AtomicBool,
	solution: Mutex<Option<SearchSolution>>,
}

/// Cooperative abort handle of a running search.
#[derive(Clone)]
pub struct AbortHandle {
	shared: Arc<SearchShared>,
}

impl AbortHandle {
	/// Requests the search to stop; workers observe the flag within
	/// `ABORT_POLL_INTERVAL` hashes.
	pub fn abort(&self) {
		self.shared.early_abort.store(true, Ordering::SeqCst);
	}

	/// Whether an abort was requested or a solution terminated the search.
	pub fn is_finished(&self) -> bool {
		self.shared.solution_found.load(Ordering::SeqCst) || self.shared.early_abort.load(Ordering::SeqCst)
	}
}

/// A single hammer search over a fixed tip. Owns the coordination state
/// and the worker handles; its lifecycle is bounded by one `run` call.
pub struct SearchSession {
	shared: Arc<SearchShared>,
}

impl SearchSession {
	pub fn new() -> Self {
		SearchSession {
			shared: Arc::new(SearchShared {
				solution_found: AtomicBool::new(false),
				early_abort: AtomicBool::new(false),
				solution: Mutex::new(None),
			}),
		}
	}

	pub fn abort_handle(&self) -> AbortHandle {
		AbortHandle { shared: self.shared.clone() }
	}

	/// Runs the search to completion: spawns one worker per bin, joins
	/// them all, and returns the winning hammer unless the search ran dry
	/// or was aborted.
	pub fn run(&self, bins: Vec<Vec<HammerRange>>, det_rand: &str, target: U256) -> Option<SearchSolution> {
		let mut workers = Vec::with_capacity(bins.len());
		for (bin_id, bin) in bins.into_iter().enumerate() {
			let shared = self.shared.clone();
			let det_rand = det_rand.to_owned();
			let target = target.clone();
			workers.push(thread::Builder::new()
				.name(format!("forge-worker-{}", bin_id))
				.spawn(move || check_bin(bin, &det_rand, &target, &shared))
				.expect("thread spawning only fails on resource exhaustion; qed"));
		}

		for worker in workers {
			worker.join().expect("worker threads do not panic; qed");
		}

		if self.shared.early_abort.load(Ordering::SeqCst) {
			return None;
		}

		self.shared.solution.lock().take()
	}
}

/// Worker body: hashes every hammer of the bin, polling the abort flags
/// every `ABORT_POLL_INTERVAL` hashes.
fn check_bin(bin: Vec<HammerRange>, det_rand: &str, target: &U256, shared: &SearchShared) {
	let mut check_count = 0u32;
	for range in bin {
		let txid_hex = range.txid.to_reversed_str();
		for hammer in range.offset..range.offset + range.count {
			if check_count % ABORT_POLL_INTERVAL == 0 {
				if shared.solution_found.load(Ordering::SeqCst) || shared.early_abort.load(Ordering::SeqCst) {
					return;
				}
			}
			check_count += 1;

			if hammer_hash(det_rand, &txid_hex, hammer) < *target {
				// the mutex is only touched for the terminal write
				let mut solution = shared.solution.lock();
				shared.solution_found.store(true, Ordering::SeqCst);
				*solution = Some(SearchSolution {
					range: range.clone(),
					hammer_index: hammer,
				});
				return;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use primitives::bigint::U256;
	use primitives::hash::H256;
	use verification::HammerStatus;
	use super::{BctSummary, SearchSession, partition_hammers};

	fn bct(txid_byte: u8, hammer_count: u32) -> BctSummary {
		BctSummary {
			txid: H256::from([txid_byte; 32]),
			bct_height: 10,
			hammer_count: hammer_count,
			gold_address: Default::default(),
			community_contrib: false,
			status: HammerStatus::Ready,
		}
	}

	#[test]
	fn test_partition_even_split() {
		let bcts = vec![bct(1, 30), bct(2, 30)];
		let bins = partition_hammers(&bcts, 3);

		assert_eq!(bins.len(), 3);
		for bin in &bins {
			let hammers: u32 = bin.iter().map(|range| range.count).sum();
			assert_eq!(hammers, 20);
		}
		// the middle bin straddles both creations
		assert_eq!(bins[1].len(), 2);
		assert_eq!(bins[1][0].offset, 20);
		assert_eq!(bins[1][0].count, 10);
		assert_eq!(bins[1][1].offset, 0);
		assert_eq!(bins[1][1].count, 10);
	}

	#[test]
	fn test_partition_uneven_total() {
		let bcts = vec![bct(1, 10)];
		let bins = partition_hammers(&bcts, 3);

		// ceil(10 / 3) == 4 hammers per bin
		let per_bin: Vec<u32> = bins.iter()
			.map(|bin| bin.iter().map(|range| range.count).sum())
			.collect();
		assert_eq!(per_bin, vec![4, 4, 2]);
	}

	#[test]
	fn test_partition_no_hammers() {
		assert!(partition_hammers(&[], 4).is_empty());
	}

	#[test]
	fn test_search_finds_any_hammer_under_max_target() {
		let bins = partition_hammers(&[bct(1, 100)], 4);
		let session = SearchSession::new();
		let solution = session.run(bins, "deadbeef", U256::max_value()).unwrap();

		assert!(solution.hammer_index < 100);
		assert_eq!(solution.range.txid, H256::from([1u8; 32]));
	}

	#[test]
	fn test_search_runs_dry_under_zero_target() {
		let bins = partition_hammers(&[bct(1, 50)], 2);
		let session = SearchSession::new();
		assert!(session.run(bins, "deadbeef", U256::default()).is_none());
	}

	#[test]
	fn test_aborted_search_returns_nothing() {
		let bins = partition_hammers(&[bct(1, 50)], 2);
		let session = SearchSession::new();
		session.abort_handle().abort();
		assert!(session.run(bins, "deadbeef", U256::max_value()).is_none());
	}
}
