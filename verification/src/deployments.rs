use std::collections::HashMap;
use parking_lot::Mutex;
use network::{ConsensusParams, Deployment};
use primitives::hash::H256;
use storage::{BlockIndex, EntryId};
use timestamp::median_time_past;

/// Forge protocol versions form a totally ordered activation lattice.
/// Difficulty and chain-work rules dispatch on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ForgeVersion {
	V10,
	V11,
	V12,
	V13,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ThresholdState {
	Defined,
	Started,
	LockedIn,
	Active,
	Failed,
}

impl Default for ThresholdState {
	fn default() -> Self {
		ThresholdState::Defined
	}
}

impl ThresholdState {
	fn is_active(&self) -> bool {
		match *self {
			ThresholdState::Active => true,
			_ => false,
		}
	}
}

/// Threshold state resolved for a version-bits period.
#[derive(Debug, Clone, Default)]
struct DeploymentState {
	/// Height of the period's boundary block
	boundary_height: u32,
	/// Hash of the period's boundary block
	boundary_hash: H256,
	/// Threshold state at that boundary
	state: ThresholdState,
}

/// Last known deployment states
type DeploymentStateCache = HashMap<&'static str, DeploymentState>;

/// Cached version-bits activation oracle. All predicates are evaluated
/// against the parent of the block under consideration.
#[derive(Default, Debug)]
pub struct Deployments {
	cache: Mutex<DeploymentStateCache>,
}

impl Deployments {
	pub fn new() -> Self {
		Deployments::default()
	}

	/// Returns true if the csv deployment is active after `prev`.
	pub fn csv(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		let mut cache = self.cache.lock();
		threshold_state(&mut cache, consensus.csv_deployment, index, prev, consensus).is_active()
	}

	/// Returns true if the segwit deployment is active after `prev`.
	pub fn segwit(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		let mut cache = self.cache.lock();
		threshold_state(&mut cache, consensus.segwit_deployment, index, prev, consensus).is_active()
	}

	/// Returns true if forge-mined blocks are accepted after `prev`.
	pub fn forge(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		let mut cache = self.cache.lock();
		threshold_state(&mut cache, consensus.forge_deployment, index, prev, consensus).is_active()
	}

	/// Returns true if Forge 1.1 rules apply after `prev`.
	pub fn forge11(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		let mut cache = self.cache.lock();
		threshold_state(&mut cache, consensus.forge11_deployment, index, prev, consensus).is_active()
	}

	/// Returns true if Forge 1.2 rules apply after `prev`.
	pub fn forge12(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		let mut cache = self.cache.lock();
		threshold_state(&mut cache, consensus.forge12_deployment, index, prev, consensus).is_active()
	}

	/// Returns true if Forge 1.3 rules apply after `prev`. Forge 1.3
	/// activates at a fixed height rather than by version bits.
	pub fn forge13(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> bool {
		index.entry(prev).height >= consensus.forge13_height
	}

	/// Resolves the forge protocol version in effect for a block whose
	/// parent is `prev`, or `None` when Forge is not active at all.
	/// Versions are selected as a strictly increasing cascade.
	pub fn forge_version(&self, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> Option<ForgeVersion> {
		if !self.forge(index, prev, consensus) {
			return None;
		}

		if self.forge13(index, prev, consensus) {
			Some(ForgeVersion::V13)
		} else if self.forge12(index, prev, consensus) {
			Some(ForgeVersion::V12)
		} else if self.forge11(index, prev, consensus) {
			Some(ForgeVersion::V11)
		} else {
			Some(ForgeVersion::V10)
		}
	}
}

/// Height of the version-bits boundary block for the period containing
/// `block`.
fn first_of_the_period(block: u32, miner_confirmation_window: u32) -> u32 {
	if block < miner_confirmation_window - 1 {
		0
	} else {
		block - ((block + 1) % miner_confirmation_window)
	}
}

fn count_deployment_matches(index: &BlockIndex, boundary: EntryId, deployment: Deployment, window: u32) -> usize {
	let mut count = 0;
	let mut walk = Some(boundary);
	for _ in 0..window {
		let current = match walk {
			Some(id) => id,
			None => break,
		};
		let entry = index.entry(current);
		if deployment.matches(entry.header.version as u32) {
			count += 1;
		}
		walk = entry.prev;
	}

	count
}

/// Calculates the threshold state of the given deployment at `prev`.
fn threshold_state(cache: &mut DeploymentStateCache, deployment: Deployment, index: &BlockIndex, prev: EntryId, consensus: &ConsensusParams) -> ThresholdState {
	if let Some(activation) = deployment.activation {
		if activation <= index.entry(prev).height {
			return ThresholdState::Active;
		} else {
			return ThresholdState::Defined;
		}
	}

	let window = consensus.miner_confirmation_window;
	let boundary_height = first_of_the_period(index.entry(prev).height, window);
	let boundary = index.ancestor(prev, boundary_height)
		.expect("boundary_height <= prev height; qed");
	let boundary_hash = index.entry(boundary).hash.clone();

	// by checking the hash, we make sure we are on the same branch
	if let Some(cached) = cache.get(deployment.name) {
		if cached.boundary_height == boundary_height && cached.boundary_hash == boundary_hash {
			return cached.state;
		}
	}

	let state = walk_threshold_state(deployment, index, prev, boundary_height, boundary_hash, consensus);
	let result = state.state;
	cache.insert(deployment.name, state);
	result
}

/// Replays the version-bits state machine over all period boundaries on
/// the branch of `prev`, up to and including `boundary_height`.
fn walk_threshold_state(deployment: Deployment, index: &BlockIndex, prev: EntryId, boundary_height: u32, boundary_hash: H256, consensus: &ConsensusParams) -> DeploymentState {
	let window = consensus.miner_confirmation_window;
	let mut state = ThresholdState::Defined;

	let mut height = 0;
	loop {
		let boundary = index.ancestor(prev, height)
			.expect("boundary heights never exceed prev height; qed");
		let median = median_time_past(index, boundary);

		state = match state {
			ThresholdState::Defined => {
				if median >= deployment.timeout {
					ThresholdState::Failed
				} else if median >= deployment.start_time {
					ThresholdState::Started
				} else {
					ThresholdState::Defined
				}
			},
			ThresholdState::Started => {
				if median >= deployment.timeout {
					ThresholdState::Failed
				} else {
					let count = count_deployment_matches(index, boundary, deployment, window);
					if count >= consensus.rule_change_activation_threshold as usize {
						ThresholdState::LockedIn
					} else {
						ThresholdState::Started
					}
				}
			},
			ThresholdState::LockedIn => ThresholdState::Active,
			final_state @ ThresholdState::Failed | final_state @ ThresholdState::Active => final_state,
		};

		if height == boundary_height {
			break;
		}
		// boundaries after genesis sit at heights congruent to window - 1
		height = if height == 0 { window - 1 } else { height + window };
	}

	DeploymentState {
		boundary_height: boundary_height,
		boundary_hash: boundary_hash,
		state: state,
	}
}

#[cfg(test)]
mod tests {
	use chain::BlockHeader;
	use network::{ConsensusParams, Network};
	use primitives::bigint::U256;
	use primitives::compact::Compact;
	use storage::{BlockIndex, EntryId};
	use super::{Deployments, ForgeVersion, first_of_the_period};

	#[test]
	fn test_first_of_the_period() {
		let window = 2016;
		assert_eq!(0, first_of_the_period(0, window));
		assert_eq!(0, first_of_the_period(1, window));
		assert_eq!(0, first_of_the_period(2014, window));
		assert_eq!(2015, first_of_the_period(2015, window));
		assert_eq!(2015, first_of_the_period(2016, window));
		assert_eq!(8063, first_of_the_period(8063, window));
		assert_eq!(8063, first_of_the_period(10000, window));
		assert_eq!(8063, first_of_the_period(10001, window));
	}

	fn build_chain(len: u32, version: i32) -> (BlockIndex, Vec<EntryId>) {
		let mut index = BlockIndex::new();
		let mut ids = Vec::new();
		let mut header = BlockHeader {
			version: version,
			previous_header_hash: Default::default(),
			merkle_root_hash: Default::default(),
			time: 1_000_000,
			bits: Compact::new(0x207fffff),
			nonce: 0,
		};
		ids.push(index.insert(header.clone(), false, U256::one()).unwrap());
		for _ in 1..len {
			let next = BlockHeader {
				version: version,
				previous_header_hash: header.hash(),
				merkle_root_hash: Default::default(),
				time: header.time + 10,
				bits: Compact::new(0x207fffff),
				nonce: 0,
			};
			ids.push(index.insert(next.clone(), false, U256::one()).unwrap());
			header = next;
		}
		(index, ids)
	}

	#[test]
	fn test_forge_version_cascade_on_regtest() {
		// on regtest all bit deployments are always active, and forge 1.3
		// activates at a fixed height
		let consensus = ConsensusParams::new(Network::Regtest);
		let deployments = Deployments::new();
		let (index, ids) = build_chain(10, 4);

		assert!(deployments.forge(&index, ids[9], &consensus));
		assert_eq!(deployments.forge_version(&index, ids[9], &consensus), Some(ForgeVersion::V12));
	}

	#[test]
	fn test_forge13_by_height() {
		let mut consensus = ConsensusParams::new(Network::Regtest);
		consensus.forge13_height = 8;
		let deployments = Deployments::new();
		let (index, ids) = build_chain(10, 4);

		assert_eq!(deployments.forge_version(&index, ids[7], &consensus), Some(ForgeVersion::V12));
		assert_eq!(deployments.forge_version(&index, ids[8], &consensus), Some(ForgeVersion::V13));
		assert_eq!(deployments.forge_version(&index, ids[9], &consensus), Some(ForgeVersion::V13));
	}

	#[test]
	fn test_bit_deployment_activates_over_periods() {
		// tiny window for the test
		let mut consensus = ConsensusParams::new(Network::Regtest);
		consensus.miner_confirmation_window = 4;
		consensus.rule_change_activation_threshold = 3;
		consensus.forge11_deployment.activation = None;
		consensus.forge11_deployment.start_time = 0;
		consensus.forge11_deployment.timeout = u32::max_value();

		// all blocks signal bit 9 with version-bits top bits set
		let signalling_version = (0x20000000u32 | (1 << 9)) as i32;
		let (index, ids) = build_chain(20, signalling_version);
		let deployments = Deployments::new();

		// Started at boundary 0, LockedIn at boundary 3, Active from boundary 7
		assert!(!deployments.forge11(&index, ids[2], &consensus));
		assert!(!deployments.forge11(&index, ids[3], &consensus));
		assert!(deployments.forge11(&index, ids[7], &consensus));
		assert!(deployments.forge11(&index, ids[19], &consensus));
	}
}
