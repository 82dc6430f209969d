//! Contextual header checks shared by both block kinds: the declared
//! bits must match the difficulty rules and the time must advance past
//! the ancestors' median.

use chain::BlockHeader;
use network::ConsensusParams;
use storage::{BlockIndex, EntryId};
use deployments::{Deployments, ForgeVersion};
use error::{Error, ForgeError};
use forge_work::forge_work_required;
use timestamp::median_time_past;
use work::work_required;

/// The bits required for a header extending `prev`: the forge target for
/// forge-marked headers, the PoW target otherwise.
pub fn expected_bits(header: &BlockHeader, prev: EntryId, index: &BlockIndex, consensus: &ConsensusParams, deployments: &Deployments) -> Result<u32, Error> {
	if consensus.is_forge_marked(header) {
		let version = deployments.forge_version(index, prev, consensus)
			.ok_or(Error::Forge(ForgeError::Activation))?;
		Ok(forge_work_required(index, prev, consensus, version).into())
	} else {
		let forge11 = deployments.forge_version(index, prev, consensus)
			.map_or(false, |version| version >= ForgeVersion::V11);
		Ok(work_required(index, prev, forge11, header.time, consensus).into())
	}
}

/// Verifies a candidate header against its parent: difficulty rules and
/// the median-time-past bound.
pub fn accept_header(header: &BlockHeader, prev: EntryId, index: &BlockIndex, consensus: &ConsensusParams, deployments: &Deployments) -> Result<(), Error> {
	let expected = expected_bits(header, prev, index, consensus, deployments)?;
	if u32::from(header.bits) != expected {
		return Err(Error::Difficulty {
			expected: expected.into(),
			actual: header.bits,
		});
	}

	if header.time <= median_time_past(index, prev) {
		return Err(Error::Timestamp);
	}

	Ok(())
}
