use chain::BlockHeader;
use primitives::bigint::U256;
use primitives::hash::H160;
use {Network, Deployment};

/// Scale of the fixed-point forge difficulty: a difficulty of 1.0 is
/// represented as 10^12. Forge difficulty is the ratio of the standard
/// difficulty-1 target (compact 0x1d00ffff) to the block's forge target,
/// and is consensus-critical input to the chain-work bonus, so it is
/// carried in integer Q-form rather than floating point.
pub const FORGE_DIFF_SCALE: u64 = 1_000_000_000_000;

lazy_static! {
	static ref POW_LIMIT_FORGE: U256 = "0fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".parse()
		.expect("hardcoded value should parse without errors");
	static ref POW_LIMIT_FORGE_2: U256 = "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff".parse()
		.expect("hardcoded value should parse without errors");
}

#[derive(Debug, Clone)]
/// Parameters that influence chain consensus.
pub struct ConsensusParams {
	/// Network.
	pub network: Network,

	/// Interval at which the block subsidy halves.
	pub subsidy_halving_interval: u32,
	/// Height at which the total money supply is reached; no subsidy is
	/// issued past this point.
	pub total_money_supply_height: u32,

	/// Maximum (easiest) proof-of-work target.
	pub pow_limit: U256,
	/// Testnet rule: allow a min-difficulty block when no block has been
	/// found for twice the target spacing.
	pub allow_min_difficulty_blocks: bool,
	/// Regtest rule: never retarget.
	pub no_pow_retargeting: bool,
	/// Target seconds between blocks.
	pub pow_target_spacing: u32,
	/// Seconds per legacy retargeting period.
	pub pow_target_timespan: u32,
	/// Height of the last block mined with the legacy hash function;
	/// Dark Gravity Wave is used above it.
	pub last_scrypt_block: u32,

	/// Number of blocks signalling within a confirmation window required
	/// to lock a deployment in.
	pub rule_change_activation_threshold: u32,
	/// Number of blocks per version-bits confirmation window.
	pub miner_confirmation_window: u32,
	/// Version-bits testing deployment.
	pub testdummy_deployment: Deployment,
	/// BIP68, BIP112, BIP113 deployment.
	pub csv_deployment: Deployment,
	/// BIP141, BIP143, BIP147 deployment.
	pub segwit_deployment: Deployment,
	/// Forge deployment: forge-mined blocks are accepted once active.
	pub forge_deployment: Deployment,
	/// Forge 1.1 deployment: SMA difficulty, consecutive-forge limit,
	/// chain-work bonuses.
	pub forge11_deployment: Deployment,
	/// Forge 1.2 deployment: widened forge target and second k range.
	pub forge12_deployment: Deployment,
	/// Forge 1.3 activates at a fixed height, not by version bits.
	pub forge13_height: u32,

	/// Minimum cost of a hammer, used when block rewards run out.
	pub min_hammer_cost: u64,
	/// Hammer cost is block_subsidy / hammer_cost_factor.
	pub hammer_cost_factor: u64,
	/// Key hash of the unspendable hammer creation address.
	pub hammer_creation_address: H160,
	/// Key hash of the community fund address.
	pub forge_community_address: H160,
	/// Optional donation is donation = (fee + donation) / community_contrib_factor.
	pub community_contrib_factor: u64,
	/// Number of blocks before a new hammer is ready to forge.
	pub hammer_gestation_blocks: u32,
	/// Number of blocks a hammer lives for after gestation.
	pub hammer_lifespan_blocks: u32,
	/// Maximum (easiest) hammer hash target.
	pub pow_limit_forge: U256,
	/// Maximum (easiest) hammer hash target from Forge 1.2.
	pub pow_limit_forge2: U256,
	/// Difficulty walks don't look below this height for forge blocks.
	pub min_forge_check_height: u32,
	/// Snap speed of the 1.0 hammer hash target EMA.
	pub forge_target_adjust_aggression: u32,
	/// One of this many blocks should be forge-mined.
	pub forge_block_spacing_target: u32,
	/// Observed forge block frequency before 1.1.
	pub forge_block_spacing_target_typical: u32,
	/// Observed forge block frequency from 1.1.
	pub forge_block_spacing_target_typical_11: u32,
	/// Header nonce marking a forge-mined block.
	pub forge_nonce_marker: u32,

	/// Minimum chain-work scale for forge blocks under 1.1.
	pub min_k: u32,
	/// Maximum chain-work scale for forge blocks under 1.1.
	pub max_k: u32,
	/// Minimum chain-work scale for forge blocks under 1.2.
	pub min_k2: u32,
	/// Maximum chain-work scale for forge blocks under 1.2.
	pub max_k2: u32,
	/// Forge difficulty at which the maximum chain-work bonus is awarded,
	/// in `FORGE_DIFF_SCALE` units.
	pub max_forge_diff: u64,
	/// Maximum chain-work scale for PoW blocks.
	pub max_k_pow: u32,
	/// Below this forge difficulty (`FORGE_DIFF_SCALE` units) the PoW
	/// chain-work bonus is halved.
	pub pow_split1: u64,
	/// Below this forge difficulty (`FORGE_DIFF_SCALE` units) the PoW
	/// chain-work bonus is halved again.
	pub pow_split2: u64,
	/// Maximum forge blocks that can occur consecutively before a PoW
	/// block is required.
	pub max_consecutive_forge_blocks: u32,
	/// SMA window of the 1.1 forge difficulty adjustment.
	pub forge_difficulty_window: u32,
	/// SMA window of the 1.2/1.3 forge difficulty adjustment.
	pub forge_difficulty_window2: u32,
}

impl ConsensusParams {
	pub fn new(network: Network) -> Self {
		match network {
			Network::Mainnet => ConsensusParams {
				network: network,
				subsidy_halving_interval: 8_400_000,
				total_money_supply_height: 75_600_000,
				pow_limit: network.max_bits(),
				allow_min_difficulty_blocks: false,
				no_pow_retargeting: false,
				pow_target_spacing: 10,
				pow_target_timespan: 3840,
				last_scrypt_block: 0,
				rule_change_activation_threshold: 1920, // 75% of 2560
				miner_confirmation_window: 2560,
				testdummy_deployment: Deployment {
					name: "testdummy",
					bit: 28,
					start_time: 1199145601,
					timeout: 1230767999,
					activation: None,
				},
				csv_deployment: Deployment {
					name: "csv",
					bit: 0,
					start_time: 1485561600,
					timeout: 1517356801,
					activation: None,
				},
				segwit_deployment: Deployment {
					name: "segwit",
					bit: 1,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge_deployment: Deployment {
					name: "forge",
					bit: 7,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge11_deployment: Deployment {
					name: "forge_1_1",
					bit: 9,
					start_time: 1585901581,
					timeout: 1617437580,
					activation: None,
				},
				forge12_deployment: Deployment {
					name: "forge_1_2",
					bit: 10,
					start_time: 1586476800,
					timeout: 1618012800,
					activation: None,
				},
				forge13_height: 150_000,
				min_hammer_cost: 10_000,
				hammer_cost_factor: 2500,
				hammer_creation_address: "3c6a8c2471a5c6982fedd9b2fa4cb71a3667efab".into(),
				forge_community_address: "941fca5a3da83e229af56b30b3b5aafbe7b676c0".into(),
				community_contrib_factor: 10,
				hammer_gestation_blocks: 48 * 24,
				hammer_lifespan_blocks: 48 * 24 * 14,
				pow_limit_forge: POW_LIMIT_FORGE.clone(),
				pow_limit_forge2: POW_LIMIT_FORGE_2.clone(),
				min_forge_check_height: 125,
				forge_target_adjust_aggression: 30,
				forge_block_spacing_target: 2,
				forge_block_spacing_target_typical: 3,
				forge_block_spacing_target_typical_11: 2,
				forge_nonce_marker: 192,
				min_k: 2,
				max_k: 16,
				min_k2: 1,
				max_k2: 7,
				max_forge_diff: 6_000_000_000,  // 0.006
				max_k_pow: 5,
				pow_split1: 5_000_000_000,      // 0.005
				pow_split2: 2_500_000_000,      // 0.0025
				max_consecutive_forge_blocks: 2,
				forge_difficulty_window: 36,
				forge_difficulty_window2: 24,
			},
			Network::Testnet => ConsensusParams {
				network: network,
				subsidy_halving_interval: 8_400_000,
				total_money_supply_height: 75_600_000,
				pow_limit: network.max_bits(),
				allow_min_difficulty_blocks: true,
				no_pow_retargeting: false,
				pow_target_spacing: 10,
				pow_target_timespan: 3840,
				last_scrypt_block: 0,
				rule_change_activation_threshold: 1920,
				miner_confirmation_window: 2560,
				testdummy_deployment: Deployment {
					name: "testdummy",
					bit: 28,
					start_time: 1535587200,
					timeout: 1535587200 + 31536000,
					activation: None,
				},
				csv_deployment: Deployment {
					name: "csv",
					bit: 0,
					start_time: 1535587200,
					timeout: 1535587200 + 31536000,
					activation: None,
				},
				segwit_deployment: Deployment {
					name: "segwit",
					bit: 1,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge_deployment: Deployment {
					name: "forge",
					bit: 7,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge11_deployment: Deployment {
					name: "forge_1_1",
					bit: 9,
					start_time: 1583211600,
					timeout: 1614747600,
					activation: None,
				},
				forge12_deployment: Deployment {
					name: "forge_1_2",
					bit: 10,
					start_time: 1583211600,
					timeout: 1614747600,
					activation: None,
				},
				forge13_height: 40_000,
				min_hammer_cost: 10_000,
				hammer_cost_factor: 2500,
				hammer_creation_address: "7cd0ab3f6a574bc376ca72e92c0ce89537a8cbe4".into(),
				forge_community_address: "106a18bd6c04b7a7e8cde9ea0a284a48db36f9a5".into(),
				community_contrib_factor: 10,
				// 24 times faster than mainnet
				hammer_gestation_blocks: 24,
				hammer_lifespan_blocks: 24 * 14,
				pow_limit_forge: POW_LIMIT_FORGE.clone(),
				pow_limit_forge2: POW_LIMIT_FORGE_2.clone(),
				min_forge_check_height: 1,
				forge_target_adjust_aggression: 30,
				forge_block_spacing_target: 2,
				forge_block_spacing_target_typical: 3,
				forge_block_spacing_target_typical_11: 2,
				forge_nonce_marker: 192,
				min_k: 1,
				max_k: 7,
				min_k2: 1,
				max_k2: 7,
				max_forge_diff: 2_000_000_000,  // 0.002
				max_k_pow: 5,
				pow_split1: 1_000_000_000,      // 0.001
				pow_split2: 500_000_000,        // 0.0005
				max_consecutive_forge_blocks: 2,
				forge_difficulty_window: 24,
				forge_difficulty_window2: 24,
			},
			Network::Regtest | Network::Unitest => ConsensusParams {
				network: network,
				subsidy_halving_interval: 150,
				total_money_supply_height: 7_560_000,
				pow_limit: network.max_bits(),
				allow_min_difficulty_blocks: true,
				no_pow_retargeting: true,
				pow_target_spacing: 10,
				pow_target_timespan: 3840,
				last_scrypt_block: 0,
				rule_change_activation_threshold: 108,
				miner_confirmation_window: 144,
				testdummy_deployment: Deployment {
					name: "testdummy",
					bit: 28,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				csv_deployment: Deployment {
					name: "csv",
					bit: 0,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				segwit_deployment: Deployment {
					name: "segwit",
					bit: 1,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge_deployment: Deployment {
					name: "forge",
					bit: 7,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge11_deployment: Deployment {
					name: "forge_1_1",
					bit: 9,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge12_deployment: Deployment {
					name: "forge_1_2",
					bit: 10,
					start_time: 0,
					timeout: 0,
					activation: Some(0),
				},
				forge13_height: 500,
				min_hammer_cost: 10_000,
				hammer_cost_factor: 2500,
				hammer_creation_address: "7cd0ab3f6a574bc376ca72e92c0ce89537a8cbe4".into(),
				forge_community_address: "106a18bd6c04b7a7e8cde9ea0a284a48db36f9a5".into(),
				community_contrib_factor: 10,
				hammer_gestation_blocks: 4,
				hammer_lifespan_blocks: 4 * 14,
				pow_limit_forge: POW_LIMIT_FORGE.clone(),
				pow_limit_forge2: POW_LIMIT_FORGE_2.clone(),
				min_forge_check_height: 1,
				forge_target_adjust_aggression: 30,
				forge_block_spacing_target: 2,
				forge_block_spacing_target_typical: 3,
				forge_block_spacing_target_typical_11: 2,
				forge_nonce_marker: 192,
				min_k: 1,
				max_k: 7,
				min_k2: 1,
				max_k2: 7,
				max_forge_diff: 2_000_000_000,
				max_k_pow: 5,
				pow_split1: 1_000_000_000,
				pow_split2: 500_000_000,
				max_consecutive_forge_blocks: 2,
				forge_difficulty_window: 24,
				forge_difficulty_window2: 24,
			},
		}
	}

	pub fn difficulty_adjustment_interval(&self) -> u32 {
		self.pow_target_timespan / self.pow_target_spacing
	}

	/// True if the header carries the forge nonce marker. Whether the block
	/// is actually forge-mined additionally requires the Forge deployment
	/// to be active at its parent.
	pub fn is_forge_marked(&self, header: &BlockHeader) -> bool {
		header.nonce == self.forge_nonce_marker
	}

	/// Total number of blocks a hammer exists for after creation.
	pub fn hammer_total_lifespan(&self) -> u32 {
		self.hammer_gestation_blocks + self.hammer_lifespan_blocks
	}
}

#[cfg(test)]
mod tests {
	use super::super::Network;
	use super::ConsensusParams;

	#[test]
	fn test_consensus_params_forge_constants() {
		let main = ConsensusParams::new(Network::Mainnet);
		assert_eq!(main.hammer_gestation_blocks, 1152);
		assert_eq!(main.hammer_lifespan_blocks, 16128);
		assert_eq!(main.max_consecutive_forge_blocks, 2);
		assert_eq!(main.forge_nonce_marker, 192);
		assert_eq!(main.min_k, 2);
		assert_eq!(main.max_k, 16);
		assert_eq!(main.max_k_pow, 5);
	}

	#[test]
	fn test_consensus_params_difficulty_adjustment_interval() {
		let main = ConsensusParams::new(Network::Mainnet);
		assert_eq!(main.difficulty_adjustment_interval(), 384);
	}

	#[test]
	fn test_consensus_params_deployment_bits() {
		let main = ConsensusParams::new(Network::Mainnet);
		assert_eq!(main.forge_deployment.bit, 7);
		assert_eq!(main.forge11_deployment.bit, 9);
		assert_eq!(main.forge12_deployment.bit, 10);
		assert_eq!(main.forge_deployment.activation, Some(0));
	}

	#[test]
	fn test_regtest_deployments_always_active() {
		let regtest = ConsensusParams::new(Network::Regtest);
		assert_eq!(regtest.forge11_deployment.activation, Some(0));
		assert_eq!(regtest.forge12_deployment.activation, Some(0));
	}
}
