//! Forgecoin consensus verification: deployment activation, proof-of-work
//! and forge difficulty, chain-work accounting and forge proof validation.

extern crate byteorder;
#[macro_use]
extern crate lazy_static;
extern crate parking_lot;
#[macro_use]
extern crate log;

extern crate chain;
extern crate forgecrypto as crypto;
extern crate keys;
extern crate network;
extern crate primitives;
extern crate script;
extern crate serialization as ser;
extern crate storage;

mod chain_work;
mod deployments;
mod error;
mod forge;
mod forge_work;
mod hammer;
mod timestamp;
mod verify_header;
mod work;

pub use primitives::{hash, compact};

pub use chain_work::{block_work, work_from_target, forge_k, pow_k};
pub use deployments::{Deployments, ForgeVersion};
pub use error::{Error, ForgeError};
pub use forge::{
	ForgeProof, deterministic_rand_string, forge_message, hammer_hash,
	check_interleaving, verify_forge_block, FORGE_PROOF_SCRIPT_SIZE,
};
pub use forge_work::{forge_work_required, forge_difficulty};
pub use hammer::{
	BctOutput, HammerStatus, ForgeNetworkInfo, HammerPopPoint, hammer_cost,
	hammer_status, parse_bct, creation_script, community_script,
	network_forge_info,
};
pub use timestamp::median_time_past;
pub use verify_header::{accept_header, expected_bits};
pub use work::{
	block_subsidy, is_valid_proof_of_work, is_valid_proof_of_work_hash,
	work_required,
};
