//! Forgecoin forge mining: the parallel hammer search, forge block
//! assembly and the hammer-keeper orchestrator.

#[macro_use]
extern crate log;
extern crate num_cpus;
extern crate parking_lot;

extern crate chain;
extern crate keys;
extern crate network;
extern crate primitives;
extern crate script;
extern crate storage;
extern crate verification;

mod block_assembler;
mod config;
mod hammer_keeper;
mod hammer_search;

pub use block_assembler::create_forge_block;
pub use config::ForgeConfig;
pub use hammer_keeper::{BlockSubmitter, ForgeWallet, HammerKeeper, NodeStatus};
pub use hammer_search::{
	AbortHandle, BctSummary, HammerRange, SearchSession, SearchSolution,
	partition_hammers,
};
