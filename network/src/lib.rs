//! Forgecoin network parameters: consensus constants and deployments
//! for every supported chain.

#[macro_use]
extern crate lazy_static;
extern crate chain;
extern crate primitives;

mod consensus;
mod deployments;
mod network;

pub use primitives::{hash, compact};

pub use consensus::{ConsensusParams, FORGE_DIFF_SCALE};
pub use deployments::Deployment;
pub use network::Network;
