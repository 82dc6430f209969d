//! Block index and chain view for the Forge consensus core, plus the
//! provider traits through which the core reads host-owned storage
//! (full blocks and the UTXO set).

extern crate chain;
extern crate primitives;

mod block_chain;
mod block_index;
mod provider;

pub use primitives::{hash, bytes};

pub use block_chain::{Chain, ChainState};
pub use block_index::{BlockIndex, BlockIndexEntry, EntryId, skip_height};
pub use provider::{BlockProvider, CoinProvider, Coin};
