//! Forgecoin chain primitives: blocks, headers and transactions.

extern crate rustc_hex as hex;
extern crate primitives;
extern crate forgecrypto as crypto;
extern crate serialization as ser;

mod block;
mod block_header;
mod constants;
mod merkle_root;
mod transaction;

pub use primitives::{hash, bytes, compact};

pub use self::block::Block;
pub use self::block_header::BlockHeader;
pub use self::constants::{SEQUENCE_FINAL, LOCKTIME_THRESHOLD, COIN};
pub use self::merkle_root::{merkle_root, merkle_node_hash};
pub use self::transaction::{Transaction, TransactionInput, TransactionOutput, OutPoint};
