//! Minimal script model for the Forge consensus core: the output script
//! patterns the core must build and recognise (P2PKH payouts, hammer
//! creation scripts and the forge proof prefix). Full script interpretation
//! is the responsibility of the host node.

extern crate primitives;
extern crate keys;

mod builder;
mod opcode;
mod script;

pub use primitives::bytes;

pub use builder::Builder;
pub use opcode::Opcode;
pub use script::Script;
