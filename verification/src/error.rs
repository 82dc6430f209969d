use primitives::compact::Compact;

#[derive(Debug, PartialEq)]
/// Block verification errors raised by the consensus core.
pub enum Error {
	/// Invalid proof-of-work (block hash does not satisfy nBits)
	Pow,
	/// nBits do not match difficulty rules
	Difficulty { expected: Compact, actual: Compact },
	/// Invalid timestamp
	Timestamp,
	/// First transaction is not a coinbase transaction
	Coinbase,
	/// Forge proof rejected
	Forge(ForgeError),
}

impl From<ForgeError> for Error {
	fn from(err: ForgeError) -> Self {
		Error::Forge(err)
	}
}

#[derive(Debug, PartialEq)]
/// Reasons a forge-mined block is rejected.
pub enum ForgeError {
	/// Block declares itself forge-mined but Forge is not active at its parent.
	Activation,
	/// Forge block follows forge when not allowed, or too many consecutive
	/// forge blocks.
	Interleaving(&'static str),
	/// Malformed forge coinbase: wrong vout count, short proof script,
	/// wrong opcode prefix or size markers.
	Structural(&'static str),
	/// Hammer hash over target, failed signature recovery, signer not
	/// matching the gold destination, or claimed creation height mismatch.
	Proof(&'static str),
	/// Referenced hammer creation is still gestating or already dead.
	Maturity(&'static str),
	/// Community contribution indicated but missing, paying the wrong
	/// script, or paying the wrong amount.
	Donation(&'static str),
	/// Referenced outpoint is not a valid hammer creation, or it did not
	/// create enough hammers for the claimed nonce.
	Bct(&'static str),
	/// Neither the UTXO set nor the block store could resolve required
	/// data; fatal for the block under validation.
	DataUnavailable,
}
