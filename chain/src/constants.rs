/// Setting nSequence to this value for every input in a transaction
/// disables the lock_time feature
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Threshold for `lock_time`: below this value it is interpreted
/// as a block number, otherwise as UNIX timestamp
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// One coin in its smallest indivisible units
pub const COIN: u64 = 100_000_000;
