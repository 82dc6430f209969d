use crypto::dhash256;
use hash::H256;

/// Calculates the root of the merkle tree
/// https://en.bitcoin.it/wiki/Protocol_documentation#Merkle_Trees
pub fn merkle_root<T: AsRef<H256>>(hashes: &[T]) -> H256 {
	if hashes.len() == 1 {
		return hashes[0].as_ref().clone();
	}

	let mut row = Vec::with_capacity(hashes.len() / 2 + 1);
	let mut i = 0;
	while i + 1 < hashes.len() {
		row.push(merkle_node_hash(&hashes[i], &hashes[i + 1]));
		i += 2;
	}

	// duplicate the last element if len is not even
	if hashes.len() % 2 == 1 {
		let last = &hashes[hashes.len() - 1];
		row.push(merkle_node_hash(last, last));
	}

	merkle_root(&row)
}

/// Calculates merkle tree node hash
pub fn merkle_node_hash<T>(left: T, right: T) -> H256 where T: AsRef<H256> {
	let mut concat = [0u8; 64];
	concat[0..32].copy_from_slice(&**left.as_ref());
	concat[32..64].copy_from_slice(&**right.as_ref());
	dhash256(&concat)
}
