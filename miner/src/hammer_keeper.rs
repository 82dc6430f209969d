//! The hammer keeper: a long-lived task that watches the tip and, on
//! every advance, races the wallet's ready hammers against the forge
//! target.

use std::cmp;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use parking_lot::RwLock;
use chain::Block;
use keys::{AddressHash, CompactSignature, Message};
use network::ConsensusParams;
use script::Builder;
use storage::ChainState;
use verification::{
	Deployments, ForgeProof, HammerStatus,
	check_interleaving, deterministic_rand_string, forge_message,
	forge_work_required, median_time_past,
};
use block_assembler::create_forge_block;
use config::ForgeConfig;
use hammer_search::{BctSummary, SearchSession, partition_hammers};

/// Wallet capabilities the forge miner needs: the set of owned hammer
/// creations and a signature over the deterministic message.
pub trait ForgeWallet: Send + Sync {
	/// All hammer creations owned by the wallet, with lifecycle status
	/// resolved against the current tip.
	fn bcts(&self) -> Vec<BctSummary>;
	/// Signs the forge message with the key of the given address.
	fn sign_forge_message(&self, address: &AddressHash, message: &Message) -> Option<CompactSignature>;
	/// Whether the key store is currently locked.
	fn is_locked(&self) -> bool;
}

/// Entry point for submitting an assembled block to the node.
pub trait BlockSubmitter: Send + Sync {
	fn submit_block(&self, block: Block) -> bool;
}

/// Node-level conditions that gate forge mining.
pub trait NodeStatus: Send + Sync {
	fn is_initial_block_download(&self) -> bool;
	fn peer_count(&self) -> usize;
}

/// The orchestrator: polls the tip and triggers one hammer search per
/// tip advance. All failures degrade to skipping the tip.
pub struct HammerKeeper {
	chain: Arc<RwLock<ChainState>>,
	consensus: ConsensusParams,
	deployments: Arc<Deployments>,
	wallet: Arc<dyn ForgeWallet>,
	submitter: Arc<dyn BlockSubmitter>,
	status: Arc<dyn NodeStatus>,
	config: ForgeConfig,
	stopping: Arc<AtomicBool>,
}

impl HammerKeeper {
	pub fn new(
		chain: Arc<RwLock<ChainState>>,
		consensus: ConsensusParams,
		deployments: Arc<Deployments>,
		wallet: Arc<dyn ForgeWallet>,
		submitter: Arc<dyn BlockSubmitter>,
		status: Arc<dyn NodeStatus>,
		config: ForgeConfig,
	) -> Self {
		HammerKeeper {
			chain: chain,
			consensus: consensus,
			deployments: deployments,
			wallet: wallet,
			submitter: submitter,
			status: status,
			config: config,
			stopping: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Flag shared with `run` to stop the keeper loop.
	pub fn stop_handle(&self) -> Arc<AtomicBool> {
		self.stopping.clone()
	}

	/// The keeper loop: on every observed tip advance, run one search.
	pub fn run(&self) {
		info!(target: "forge", "hammer keeper started");
		let mut height = self.chain.read().best_block().map(|(_, height, _)| height);

		while !self.stopping.load(Ordering::SeqCst) {
			thread::sleep(Duration::from_millis(cmp::max(1, self.config.check_delay_ms)));

			let new_height = self.chain.read().best_block().map(|(_, height, _)| height);
			if new_height != height {
				height = new_height;
				self.busy_hammers();
			}
		}

		info!(target: "forge", "hammer keeper stopped");
	}

	/// Attempts to forge the next block on the current tip. Returns true
	/// only if a block was assembled and accepted by the submitter.
	pub fn busy_hammers(&self) -> bool {
		// resolve everything tip-dependent under a single read lock
		let (tip_hash, tip_height, target_bits, det_rand, block_time) = {
			let chain = self.chain.read();
			let (tip, tip_height, tip_hash) = match chain.best_block() {
				Some(best) => best,
				None => return false,
			};

			let version = match self.deployments.forge_version(&chain.index, tip, &self.consensus) {
				Some(version) => version,
				None => {
					trace!(target: "forge", "skipping forge check: the forge is not enabled on the network");
					return false;
				},
			};

			if check_interleaving(&chain.index, tip, &self.consensus, version).is_err() {
				trace!(target: "forge", "skipping forge check: a PoW block is required next");
				return false;
			}

			let target_bits = forge_work_required(&chain.index, tip, &self.consensus, version);
			let det_rand = deterministic_rand_string(&tip_hash);
			let block_time = cmp::max(median_time_past(&chain.index, tip) + 1, unix_time());
			(tip_hash, tip_height, target_bits, det_rand, block_time)
		};

		if self.status.peer_count() == 0 {
			trace!(target: "forge", "skipping forge check: not connected");
			return false;
		}
		if self.status.is_initial_block_download() {
			trace!(target: "forge", "skipping forge check: in initial block download");
			return false;
		}
		if self.wallet.is_locked() {
			trace!(target: "forge", "skipping forge check: wallet is locked");
			return false;
		}

		let target = match target_bits.to_u256() {
			Ok(target) => target,
			Err(_) => return false,
		};

		let bcts: Vec<BctSummary> = self.wallet.bcts().into_iter()
			.filter(|bct| bct.status == HammerStatus::Ready)
			.collect();
		let total_hammers: u64 = bcts.iter().map(|bct| bct.hammer_count as u64).sum();
		if total_hammers == 0 {
			trace!(target: "forge", "skipping forge check: no ready hammers");
			return false;
		}

		let threads = self.config.resolve_thread_count(::num_cpus::get());
		let bins = partition_hammers(&bcts, threads);
		info!(target: "forge", "checking {} hammers against the forge target with {} threads", total_hammers, bins.len());

		// race the workers, with a watcher aborting on tip change
		let session = SearchSession::new();
		let watcher = if self.config.early_out {
			let abort = session.abort_handle();
			let chain = self.chain.clone();
			let delay = cmp::max(1, self.config.check_delay_ms);
			Some(thread::Builder::new()
				.name("forge-watcher".into())
				.spawn(move || {
					loop {
						thread::sleep(Duration::from_millis(delay));
						if abort.is_finished() {
							return;
						}
						let height = chain.read().best_block().map(|(_, height, _)| height);
						if height != Some(tip_height) {
							abort.abort();
							return;
						}
					}
				})
				.expect("thread spawning only fails on resource exhaustion; qed"))
		} else {
			None
		};

		let solution = session.run(bins, &det_rand, target);

		if let Some(watcher) = watcher {
			// wake the watcher up even if nothing aborted the search
			session.abort_handle().abort();
			watcher.join().expect("watcher thread does not panic; qed");
		}

		let solution = match solution {
			Some(solution) => solution,
			None => {
				trace!(target: "forge", "no hammer meets the forge target");
				return false;
			},
		};

		info!(target: "forge", "hammer #{} of creation {} meets the forge target",
			solution.hammer_index, solution.range.txid.to_reversed_str());

		// sign the proof with the gold address key
		let signature = match self.wallet.sign_forge_message(&solution.range.gold_address, &forge_message(&det_rand)) {
			Some(signature) => signature,
			None => {
				warn!(target: "forge", "could not sign the forge proof; skipping this tip");
				return false;
			},
		};

		let proof = ForgeProof {
			hammer_nonce: solution.hammer_index,
			bct_height: solution.range.bct_height,
			community_contrib: solution.range.community_contrib,
			txid: solution.range.txid.clone(),
			signature: signature,
		};

		// transaction selection is the host's concern; a forge coinbase
		// alone is always valid
		let block = create_forge_block(
			tip_hash.clone(),
			tip_height + 1,
			block_time,
			target_bits,
			&proof,
			Builder::build_p2pkh(&solution.range.gold_address),
			Vec::new(),
			0,
			None,
			&self.consensus,
		);

		// refuse to submit a block that became stale during the search
		{
			let chain = self.chain.read();
			if chain.best_block().map(|(_, _, hash)| hash) != Some(tip_hash) {
				info!(target: "forge", "generated forge block is stale; skipping");
				return false;
			}
		}

		if !self.submitter.submit_block(block) {
			warn!(target: "forge", "forge block was not accepted");
			return false;
		}

		info!(target: "forge", "forge block mined at height {}", tip_height + 1);
		true
	}
}

fn unix_time() -> u32 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_secs() as u32)
		.unwrap_or_default()
}
