// Mining queues and the mining task

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::chain::{Chain, Ledger};
use crate::consensus::{MineOutcome, Miner, TxVerifyError, verify_transaction};
use crate::contract;
use crate::core::{BlockBody, Contract, Transaction, now_millis};
use crate::network::{Message, Network};
use crate::wallet::RsaKeys;

/// Marker bytes carried in the coinbase input instead of a signature
pub const COINBASE_MARKER: &[u8] = b"coinbase-marker";

#[derive(Debug, Clone, Copy)]
pub struct MinerSettings {
    /// Required leading-zero-bit count of a block hash
    pub difficulty_bits: u32,
    pub block_reward: u64,
    /// Attempts per second, 0 for unthrottled
    pub max_hash_rate: u32,
}

impl Default for MinerSettings {
    fn default() -> Self {
        Self { difficulty_bits: 20, block_reward: 100, max_hash_rate: 0 }
    }
}

/// Why a submission was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("already queued")]
    Duplicate,
    #[error("transaction rejected: {0}")]
    Rejected(#[from] TxVerifyError),
}

#[derive(Default)]
struct Queues {
    transactions: Vec<Transaction>,
    contracts: Vec<Contract>,
}

struct MinerTask {
    cancel: Arc<AtomicBool>,
    generation: u64,
}

/// Owns the pending queues and at most one mining task. Completions carry
/// the generation their task was started under; stopping bumps the
/// generation, so a completion of a superseded task is discarded instead
/// of appending to a chain that moved on.
pub struct MiningController {
    ledger: Arc<Ledger>,
    network: Arc<dyn Network>,
    keys: RsaKeys,
    settings: MinerSettings,
    queues: Mutex<Queues>,
    task: Mutex<Option<MinerTask>>,
    generation: AtomicU64,
}

impl MiningController {
    pub fn new(
        ledger: Arc<Ledger>,
        network: Arc<dyn Network>,
        keys: RsaKeys,
        settings: MinerSettings,
    ) -> Self {
        Self {
            ledger,
            network,
            keys,
            settings,
            queues: Mutex::new(Queues::default()),
            task: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Queue a transaction for the next block. It must verify against the
    /// current chain, unspent outputs included, and not be queued already.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), SubmitError> {
        {
            let chain = self.ledger.read();
            verify_transaction(&chain, &tx, true)?;
        }

        let mut queues = self.lock_queues();
        let id = tx.id();
        if queues.transactions.iter().any(|queued| queued.id() == id) {
            return Err(SubmitError::Duplicate);
        }
        queues.transactions.push(tx);
        Ok(())
    }

    /// Queue a contract for the next block. Contracts are only deduped,
    /// never validated; a bogus one simply never pays out.
    pub fn submit_contract(&self, contract: Contract) -> Result<(), SubmitError> {
        let mut queues = self.lock_queues();
        let id = contract.id();
        if queues.contracts.iter().any(|queued| queued.id() == id) {
            return Err(SubmitError::Duplicate);
        }
        queues.contracts.push(contract);
        Ok(())
    }

    /// Drop queued entries a committed block carries
    pub fn remove_committed(&self, body: &BlockBody) {
        let tx_ids: Vec<_> = body.transactions.iter().map(Transaction::id).collect();
        let contract_ids: Vec<_> = body.contracts.iter().map(Contract::id).collect();
        let mut queues = self.lock_queues();
        queues.transactions.retain(|tx| !tx_ids.contains(&tx.id()));
        queues.contracts.retain(|contract| !contract_ids.contains(&contract.id()));
    }

    /// Re-check the queues after the chain changed: entries that are now
    /// on the chain or no longer verify are dropped
    pub fn revalidate_queues(&self, chain: &Chain) {
        let mut queues = self.lock_queues();
        queues
            .transactions
            .retain(|tx| verify_transaction(chain, tx, true).is_ok());
        queues
            .transactions
            .retain(|tx| chain.find_transaction(&tx.id()).is_none());
        queues
            .contracts
            .retain(|contract| chain.find_contract(&contract.id()).is_none());
    }

    pub fn pending_transactions(&self) -> usize {
        self.lock_queues().transactions.len()
    }

    pub fn pending_contracts(&self) -> usize {
        self.lock_queues().contracts.len()
    }

    pub fn is_mining(&self) -> bool {
        self.task.lock().expect("miner task lock poisoned").is_some()
    }

    /// Assemble a candidate from the queues and spawn the mining task.
    /// No-op while a task is already running.
    pub fn start_mining(self: &Arc<Self>) {
        // Lock order is ledger before task everywhere, so holding the
        // chain while taking the slot cannot deadlock against a writer
        // stopping the miner.
        let chain = self.ledger.read();
        let mut slot = self.task.lock().expect("miner task lock poisoned");
        if slot.is_some() {
            log::warn!("block mining already running");
            return;
        }
        log::debug!("block mining starting");

        let block = self.assemble_block(&chain);

        let cancel = Arc::new(AtomicBool::new(false));
        let generation = self.generation.load(Ordering::SeqCst);
        *slot = Some(MinerTask { cancel: Arc::clone(&cancel), generation });
        drop(slot);

        let controller = Arc::clone(self);
        let miner = Miner::new(self.settings.difficulty_bits, self.settings.max_hash_rate);
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || miner.mine(&block, &cancel, None)).await;
            match result {
                Ok(outcome) => controller.on_mining_finished(generation, outcome).await,
                Err(error) => {
                    log::error!("mining task failed: {error}");
                    if controller.finish_task(generation) {
                        controller.start_mining();
                    }
                }
            }
        });
    }

    /// Cancel the running task, if any. The cancelled task's completion is
    /// discarded through the generation bump.
    pub fn stop_mining(&self) {
        log::debug!("block mining stopping");
        let mut slot = self.task.lock().expect("miner task lock poisoned");
        if let Some(task) = slot.take() {
            task.cancel.store(true, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Drain the queues into a block candidate on the current tip:
    /// coinbase first, then everything else by ascending timestamp, with
    /// contract invocations already interpreted and their issued
    /// transactions appended.
    fn assemble_block(&self, chain: &Chain) -> crate::core::Block {
        let (mut transactions, mut contracts) = {
            let mut queues = self.lock_queues();
            (std::mem::take(&mut queues.transactions), std::mem::take(&mut queues.contracts))
        };

        let mut generated = Vec::new();
        for tx in &transactions {
            if let Some(invoked) = chain.invoked_contract(tx) {
                match contract::run(chain, invoked, tx) {
                    Ok(mut produced) => generated.append(&mut produced),
                    Err(error) => {
                        log::warn!("contract invocation {} failed: {error}", tx.id());
                    }
                }
            } else if tx.inputs.len() == 1
                && tx.outputs.first().is_some_and(|output| output.pub_key.len() == 32)
            {
                log::warn!("unknown contract address in transaction {}", tx.id());
            }
        }
        transactions.append(&mut generated);

        transactions.sort_by_key(|tx| tx.timestamp);
        let coinbase = Transaction::coinbase(
            now_millis(),
            self.settings.block_reward,
            COINBASE_MARKER,
            self.keys.public_der().to_vec(),
        );
        transactions.insert(0, coinbase);

        contracts.sort_by_key(|contract| contract.timestamp);

        chain.next_block(BlockBody::new(transactions, contracts))
    }

    async fn on_mining_finished(self: &Arc<Self>, generation: u64, outcome: MineOutcome) {
        match outcome {
            MineOutcome::Cancelled => {
                log::debug!("block mining cancelled");
            }
            MineOutcome::Exhausted => {
                log::error!("block mining gave up without a solution");
                if self.finish_task(generation) {
                    self.start_mining();
                }
            }
            MineOutcome::Mined(block) => {
                // Claiming the slot and appending happen under one ledger
                // guard. A writer applying a peer block holds that guard
                // while it stops mining, so it either bumps the generation
                // before the claim or sees this block already on the chain.
                {
                    let mut chain = self.ledger.write();
                    if !self.finish_task(generation) {
                        log::debug!("discarding stale mined block #{}", block.id);
                        return;
                    }
                    chain.push(block.clone());
                }
                log::debug!("block #{} mined: {}", block.id, block.hash);

                if let Err(error) = self.network.broadcast(Message::NewBlock(block), &[]).await {
                    log::error!("block broadcast failed: {error}");
                }
                self.start_mining();
            }
        }
    }

    /// Clear the task slot if it still belongs to this generation. Returns
    /// false for completions of superseded tasks.
    fn finish_task(&self, generation: u64) -> bool {
        let mut slot = self.task.lock().expect("miner task lock poisoned");
        match slot.as_ref() {
            Some(task) if task.generation == generation => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    fn lock_queues(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().expect("miner queue lock poisoned")
    }
}
