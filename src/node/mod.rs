// The node: mining, queues and peer synchronization behind one facade

pub mod miner;
pub mod sync;

pub use miner::{COINBASE_MARKER, MinerSettings, MiningController, SubmitError};
pub use sync::SyncController;

use std::sync::Arc;

use crate::chain::{Chain, Ledger};
use crate::core::{Block, BlockBody, Contract, Hash256, Transaction, UnspentOutput};
use crate::network::{Message, Network, NetworkError, PeerId};
use crate::wallet::RsaKeys;

/// A running node: a ledger, a mining controller feeding it and a sync
/// controller keeping it in step with peers
pub struct Node {
    ledger: Arc<Ledger>,
    miner: Arc<MiningController>,
    sync: Arc<SyncController>,
}

impl Node {
    pub fn new(
        keys: RsaKeys,
        chain: Chain,
        network: Arc<dyn Network>,
        settings: MinerSettings,
    ) -> Self {
        let ledger = Arc::new(Ledger::new(chain));
        let miner = Arc::new(MiningController::new(
            Arc::clone(&ledger),
            Arc::clone(&network),
            keys,
            settings,
        ));
        let sync = Arc::new(SyncController::new(
            Arc::clone(&ledger),
            Arc::clone(&miner),
            network,
            settings.block_reward,
        ));
        Self { ledger, miner, sync }
    }

    /// Begin mining on the current tip
    pub fn start(&self) {
        self.miner.start_mining();
    }

    /// Cancel any running mining task
    pub fn shutdown(&self) {
        self.miner.stop_mining();
    }

    pub async fn submit_transaction(&self, tx: Transaction) -> Result<(), SubmitError> {
        self.sync.publish_transaction(tx).await
    }

    pub async fn submit_contract(&self, contract: Contract) -> Result<(), SubmitError> {
        self.sync.publish_contract(contract).await
    }

    pub async fn handle_message(&self, peer: &PeerId, message: Message) -> Result<(), NetworkError> {
        self.sync.handle_message(peer, message).await
    }

    pub async fn on_peer_connected(&self, peer: &PeerId, incoming: bool) -> Result<(), NetworkError> {
        self.sync.on_peer_connected(peer, incoming).await
    }

    pub async fn ping_peer(&self, peer: &PeerId) -> bool {
        self.sync.ping_peer(peer).await
    }

    pub fn blockchain(&self) -> Chain {
        self.ledger.snapshot()
    }

    /// Candidate block on the current tip, used by the genesis tooling
    pub fn next_block(&self, body: BlockBody) -> Block {
        self.ledger.read().next_block(body)
    }

    pub fn unspent_outputs(&self, pub_key: &[u8]) -> Vec<UnspentOutput> {
        self.ledger.read().unspent_outputs(pub_key)
    }

    pub fn find_transaction(&self, id: &Hash256) -> Option<Transaction> {
        self.ledger.read().find_transaction(id).cloned()
    }

    pub fn find_contract(&self, id: &Hash256) -> Option<Contract> {
        self.ledger.read().find_contract(id).cloned()
    }

    pub fn list_contracts(&self) -> Vec<Contract> {
        self.ledger.read().list_contracts().into_iter().cloned().collect()
    }

    pub fn pending_transactions(&self) -> usize {
        self.miner.pending_transactions()
    }

    pub fn pending_contracts(&self) -> usize {
        self.miner.pending_contracts()
    }

    pub fn is_mining(&self) -> bool {
        self.miner.is_mining()
    }
}
