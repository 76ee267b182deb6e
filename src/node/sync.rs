// Chain synchronization and gossip handling

use std::sync::Arc;
use std::time::Duration;

use crate::chain::{Chain, Ledger};
use crate::consensus::validate_chain;
use crate::core::{Contract, HashedBlock, Transaction};
use crate::network::{Message, Network, NetworkError, PeerId};
use crate::node::miner::{MiningController, SubmitError};

/// How long a ping waits for its pong
const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Applies peer messages to the local node: new blocks and whole chains
/// are validated and adopted, pending transactions and contracts are
/// queued and gossiped on.
pub struct SyncController {
    ledger: Arc<Ledger>,
    miner: Arc<MiningController>,
    network: Arc<dyn Network>,
    block_reward: u64,
}

impl SyncController {
    pub fn new(
        ledger: Arc<Ledger>,
        miner: Arc<MiningController>,
        network: Arc<dyn Network>,
        block_reward: u64,
    ) -> Self {
        Self { ledger, miner, network, block_reward }
    }

    /// Handle one inbound message
    pub async fn handle_message(&self, peer: &PeerId, message: Message) -> Result<(), NetworkError> {
        match message {
            Message::ChainSync(remote) => {
                self.try_chain_sync(peer, remote);
                // Always answer with our chain, adopted or not
                let own = self.ledger.snapshot();
                self.network.send(peer, Message::ChainSync(own)).await
            }
            Message::NewBlock(block) => {
                if self.try_apply_block(&block) {
                    log::debug!("new block #{} from {peer} appended", block.id);
                } else {
                    log::debug!("new block #{} from {peer} rejected", block.id);
                }
                Ok(())
            }
            Message::NewTransaction(tx) => match self.miner.submit_transaction(tx.clone()) {
                Ok(()) => {
                    log::debug!("new transaction from {peer} queued");
                    self.network
                        .broadcast(Message::NewTransaction(tx), std::slice::from_ref(peer))
                        .await
                }
                Err(error) => {
                    log::debug!("new transaction from {peer} rejected: {error}");
                    Ok(())
                }
            },
            Message::NewContract(contract) => match self.miner.submit_contract(contract.clone()) {
                Ok(()) => {
                    log::debug!("new contract from {peer} queued");
                    self.network
                        .broadcast(Message::NewContract(contract), std::slice::from_ref(peer))
                        .await
                }
                Err(error) => {
                    log::debug!("new contract from {peer} rejected: {error}");
                    Ok(())
                }
            },
            Message::Ping => self.network.send(peer, Message::Pong).await,
            Message::Pong => Ok(()),
        }
    }

    /// On an outbound connection, offer our chain and apply whatever the
    /// peer answers with
    pub async fn on_peer_connected(&self, peer: &PeerId, incoming: bool) -> Result<(), NetworkError> {
        if incoming {
            return Ok(());
        }
        let own = self.ledger.snapshot();
        match self.network.request(peer, Message::ChainSync(own)).await? {
            Message::ChainSync(remote) => {
                self.try_chain_sync(peer, remote);
                Ok(())
            }
            other => Err(NetworkError::UnexpectedReply(other.kind())),
        }
    }

    /// Check a peer's liveness with a bounded wait
    pub async fn ping_peer(&self, peer: &PeerId) -> bool {
        matches!(
            tokio::time::timeout(PING_TIMEOUT, self.network.request(peer, Message::Ping)).await,
            Ok(Ok(Message::Pong))
        )
    }

    /// Queue a locally created transaction and gossip it to all peers
    pub async fn publish_transaction(&self, tx: Transaction) -> Result<(), SubmitError> {
        self.miner.submit_transaction(tx.clone())?;
        if let Err(error) = self.network.broadcast(Message::NewTransaction(tx), &[]).await {
            log::error!("transaction broadcast failed: {error}");
        }
        Ok(())
    }

    /// Queue a locally created contract and gossip it to all peers
    pub async fn publish_contract(&self, contract: Contract) -> Result<(), SubmitError> {
        self.miner.submit_contract(contract.clone())?;
        if let Err(error) = self.network.broadcast(Message::NewContract(contract), &[]).await {
            log::error!("contract broadcast failed: {error}");
        }
        Ok(())
    }

    /// Append a gossiped block if the chain stays valid with it. On
    /// success the miner restarts on the new tip and the queues drop
    /// whatever the block committed.
    pub fn try_apply_block(&self, block: &HashedBlock) -> bool {
        let mut chain = self.ledger.write();

        let mut candidate = chain.clone();
        candidate.push(block.clone());
        if let Err(error) = validate_chain(&candidate, self.block_reward) {
            log::debug!("candidate chain with block #{} rejected: {error}", block.id);
            return false;
        }

        self.miner.stop_mining();
        self.miner.remove_committed(&block.body);
        *chain = candidate;
        self.miner.revalidate_queues(&chain);
        drop(chain);

        self.miner.start_mining();
        true
    }

    /// Adopt a peer's chain if it is valid, shares our genesis block and
    /// is strictly longer. Equal length keeps ours, so the first seen of
    /// two competing chains wins. Returns whether the remote chain was
    /// acceptable, adopted or not.
    pub fn try_chain_sync(&self, peer: &PeerId, remote: Chain) -> bool {
        let mut chain = self.ledger.write();

        if let Err(error) = validate_chain(&remote, self.block_reward) {
            log::debug!("remote chain from {peer} rejected: {error}");
            return false;
        }
        match (chain.genesis(), remote.genesis()) {
            (Some(own), Some(theirs)) if own == theirs => {}
            _ => {
                log::debug!("genesis block mismatch with {peer}");
                return false;
            }
        }

        if remote.len() <= chain.len() {
            log::debug!("chain from {peer} is not longer than ours");
            return true;
        }

        log::debug!(
            "adopting chain from {peer}: {} new blocks",
            remote.len() - chain.len()
        );
        self.miner.stop_mining();
        for block in &remote.blocks()[chain.len()..] {
            self.miner.remove_committed(&block.body);
        }
        *chain = remote;
        self.miner.revalidate_queues(&chain);
        drop(chain);

        self.miner.start_mining();
        true
    }
}
