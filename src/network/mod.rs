// Network seam and protocol messages

pub mod message;

pub use message::{Message, MessageKind};

use async_trait::async_trait;
use thiserror::Error;

/// Peers are addressed by an opaque key, typically "host:port"
pub type PeerId = String;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("peer {0} is not reachable")]
    Unreachable(PeerId),
    #[error("request timed out")]
    Timeout,
    #[error("peer sent an unexpected {} reply", .0.as_str())]
    UnexpectedReply(MessageKind),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Message transport. The node only needs these three operations, so any
/// carrier works; tests drive the controllers through an in-memory one.
#[async_trait]
pub trait Network: Send + Sync {
    /// Deliver a message to one peer
    async fn send(&self, peer: &PeerId, message: Message) -> Result<(), NetworkError>;

    /// Deliver a message to every connected peer except `exclude`
    async fn broadcast(&self, message: Message, exclude: &[PeerId]) -> Result<(), NetworkError>;

    /// Deliver a message and wait for the peer's reply
    async fn request(&self, peer: &PeerId, message: Message) -> Result<Message, NetworkError>;
}

/// A transport with no peers. Lets a node run standalone, mining against
/// its own chain.
#[derive(Debug, Default)]
pub struct NullNetwork;

#[async_trait]
impl Network for NullNetwork {
    async fn send(&self, peer: &PeerId, _message: Message) -> Result<(), NetworkError> {
        Err(NetworkError::Unreachable(peer.clone()))
    }

    async fn broadcast(&self, _message: Message, _exclude: &[PeerId]) -> Result<(), NetworkError> {
        Ok(())
    }

    async fn request(&self, peer: &PeerId, _message: Message) -> Result<Message, NetworkError> {
        Err(NetworkError::Unreachable(peer.clone()))
    }
}
