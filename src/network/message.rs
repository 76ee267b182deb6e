// Network protocol messages

use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::core::{Contract, HashedBlock, Transaction};

/// Message kinds, matching the wire type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    ChainSync,
    NewBlock,
    NewTransaction,
    NewContract,
    Ping,
    Pong,
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::ChainSync => "bsync",
            MessageKind::NewBlock => "nblock",
            MessageKind::NewTransaction => "ntrans",
            MessageKind::NewContract => "ncontr",
            MessageKind::Ping => "ping",
            MessageKind::Pong => "pong",
        }
    }

    pub fn from_str(tag: &str) -> Option<Self> {
        match tag {
            "bsync" => Some(MessageKind::ChainSync),
            "nblock" => Some(MessageKind::NewBlock),
            "ntrans" => Some(MessageKind::NewTransaction),
            "ncontr" => Some(MessageKind::NewContract),
            "ping" => Some(MessageKind::Ping),
            "pong" => Some(MessageKind::Pong),
            _ => None,
        }
    }
}

/// Network message. Encodes as `{"type": tag, "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Message {
    /// Offer the full own chain; the peer answers with its own
    #[serde(rename = "bsync")]
    ChainSync(Chain),
    /// Gossip a freshly mined block
    #[serde(rename = "nblock")]
    NewBlock(HashedBlock),
    /// Gossip a pending transaction
    #[serde(rename = "ntrans")]
    NewTransaction(Transaction),
    /// Gossip a pending contract
    #[serde(rename = "ncontr")]
    NewContract(Contract),
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::ChainSync(_) => MessageKind::ChainSync,
            Message::NewBlock(_) => MessageKind::NewBlock,
            Message::NewTransaction(_) => MessageKind::NewTransaction,
            Message::NewContract(_) => MessageKind::NewContract,
            Message::Ping => MessageKind::Ping,
            Message::Pong => MessageKind::Pong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags() {
        let json = serde_json::to_string(&Message::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);

        let json = serde_json::to_string(&Message::ChainSync(Chain::empty())).unwrap();
        assert_eq!(json, r#"{"type":"bsync","payload":[]}"#);
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in [
            MessageKind::ChainSync,
            MessageKind::NewBlock,
            MessageKind::NewTransaction,
            MessageKind::NewContract,
            MessageKind::Ping,
            MessageKind::Pong,
        ] {
            assert_eq!(MessageKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::from_str("nonsense"), None);
    }

    #[test]
    fn test_message_round_trip() {
        let tx = Transaction::coinbase(1, 100, b"m", vec![1, 2]);
        let message = Message::NewTransaction(tx);
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.starts_with(r#"{"type":"ntrans""#));
        let decoded: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(message, decoded);
    }
}
