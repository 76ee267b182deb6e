// Node configuration file

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::PeerId;
use crate::node::MinerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings a node reads at startup, stored as JSON next to the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub port: u16,
    pub public_key_path: PathBuf,
    pub private_key_path: PathBuf,
    pub chain_path: PathBuf,
    #[serde(default)]
    pub known_peers: Vec<PeerId>,
    #[serde(default = "default_difficulty_bits")]
    pub difficulty_bits: u32,
    #[serde(default = "default_block_reward")]
    pub block_reward: u64,
    #[serde(default)]
    pub max_hash_rate: u32,
}

fn default_difficulty_bits() -> u32 {
    20
}

fn default_block_reward() -> u64 {
    100
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn miner_settings(&self) -> MinerSettings {
        MinerSettings {
            difficulty_bits: self.difficulty_bits,
            block_reward: self.block_reward,
            max_hash_rate: self.max_hash_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let json = r#"{
            "name": "node-1",
            "port": 9000,
            "public_key_path": "keys/public.der",
            "private_key_path": "keys/private.der",
            "chain_path": "chain.json"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.known_peers.is_empty());
        assert_eq!(config.difficulty_bits, 20);
        assert_eq!(config.block_reward, 100);
        assert_eq!(config.max_hash_rate, 0);
    }

    #[test]
    fn test_file_round_trip() {
        let config = Config {
            name: "node-2".into(),
            port: 9001,
            public_key_path: "public.der".into(),
            private_key_path: "private.der".into(),
            chain_path: "chain.json".into(),
            known_peers: vec!["127.0.0.1:9000".into()],
            difficulty_bits: 8,
            block_reward: 50,
            max_hash_rate: 1000,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.name, config.name);
        assert_eq!(loaded.known_peers, config.known_peers);
        assert_eq!(loaded.miner_settings().difficulty_bits, 8);
    }
}
