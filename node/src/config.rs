//! Node configuration (TOML)
//!
//! ```toml
//! data_dir = "./data"
//! genesis_file = "./genesis.json"
//!
//! [chain]
//! max_feed_age_secs = 86400
//!
//! [reconcile]
//! enabled = true
//! interval_secs = 300
//! ```

use meta_chain::Genesis;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid genesis: {0}")]
    GenesisError(#[from] meta_chain::ChainError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_genesis_file() -> PathBuf {
    PathBuf::from("./genesis.json")
}

fn default_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Overrides the genesis max feed age
    #[serde(default)]
    pub max_feed_age_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_genesis_file")]
    pub genesis_file: PathBuf,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            genesis_file: default_genesis_file(),
            chain: ChainConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(age) = self.chain.max_feed_age_secs {
            if age <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "chain.max_feed_age_secs must be positive, got {}",
                    age
                )));
            }
        }
        if self.reconcile.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reconcile.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// sled database location
    pub fn chain_db_path(&self) -> PathBuf {
        self.data_dir.join("chain")
    }

    /// Read the genesis file and apply configured overrides
    pub fn load_genesis(&self) -> Result<Genesis, ConfigError> {
        let contents = fs::read_to_string(&self.genesis_file)?;
        let mut genesis = Genesis::from_json(&contents)?;
        if let Some(age) = self.chain.max_feed_age_secs {
            genesis.parameters.max_feed_age_secs = age;
        }
        Ok(genesis)
    }
}
