//! Sled-based persistence for applied blocks and the chain state snapshot
use crate::error::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const SNAPSHOT_KEY: &[u8] = b"snapshot:chain_state";
const BLOCK_PREFIX: &[u8] = b"block:";

#[derive(Debug, Clone)]
pub struct ChainDb {
    db: sled::Db,
}

impl ChainDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StoreError::IoError(format!(
                "Failed to open database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        log::debug!("Opened chain database at {}", path.as_ref().display());
        Ok(ChainDb { db })
    }

    fn block_key(height: u64) -> String {
        // zero padded so sled's lexicographic order is height order
        format!("block:{:020}", height)
    }

    /// Save a block to disk
    pub fn save_block<B: Serialize>(&self, height: u64, block: &B) -> Result<()> {
        let value = bincode::serialize(block)
            .map_err(|e| StoreError::IoError(format!("Failed to serialize block: {}", e)))?;

        self.db
            .insert(Self::block_key(height).as_bytes(), value)
            .map_err(|e| StoreError::IoError(format!("Failed to save block: {}", e)))?;

        self.flush()
    }

    /// Load every stored block in height order
    pub fn load_all_blocks<B: DeserializeOwned>(&self) -> Result<Vec<B>> {
        let mut blocks = Vec::new();
        for item in self.db.scan_prefix(BLOCK_PREFIX) {
            let (_key, value) = item
                .map_err(|e| StoreError::IoError(format!("Failed to scan blocks: {}", e)))?;
            let block = bincode::deserialize(&value)
                .map_err(|e| StoreError::IoError(format!("Failed to deserialize block: {}", e)))?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    /// Save the chain state snapshot
    pub fn save_snapshot<S: Serialize>(&self, snapshot: &S) -> Result<()> {
        let data = bincode::serialize(snapshot)
            .map_err(|e| StoreError::IoError(format!("Failed to serialize snapshot: {}", e)))?;

        self.db
            .insert(SNAPSHOT_KEY, data)
            .map_err(|e| StoreError::IoError(format!("Failed to save snapshot: {}", e)))?;

        self.flush()
    }

    /// Load the latest chain state snapshot
    pub fn load_snapshot<S: DeserializeOwned>(&self) -> Result<Option<S>> {
        match self.db.get(SNAPSHOT_KEY) {
            Ok(Some(data)) => {
                let snapshot = bincode::deserialize(&data).map_err(|e| {
                    StoreError::IoError(format!("Failed to deserialize snapshot: {}", e))
                })?;
                Ok(Some(snapshot))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::IoError(format!(
                "Failed to load snapshot: {}",
                e
            ))),
        }
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StoreError::IoError(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}
