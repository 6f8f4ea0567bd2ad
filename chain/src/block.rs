//! Blocks

use crate::transaction::Transaction;
use meta_core::Timestamp;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_num: u64,
    pub timestamp: Timestamp,
    /// Id of the preceding block
    pub previous: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        block_num: u64,
        timestamp: Timestamp,
        previous: String,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            block_num,
            timestamp,
            previous,
            transactions,
        }
    }

    /// Hex SHA3-256 over the header and transaction ids
    pub fn id(&self) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update(self.block_num.to_le_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        hasher.update(self.previous.as_bytes());
        for tx in &self.transactions {
            hasher.update(tx.id().as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GENESIS_BLOCK_ID;
    use chrono::DateTime;

    #[test]
    fn test_block_id_covers_header() {
        let t = DateTime::from_timestamp(1_704_067_260, 0).unwrap();
        let block = Block::new(1, t, GENESIS_BLOCK_ID.to_string(), vec![]);
        let mut later = block.clone();
        later.timestamp = DateTime::from_timestamp(1_704_067_320, 0).unwrap();

        assert_eq!(block.id().len(), 64);
        assert_ne!(block.id(), later.id());
    }
}
