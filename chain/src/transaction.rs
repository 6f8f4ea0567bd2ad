//! Transactions
//!
//! A transaction is signed by one account and carries one or more
//! operations. It applies atomically: either every operation succeeds or
//! the state is left as it was.

use crate::error::{ChainError, Result};
use crate::operations::Operation;
use crate::state::ChainState;
use meta_core::{AccountId, ObjectId};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub signer: AccountId,
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(signer: AccountId, operations: Vec<Operation>) -> Self {
        Self { signer, operations }
    }

    /// Hex SHA3-256 of the signer and operations
    pub fn id(&self) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update(self.signer.0.to_le_bytes());
        for op in &self.operations {
            hasher.update(format!("{:?}", op).as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Apply every operation in order directly to `state`. Callers that
    /// need atomicity apply to a scratch copy.
    pub fn apply(&self, state: &mut ChainState) -> Result<Vec<Option<ObjectId>>> {
        if self.operations.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "transaction has no operations".to_string(),
            ));
        }
        state.account(self.signer)?;

        let mut results = Vec::with_capacity(self.operations.len());
        for (index, op) in self.operations.iter().enumerate() {
            let result = op.apply(state, self.signer).map_err(|e| {
                log::debug!("Operation {} ({}) failed: {}", index, op.name(), e);
                e
            })?;
            results.push(result);
        }
        Ok(results)
    }
}
