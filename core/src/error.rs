//! Object store error types

use crate::types::{ObjectId, ObjectType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object {0} not found")]
    NotFound(ObjectId),

    #[error("Duplicate {object_type} key: {key}")]
    DuplicateKey { object_type: ObjectType, key: String },

    #[error("Unique key of {0} cannot be changed")]
    KeyChanged(ObjectId),

    #[error("Storage error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
