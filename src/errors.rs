// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures raised by the projection engine and its store.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }

    /// True for store-side failures; the scheduler skips these per item.
    pub fn is_persistence(&self) -> bool {
        matches!(self, EngineError::Persistence(_) | EngineError::Corrupt(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_classification() {
        assert!(EngineError::Corrupt("amount".into()).is_persistence());
        assert!(EngineError::Persistence(rusqlite::Error::QueryReturnedNoRows).is_persistence());
        assert!(!EngineError::invalid("term").is_persistence());
        assert!(!EngineError::not_found("debt 3").is_persistence());
    }
}
