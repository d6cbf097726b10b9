//! Ledger port
//!
//! The protocol core never talks to a blockchain directly. Everything it needs
//! from one (transaction lookup, address history, block contents, broadcast)
//! goes through the [`Ledger`] trait so backends can be swapped without
//! touching message or session logic.
//!
//! Internal module boundaries:
//! - `memory`: mutex-guarded in-memory ledger used by tests and local tooling

mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("internal: {0}")]
    Internal(String),
}

/// A transaction carrying a payload, as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    pub sender_addr: String,
    pub receiver_addr: String,
    pub data: Vec<u8>,
    /// `None` while unconfirmed.
    pub block_height: Option<u64>,
    /// Arrival order, used to break ties within a block.
    pub sequence: u64,
}

/// What the broadcast collaborator needs to build and sign a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub receiver_addr: String,
    pub data: Vec<u8>,
    pub tip: u64,
}

/// Block window for address history queries.
///
/// Unconfirmed transactions have no height and are never excluded by the
/// bounds; `include_unconfirmed` controls them instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub include_unconfirmed: bool,
}

impl Default for BlockRange {
    fn default() -> Self {
        Self {
            start_block: None,
            end_block: None,
            include_unconfirmed: true,
        }
    }
}

impl BlockRange {
    pub fn contains(&self, block_height: Option<u64>) -> bool {
        match block_height {
            None => self.include_unconfirmed,
            Some(height) => {
                self.start_block.is_none_or(|start| height >= start)
                    && self.end_block.is_none_or(|end| height <= end)
            }
        }
    }
}

pub trait Ledger: Send + Sync {
    fn transaction(&self, txid: &str) -> Result<Option<TransactionRecord>, LedgerError>;

    /// Transactions sent from or received by `addr`, newest first: descending
    /// block height, then descending sequence. Unconfirmed come first.
    fn transactions_by_address(
        &self,
        addr: &str,
        range: &BlockRange,
    ) -> Result<Vec<TransactionRecord>, LedgerError>;

    fn transactions_in_block(&self, block_height: u64)
    -> Result<Vec<TransactionRecord>, LedgerError>;

    /// Sign and broadcast, returning the new transaction id.
    fn broadcast(&self, tx: &WireTransaction, private_key: &str) -> Result<String, LedgerError>;

    fn block_height(&self) -> Result<u64, LedgerError>;

    fn address_for_private_key(&self, private_key: &str) -> Result<String, LedgerError>;
}
