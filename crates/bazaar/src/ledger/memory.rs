use std::sync::Mutex;

use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, PrivateKey};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{BlockRange, Ledger, LedgerError, TransactionRecord, WireTransaction};

#[derive(Debug, Default)]
struct LedgerState {
    height: u64,
    next_sequence: u64,
    records: Vec<TransactionRecord>,
}

/// Ledger backed by a vector of records.
///
/// Broadcast transactions confirm immediately at the current height. Tests
/// advance time with [`InMemoryLedger::increment_block_height`].
pub struct InMemoryLedger {
    starting_height: u64,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new(starting_height: u64) -> Self {
        Self {
            starting_height,
            state: Mutex::new(LedgerState {
                height: starting_height,
                ..LedgerState::default()
            }),
        }
    }

    fn lock_error(label: &str) -> LedgerError {
        LedgerError::Internal(format!("mutex poisoned: {label}"))
    }

    pub fn increment_block_height(&self) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        state.height += 1;
        Ok(state.height)
    }

    /// Drop every record and rewind to the starting height.
    pub fn clear(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        state.records.clear();
        state.height = self.starting_height;
        Ok(())
    }

    /// Store a raw record as-is, e.g. foreign or unconfirmed transactions.
    /// The record's sequence is replaced with the next arrival number.
    pub fn insert(&self, mut record: TransactionRecord) -> Result<String, LedgerError> {
        let mut state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        record.sequence = state.next_sequence;
        state.next_sequence += 1;
        let txid = record.txid.clone();
        state.records.push(record);
        Ok(txid)
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        let state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        Ok(state.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    fn newest_first(mut records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        records.sort_by(|a, b| {
            let a_key = (a.block_height.unwrap_or(u64::MAX), a.sequence);
            let b_key = (b.block_height.unwrap_or(u64::MAX), b.sequence);
            b_key.cmp(&a_key)
        });
        records
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Ledger for InMemoryLedger {
    fn transaction(&self, txid: &str) -> Result<Option<TransactionRecord>, LedgerError> {
        let state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        Ok(state.records.iter().find(|r| r.txid == txid).cloned())
    }

    fn transactions_by_address(
        &self,
        addr: &str,
        range: &BlockRange,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        let matching = state
            .records
            .iter()
            .filter(|r| r.sender_addr == addr || r.receiver_addr == addr)
            .filter(|r| range.contains(r.block_height))
            .cloned()
            .collect();
        Ok(Self::newest_first(matching))
    }

    fn transactions_in_block(
        &self,
        block_height: u64,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        let matching = state
            .records
            .iter()
            .filter(|r| r.block_height == Some(block_height))
            .cloned()
            .collect();
        Ok(Self::newest_first(matching))
    }

    fn broadcast(&self, tx: &WireTransaction, private_key: &str) -> Result<String, LedgerError> {
        let sender_addr = self.address_for_private_key(private_key)?;

        let mut state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let mut hasher = Sha256::new();
        hasher.update(sender_addr.as_bytes());
        hasher.update(tx.receiver_addr.as_bytes());
        hasher.update(&tx.data);
        hasher.update(sequence.to_le_bytes());
        let txid = hex::encode(hasher.finalize());

        debug!(%txid, sender = %sender_addr, receiver = %tx.receiver_addr, "stored transaction");

        let height = state.height;
        state.records.push(TransactionRecord {
            txid: txid.clone(),
            sender_addr,
            receiver_addr: tx.receiver_addr.clone(),
            data: tx.data.clone(),
            block_height: Some(height),
            sequence,
        });
        Ok(txid)
    }

    fn block_height(&self) -> Result<u64, LedgerError> {
        let state = self.state.lock().map_err(|_| Self::lock_error("state"))?;
        Ok(state.height)
    }

    fn address_for_private_key(&self, private_key: &str) -> Result<String, LedgerError> {
        let key = PrivateKey::from_wif(private_key)
            .map_err(|err| LedgerError::InvalidPrivateKey(err.to_string()))?;
        let secp = Secp256k1::new();
        let public_key = key.public_key(&secp);
        Ok(Address::p2pkh(public_key.pubkey_hash(), key.network).to_string())
    }
}
