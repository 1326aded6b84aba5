//! The child chain operator, as seen from the synchronizer
use std::sync::Arc;

use async_trait::async_trait;
use plasma_core::transaction::Transaction;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::LOG_TARGET;

/// Accepts transactions for inclusion in upcoming child chain blocks
#[async_trait]
pub trait Operator: Send + Sync + 'static {
    async fn add_transactions(&self, txs: Vec<Transaction>);
}

pub type DynOperator = Arc<dyn Operator>;

/// In-memory queue of transactions waiting for a block
///
/// Every accepted batch bumps a counter on a `watch` channel, so a block
/// builder can wait for work instead of polling.
pub struct PendingPool {
    pending: Mutex<Vec<Transaction>>,
    added_tx: watch::Sender<u64>,
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingPool {
    pub fn new() -> Self {
        let (added_tx, _) = watch::channel(0);
        Self {
            pending: Mutex::new(vec![]),
            added_tx,
        }
    }

    /// Total number of transactions ever added
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.added_tx.subscribe()
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Remove and return everything queued so far, oldest first
    pub async fn take_pending(&self) -> Vec<Transaction> {
        std::mem::take(&mut *self.pending.lock().await)
    }
}

#[async_trait]
impl Operator for PendingPool {
    async fn add_transactions(&self, txs: Vec<Transaction>) {
        if txs.is_empty() {
            return;
        }
        let len = txs.len();
        self.pending.lock().await.extend(txs);
        self.added_tx
            .send_modify(|total| *total = total.wrapping_add(len as u64));
        debug!(target: LOG_TARGET, len, "Added pending transactions");
    }
}
