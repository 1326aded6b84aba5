//! Reactions to root chain events
use async_trait::async_trait;
use plasma_core::amount::Amount;
use plasma_core::signer::ChainSigner;
use plasma_core::transaction::Transaction;
use plasma_core::utxo::{TxOut, Utxo};
use tracing::{debug, info};

use crate::LOG_TARGET;
use crate::event::{DepositEvent, ExitStartedEvent, LoggedEvent, RootEvent};
use crate::operator::DynOperator;

#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    type Event: RootEvent;

    async fn handle(&self, event: LoggedEvent<Self::Event>);
}

/// Credits deposited value on the child chain
///
/// Every deposit becomes a transaction with two padding inputs and the
/// deposited amount as its first output.
pub struct DepositHandler {
    operator: DynOperator,
    fee: Amount,
    /// Only used to name deposit transactions in logs
    signer: ChainSigner,
}

impl DepositHandler {
    pub fn new(operator: DynOperator, fee: Amount, signer: ChainSigner) -> Self {
        Self {
            operator,
            fee,
            signer,
        }
    }

    pub fn deposit_transaction(&self, deposit: &DepositEvent) -> Transaction {
        Transaction::new(
            Utxo::padding(),
            Utxo::padding(),
            TxOut::new(deposit.depositor, deposit.amount.clone()),
            TxOut::padding(),
            self.fee.clone(),
        )
    }
}

#[async_trait]
impl EventHandler for DepositHandler {
    type Event = DepositEvent;

    async fn handle(&self, event: LoggedEvent<DepositEvent>) {
        let LoggedEvent {
            block_number,
            event: deposit,
        } = event;

        let tx = self.deposit_transaction(&deposit);
        debug!(
            target: LOG_TARGET,
            %block_number,
            depositor = %deposit.depositor,
            deposit_block = deposit.deposit_block,
            amount = %deposit.amount,
            tx_hash = %tx.hash(&self.signer),
            "Deposit"
        );
        self.operator.add_transactions(vec![tx]).await;
    }
}

/// Records exits; the exit game itself is not played here
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitStartedHandler;

#[async_trait]
impl EventHandler for ExitStartedHandler {
    type Event = ExitStartedEvent;

    async fn handle(&self, event: LoggedEvent<ExitStartedEvent>) {
        let LoggedEvent {
            block_number,
            event: exit,
        } = event;

        info!(
            target: LOG_TARGET,
            %block_number,
            exitor = %exit.exitor,
            utxo_id = %exit.utxo_id,
            amount = %exit.amount,
            "Exit started"
        );
    }
}
