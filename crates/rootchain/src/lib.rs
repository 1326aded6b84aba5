// SPDX-License-Identifier: MIT

//! Root chain synchronizer
//!
//! Follows events of the root chain contract and turns them into child chain
//! state changes. Every [`event::EventKind`] is followed by its own
//! [`stream::EventStream`], running as a separate task, so a failing query
//! for one kind does not stop the others.
pub mod config;
pub mod event;
pub mod handler;
pub mod operator;
pub mod source;
pub mod stream;

use plasma_util_error::fmt::FmtCompact as _;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use crate::config::{ConfigResult, RootChainConfig};
use crate::event::EventKind;
use crate::handler::{DepositHandler, ExitStartedHandler};
use crate::operator::DynOperator;
use crate::source::DynEventSource;
use crate::stream::{EventStream, StreamExit};

pub const LOG_TARGET: &str = "plasma::rootchain";

/// All event streams of the root chain contract, ready to be spawned
pub struct RootChain {
    deposit: EventStream<DepositHandler>,
    exit_started: EventStream<ExitStartedHandler>,
}

impl RootChain {
    pub fn new(
        config: &RootChainConfig,
        source: DynEventSource,
        operator: DynOperator,
    ) -> ConfigResult<Self> {
        let contract = config.validate()?;

        let deposit = EventStream::builder()
            .source(source.clone())
            .handler(DepositHandler::new(
                operator,
                config.deposit_fee.clone(),
                config.signer(),
            ))
            .contract(contract)
            .abi(config.contract_abi.clone())
            .start_block(config.start_block)
            .poll_interval(config.poll_interval)
            .query_timeout(config.query_timeout)
            .max_query_retries(config.max_query_retries)
            .build();

        let exit_started = EventStream::builder()
            .source(source)
            .handler(ExitStartedHandler)
            .contract(contract)
            .abi(config.contract_abi.clone())
            .start_block(config.start_block)
            .poll_interval(config.poll_interval)
            .query_timeout(config.query_timeout)
            .max_query_retries(config.max_query_retries)
            .build();

        Ok(Self {
            deposit,
            exit_started,
        })
    }

    /// Start one task per event kind
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> RootChainHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        info!(
            target: LOG_TARGET,
            deposit_from = %self.deposit.watermark(),
            exit_started_from = %self.exit_started.watermark(),
            "Starting root chain synchronizer"
        );

        let deposit = self.deposit;
        let rx = shutdown_rx.clone();
        tasks.spawn(async move { (deposit.kind(), deposit.run(rx).await) });

        let exit_started = self.exit_started;
        tasks.spawn(async move { (exit_started.kind(), exit_started.run(shutdown_rx).await) });

        RootChainHandle { shutdown_tx, tasks }
    }
}

/// Running synchronizer
///
/// Dropping the handle aborts all its tasks.
pub struct RootChainHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: JoinSet<(EventKind, StreamExit)>,
}

impl RootChainHandle {
    /// Ask every stream to stop at its next opportunity
    ///
    /// A batch being dispatched at that moment is abandoned; it is not
    /// committed to the watermark.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for the next stream to finish
    ///
    /// `None` once all of them have.
    pub async fn join_next(&mut self) -> Option<Result<(EventKind, StreamExit), JoinError>> {
        self.tasks.join_next().await
    }

    pub async fn shutdown_and_join(mut self) -> Vec<(EventKind, StreamExit)> {
        self.shutdown();

        let mut exits = vec![];
        while let Some(res) = self.join_next().await {
            match res {
                Ok(exit) => exits.push(exit),
                Err(err) => {
                    warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Event stream task failed");
                }
            }
        }
        exits.sort_by_key(|(kind, _)| *kind);
        exits
    }
}
