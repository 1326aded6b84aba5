//! Polling loop following a single kind of root chain event
use std::time::Duration;

use backon::{FibonacciBuilder, Retryable as _};
use plasma_core::address::Address;
use plasma_util_error::fmt::FmtCompact as _;
use tokio::select;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, instrument, trace, warn};

use crate::LOG_TARGET;
use crate::config::{ContractAbi, DEFAULT_POLL_INTERVAL, DEFAULT_QUERY_TIMEOUT};
use crate::event::{BlockNumber, EventKind, LoggedEvent, RootChainEvent, RootEvent as _};
use crate::handler::EventHandler;
use crate::source::{
    DynEventSource, EventQuery, MalformedSnafu, SourceError, SourceResult, TimeoutSnafu,
    UnexpectedKindSnafu,
};

const QUERY_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Result of a single successful [`EventStream::poll_once`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub dispatched: usize,
    pub watermark: BlockNumber,
}

/// Why [`EventStream::run`] returned
#[derive(Debug)]
pub enum StreamExit {
    Shutdown {
        watermark: BlockNumber,
    },
    SourceFailed {
        watermark: BlockNumber,
        source: SourceError,
    },
}

impl StreamExit {
    pub fn watermark(&self) -> BlockNumber {
        match self {
            StreamExit::Shutdown { watermark } | StreamExit::SourceFailed { watermark, .. } => {
                *watermark
            }
        }
    }
}

/// Feeds every event of `H::Event` kind found on the root chain to `H`
///
/// The watermark is the next block to ask the source about. It moves only
/// after a whole batch has been handed to the handler, so an interrupted
/// batch is delivered again in full.
pub struct EventStream<H> {
    source: DynEventSource,
    handler: H,
    contract: Address,
    abi: ContractAbi,
    watermark: BlockNumber,
    poll_interval: Duration,
    query_timeout: Duration,
    max_query_retries: usize,
}

#[bon::bon]
impl<H> EventStream<H>
where
    H: EventHandler,
{
    #[builder]
    pub fn new(
        source: DynEventSource,
        handler: H,
        contract: Address,
        abi: ContractAbi,
        start_block: BlockNumber,
        #[builder(default = DEFAULT_POLL_INTERVAL)] poll_interval: Duration,
        #[builder(default = DEFAULT_QUERY_TIMEOUT)] query_timeout: Duration,
        #[builder(default)] max_query_retries: usize,
    ) -> Self {
        Self {
            source,
            handler,
            contract,
            abi,
            watermark: start_block,
            poll_interval,
            query_timeout,
            max_query_retries,
        }
    }
}

impl<H> EventStream<H>
where
    H: EventHandler,
{
    pub fn kind(&self) -> EventKind {
        H::Event::KIND
    }

    pub fn watermark(&self) -> BlockNumber {
        self.watermark
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn query(&self) -> EventQuery {
        EventQuery {
            contract: self.contract,
            from_block: self.watermark,
            to_block: None,
            abi: self.abi.clone(),
            kind: self.kind(),
        }
    }

    async fn query_events(
        &self,
        query: &EventQuery,
    ) -> SourceResult<Vec<LoggedEvent<RootChainEvent>>> {
        let timeout = self.query_timeout;
        match tokio::time::timeout(timeout, self.source.get_events(query)).await {
            Ok(res) => res,
            Err(_) => TimeoutSnafu { timeout }.fail(),
        }
    }

    /// Query the source once and dispatch everything it returned
    ///
    /// On error nothing is dispatched and the watermark stays put.
    pub async fn poll_once(&mut self) -> SourceResult<PollOutcome> {
        let query = self.query();
        let backoff = FibonacciBuilder::new()
            .with_jitter()
            .with_max_times(self.max_query_retries)
            .with_max_delay(QUERY_MAX_BACKOFF);

        let this = &*self;
        let events = { || async { this.query_events(&query).await } }
            .retry(backoff)
            .notify(|err: &SourceError, dur: Duration| {
                debug!(
                    target: LOG_TARGET,
                    kind = %query.kind,
                    dur_millis = %dur.as_millis(),
                    err = %err.fmt_compact(),
                    "Retrying failed event query"
                );
            })
            .await?;

        let expected = self.kind();
        let events = events
            .into_iter()
            .map(|LoggedEvent { block_number, event }| {
                let found = event.kind();
                H::Event::from_root(event)
                    .map(|event| LoggedEvent::new(block_number, event))
                    .map_err(|_| UnexpectedKindSnafu { expected, found }.build())
            })
            .collect::<SourceResult<Vec<_>>>()?;

        let Some(last_block) = events.last().map(|event| event.block_number) else {
            trace!(
                target: LOG_TARGET,
                kind = %expected,
                watermark = %self.watermark,
                "No new events"
            );
            return Ok(PollOutcome {
                dispatched: 0,
                watermark: self.watermark,
            });
        };

        let Some(next_watermark) = last_block.next() else {
            return MalformedSnafu {
                message: format!("event at block {last_block} leaves no next block to query"),
            }
            .fail();
        };

        let dispatched = events.len();
        for event in events {
            self.handler.handle(event).await;
        }

        self.watermark = next_watermark;
        debug!(
            target: LOG_TARGET,
            kind = %expected,
            dispatched,
            watermark = %self.watermark,
            "Dispatched root chain events"
        );

        Ok(PollOutcome {
            dispatched,
            watermark: self.watermark,
        })
    }

    /// Poll until shutdown is requested or the source fails for good
    ///
    /// Shutdown is signaled by sending `true` (or dropping the sender).
    #[instrument(
        name = "event_stream",
        target = LOG_TARGET,
        skip_all,
        fields(kind = %self.kind())
    )]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> StreamExit {
        info!(target: LOG_TARGET, watermark = %self.watermark, "Following root chain events");
        loop {
            let res = select! {
                _ = wait_shutdown(&mut shutdown_rx) => None,
                res = self.poll_once() => Some(res),
            };

            match res {
                None => break,
                Some(Ok(_)) => {}
                Some(Err(source)) => {
                    warn!(
                        target: LOG_TARGET,
                        watermark = %self.watermark,
                        err = %source.fmt_compact(),
                        "Event query failed, stopping"
                    );
                    return StreamExit::SourceFailed {
                        watermark: self.watermark,
                        source,
                    };
                }
            }

            select! {
                _ = wait_shutdown(&mut shutdown_rx) => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        debug!(target: LOG_TARGET, watermark = %self.watermark, "Shutting down");
        StreamExit::Shutdown {
            watermark: self.watermark,
        }
    }
}

async fn wait_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    // A dropped sender can't ever request anything else
    let _ = shutdown_rx.wait_for(|shutdown| *shutdown).await;
}
