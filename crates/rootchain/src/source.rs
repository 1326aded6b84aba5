//! Where root chain events come from
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plasma_core::address::Address;
use plasma_util_error::BoxedError;
use snafu::Snafu;

use crate::config::ContractAbi;
use crate::event::{BlockNumber, EventKind, LoggedEvent, RootChainEvent};

/// Filter for a single [`EventSource::get_events`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub contract: Address,
    /// Inclusive
    pub from_block: BlockNumber,
    /// Inclusive, `None` meaning up to the current head
    pub to_block: Option<BlockNumber>,
    pub abi: ContractAbi,
    pub kind: EventKind,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    #[snafu(display("Root chain unreachable"))]
    Unreachable { source: BoxedError },
    #[snafu(display("Malformed event log: {message}"))]
    Malformed { message: String },
    #[snafu(display("Event query timed out after {}ms", timeout.as_millis()))]
    Timeout { timeout: Duration },
    #[snafu(display("Expected {expected} event, got {found}"))]
    UnexpectedKind {
        expected: EventKind,
        found: EventKind,
    },
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

impl SourceError {
    /// Wrap a transport failure of the underlying client
    pub fn unreachable(err: impl Into<BoxedError>) -> Self {
        SourceError::Unreachable { source: err.into() }
    }
}

/// Access to decoded logs of the root chain contract
///
/// Implementations are expected to return events in chain order (by block,
/// then by log index), all of the kind requested in [`EventQuery::kind`].
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    async fn get_events(
        &self,
        query: &EventQuery,
    ) -> SourceResult<Vec<LoggedEvent<RootChainEvent>>>;
}

pub type DynEventSource = Arc<dyn EventSource>;
