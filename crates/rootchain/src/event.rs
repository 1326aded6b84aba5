//! Root chain contract events the child chain reacts to
use std::fmt;

use plasma_core::address::Address;
use plasma_core::amount::Amount;
use plasma_core::utxo::UtxoId;
use serde::{Deserialize, Serialize};

/// Root chain block height
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    derive_more::From,
    derive_more::Display,
)]
pub struct BlockNumber(u64);

impl BlockNumber {
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    pub const fn to_number(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

/// Every contract event the synchronizer knows how to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Deposit,
    ExitStarted,
}

impl EventKind {
    /// Event name as declared in the root chain contract interface
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Deposit => "Deposit",
            EventKind::ExitStarted => "ExitStarted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain specific context of the log an event was decoded from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawLog {
    pub log_index: u64,
    pub data: Vec<u8>,
}

/// Value locked in the root chain contract, to be credited on the child chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub depositor: Address,
    /// Block number the contract assigned to the deposit
    pub deposit_block: u64,
    pub token: Address,
    pub amount: Amount,
    pub raw: RawLog,
}

/// Owner started withdrawing a child chain output back to the root chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitStartedEvent {
    pub exitor: Address,
    pub utxo_id: UtxoId,
    pub token: Address,
    pub amount: Amount,
    pub raw: RawLog,
}

/// A decoded event of any known kind, as returned by an event source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootChainEvent {
    Deposit(DepositEvent),
    ExitStarted(ExitStartedEvent),
}

impl RootChainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RootChainEvent::Deposit(_) => EventKind::Deposit,
            RootChainEvent::ExitStarted(_) => EventKind::ExitStarted,
        }
    }
}

/// An event together with the root chain block it was emitted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent<E> {
    pub block_number: BlockNumber,
    pub event: E,
}

impl<E> LoggedEvent<E> {
    pub fn new(block_number: BlockNumber, event: E) -> Self {
        Self {
            block_number,
            event,
        }
    }
}

/// Concrete event type of a single [`EventKind`]
pub trait RootEvent: Sized + Send + 'static {
    const KIND: EventKind;

    /// Narrow a decoded event down to `Self`, handing it back on mismatch
    fn from_root(event: RootChainEvent) -> Result<Self, RootChainEvent>;
}

impl RootEvent for DepositEvent {
    const KIND: EventKind = EventKind::Deposit;

    fn from_root(event: RootChainEvent) -> Result<Self, RootChainEvent> {
        match event {
            RootChainEvent::Deposit(event) => Ok(event),
            other => Err(other),
        }
    }
}

impl RootEvent for ExitStartedEvent {
    const KIND: EventKind = EventKind::ExitStarted;

    fn from_root(event: RootChainEvent) -> Result<Self, RootChainEvent> {
        match event {
            RootChainEvent::ExitStarted(event) => Ok(event),
            other => Err(other),
        }
    }
}
