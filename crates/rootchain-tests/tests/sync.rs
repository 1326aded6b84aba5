use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use plasma_core::address::Address;
use plasma_core::amount::Amount;
use plasma_core::transaction::Transaction;
use plasma_core::utxo::{TxOut, Utxo, UtxoId};
use plasma_rootchain::RootChain;
use plasma_rootchain::config::{ContractAbi, RootChainConfig};
use plasma_rootchain::event::{
    BlockNumber, DepositEvent, EventKind, ExitStartedEvent, LoggedEvent, RawLog, RootChainEvent,
};
use plasma_rootchain::operator::{Operator, PendingPool};
use plasma_rootchain::source::{EventQuery, EventSource, SourceError, SourceResult};
use plasma_rootchain::stream::StreamExit;
use plasma_util_error::BoxedErrorResult;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

type Batch = SourceResult<Vec<LoggedEvent<RootChainEvent>>>;

/// Root chain double answering each event kind from its own script
///
/// Once a script runs out, every further query returns no events.
struct FakeRootChain {
    scripts: Mutex<BTreeMap<EventKind, VecDeque<Batch>>>,
    queries: Mutex<Vec<EventQuery>>,
    queries_tx: watch::Sender<usize>,
}

impl FakeRootChain {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::default(),
            queries: Mutex::default(),
            queries_tx: watch::channel(0).0,
        })
    }

    fn push(&self, kind: EventKind, batch: Batch) {
        self.scripts
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(batch);
    }

    fn from_blocks(&self, kind: EventKind) -> Vec<u64> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.kind == kind)
            .map(|q| q.from_block.to_number())
            .collect()
    }

    async fn wait_queries(&self, kind: EventKind, count: usize) {
        self.queries_tx
            .subscribe()
            .wait_for(|_| count <= self.from_blocks(kind).len())
            .await
            .unwrap();
    }
}

#[async_trait]
impl EventSource for FakeRootChain {
    async fn get_events(&self, query: &EventQuery) -> Batch {
        self.queries.lock().unwrap().push(query.clone());
        self.queries_tx.send_modify(|n| *n += 1);

        self.scripts
            .lock()
            .unwrap()
            .get_mut(&query.kind)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(vec![]))
    }
}

/// Operator whose `stall_on`-th submission never completes
struct StallingOperator {
    pool: PendingPool,
    stall_on: usize,
    calls: AtomicUsize,
    calls_tx: watch::Sender<usize>,
}

impl StallingOperator {
    fn new(stall_on: usize) -> Arc<Self> {
        Arc::new(Self {
            pool: PendingPool::new(),
            stall_on,
            calls: AtomicUsize::new(0),
            calls_tx: watch::channel(0).0,
        })
    }

    async fn wait_calls(&self, count: usize) {
        self.calls_tx
            .subscribe()
            .wait_for(|calls| count <= *calls)
            .await
            .unwrap();
    }
}

#[async_trait]
impl Operator for StallingOperator {
    async fn add_transactions(&self, txs: Vec<Transaction>) {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls_tx.send_replace(call);
        if call == self.stall_on {
            debug!(call, "Stalling operator submission");
            std::future::pending::<()>().await;
        }
        self.pool.add_transactions(txs).await;
    }
}

fn alice() -> Address {
    Address::from_bytes([0xa1; 20])
}

fn deposit(block: u64, amount: u64) -> LoggedEvent<RootChainEvent> {
    LoggedEvent::new(
        BlockNumber::new(block),
        RootChainEvent::Deposit(DepositEvent {
            depositor: alice(),
            deposit_block: block * 1000,
            token: Address::ZERO,
            amount: Amount::from(amount),
            raw: RawLog {
                log_index: 0,
                data: vec![],
            },
        }),
    )
}

fn exit_started(block: u64) -> LoggedEvent<RootChainEvent> {
    LoggedEvent::new(
        BlockNumber::new(block),
        RootChainEvent::ExitStarted(ExitStartedEvent {
            exitor: alice(),
            utxo_id: UtxoId::new(101000, 0, 0),
            token: Address::ZERO,
            amount: Amount::from(5u64),
            raw: RawLog::default(),
        }),
    )
}

fn config() -> RootChainConfig {
    RootChainConfig::builder()
        .contract_address("0x00000000000000000000000000000000000000cc")
        .contract_abi(ContractAbi::new(r#"[{"type":"event","name":"Deposit"}]"#))
        .build()
}

fn expected_deposit(amount: u64) -> Transaction {
    Transaction::new(
        Utxo::padding(),
        Utxo::padding(),
        TxOut::new(alice(), Amount::from(amount)),
        TxOut::padding(),
        Amount::from(1u64),
    )
}

#[test_log::test(tokio::test(start_paused = true))]
async fn deposits_reach_operator_in_order() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    source.push(
        EventKind::Deposit,
        Ok(vec![deposit(101, 10), deposit(103, 20)]),
    );
    let pool = Arc::new(PendingPool::new());
    let mut added_rx = pool.subscribe();

    let handle = RootChain::new(&config(), source.clone(), pool.clone())?.spawn();

    added_rx.wait_for(|added| 2 <= *added).await?;
    source.wait_queries(EventKind::Deposit, 2).await;
    let exits = handle.shutdown_and_join().await;

    assert_eq!(
        pool.take_pending().await,
        vec![expected_deposit(10), expected_deposit(20)]
    );
    assert_eq!(&source.from_blocks(EventKind::Deposit)[..2], [100, 104]);
    assert_matches!(
        exits.as_slice(),
        [
            (EventKind::Deposit, StreamExit::Shutdown { watermark: deposit_mark }),
            (EventKind::ExitStarted, StreamExit::Shutdown { watermark: exit_mark }),
        ] if *deposit_mark == BlockNumber::new(104) && *exit_mark == BlockNumber::new(100)
    );
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn no_events_keep_watermark() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    let pool = Arc::new(PendingPool::new());

    let handle = RootChain::new(&config(), source.clone(), pool.clone())?.spawn();
    source.wait_queries(EventKind::Deposit, 3).await;
    let exits = handle.shutdown_and_join().await;

    assert!(
        source
            .from_blocks(EventKind::Deposit)
            .iter()
            .all(|from| *from == 100)
    );
    assert!(
        exits
            .iter()
            .all(|(_, exit)| exit.watermark() == BlockNumber::new(100))
    );
    assert_eq!(pool.pending_len().await, 0);
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn failing_source_stops_only_its_stream() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    source.push(
        EventKind::Deposit,
        Err(SourceError::unreachable("connection refused")),
    );
    source.push(EventKind::Deposit, Ok(vec![deposit(101, 10)]));
    source.push(EventKind::ExitStarted, Ok(vec![exit_started(102)]));
    let pool = Arc::new(PendingPool::new());

    let mut handle = RootChain::new(&config(), source.clone(), pool.clone())?.spawn();

    let (kind, exit) = handle.join_next().await.expect("Two tasks running")?;
    assert_eq!(kind, EventKind::Deposit);
    assert_matches!(
        exit,
        StreamExit::SourceFailed {
            watermark,
            source: SourceError::Unreachable { .. },
        } if watermark == BlockNumber::new(100)
    );

    // The exit stream keeps polling while the deposit one stays silent
    let deposit_queries = source.from_blocks(EventKind::Deposit).len();
    source.wait_queries(EventKind::ExitStarted, 5).await;
    assert_eq!(
        source.from_blocks(EventKind::Deposit).len(),
        deposit_queries
    );
    assert_eq!(deposit_queries, 1);
    assert_eq!(pool.pending_len().await, 0);

    let exits = handle.shutdown_and_join().await;
    assert_matches!(
        exits.as_slice(),
        [(EventKind::ExitStarted, StreamExit::Shutdown { watermark })]
            if *watermark == BlockNumber::new(103)
    );
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn retries_recover_transient_failure() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    source.push(
        EventKind::Deposit,
        Err(SourceError::unreachable("connection reset")),
    );
    source.push(EventKind::Deposit, Ok(vec![deposit(120, 7)]));
    let pool = Arc::new(PendingPool::new());
    let mut added_rx = pool.subscribe();

    let mut config = config();
    config.max_query_retries = 3;
    let handle = RootChain::new(&config, source.clone(), pool.clone())?.spawn();

    added_rx.wait_for(|added| 1 <= *added).await?;
    source.wait_queries(EventKind::Deposit, 3).await;
    let exits = handle.shutdown_and_join().await;

    assert_eq!(
        &source.from_blocks(EventKind::Deposit)[..3],
        [100, 100, 121]
    );
    assert_eq!(pool.take_pending().await, vec![expected_deposit(7)]);
    assert_matches!(
        exits.as_slice(),
        [(EventKind::Deposit, StreamExit::Shutdown { watermark }), _]
            if *watermark == BlockNumber::new(121)
    );
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn shutdown_interrupts_sleep() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    let mut config = config();
    config.poll_interval = Duration::from_secs(3600);
    let handle = RootChain::new(&config, source.clone(), Arc::new(PendingPool::new()))?.spawn();

    source.wait_queries(EventKind::Deposit, 1).await;
    source.wait_queries(EventKind::ExitStarted, 1).await;

    let start = Instant::now();
    let exits = handle.shutdown_and_join().await;

    assert!(start.elapsed() < Duration::from_secs(3600));
    assert_eq!(exits.len(), 2);
    assert!(
        exits
            .iter()
            .all(|(_, exit)| matches!(exit, StreamExit::Shutdown { .. }))
    );
    assert_eq!(source.from_blocks(EventKind::Deposit), [100]);
    Ok(())
}

#[test_log::test(tokio::test(start_paused = true))]
async fn shutdown_mid_batch_redelivers_it() -> BoxedErrorResult<()> {
    let source = FakeRootChain::new();
    for _ in 0..2 {
        source.push(
            EventKind::Deposit,
            Ok(vec![deposit(101, 10), deposit(103, 20)]),
        );
    }
    let stalling = StallingOperator::new(2);

    let handle = RootChain::new(&config(), source.clone(), stalling.clone())?.spawn();
    stalling.wait_calls(2).await;
    let exits = handle.shutdown_and_join().await;

    assert_matches!(
        exits.as_slice(),
        [(EventKind::Deposit, StreamExit::Shutdown { watermark }), _]
            if *watermark == BlockNumber::new(100)
    );
    assert_eq!(
        stalling.pool.take_pending().await,
        vec![expected_deposit(10)]
    );

    // Restarting from the reported watermark gets the whole batch again
    let pool = Arc::new(PendingPool::new());
    let mut added_rx = pool.subscribe();
    let mut config = config();
    config.start_block = BlockNumber::new(100);
    let handle = RootChain::new(&config, source.clone(), pool.clone())?.spawn();

    added_rx.wait_for(|added| 2 <= *added).await?;
    source.wait_queries(EventKind::Deposit, 3).await;
    let exits = handle.shutdown_and_join().await;

    assert_eq!(
        &source.from_blocks(EventKind::Deposit)[..3],
        [100, 100, 104]
    );
    assert_eq!(
        pool.take_pending().await,
        vec![expected_deposit(10), expected_deposit(20)]
    );
    assert_matches!(
        exits.as_slice(),
        [(EventKind::Deposit, StreamExit::Shutdown { watermark }), _]
            if *watermark == BlockNumber::new(104)
    );
    Ok(())
}
