//! Recording in-memory driver for writer and sink tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::column::Param;
use crate::driver::{Connection, DriverError, Statement, Transaction};

/// A driver call, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Ping,
    Begin,
    Prepare(String),
    Execute(Vec<Param>),
    Commit { rows: usize },
    StatementClose,
    Close,
}

#[derive(Default)]
struct State {
    events: Mutex<Vec<Event>>,
    fail_begin: AtomicUsize,
    fail_execute: AtomicUsize,
    fail_commit: AtomicUsize,
    fail_ping: AtomicBool,
    closed: AtomicBool,
}

impl State {
    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Consume one injected failure, if any are left
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Connection that records every call and can inject failures
#[derive(Clone, Default)]
pub struct RecordingConnection {
    state: Arc<State>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// As a trait object for the writer
    pub fn shared(&self) -> Arc<dyn Connection> {
        Arc::new(self.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.events.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.state.events.lock().iter().filter(|e| matches(*e)).count()
    }

    /// Row counts of every commit, in order
    pub fn commits(&self) -> Vec<usize> {
        self.state
            .events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Commit { rows } => Some(*rows),
                _ => None,
            })
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.count(|e| *e == Event::Close)
    }

    pub fn fail_next_begins(&self, n: usize) {
        self.state.fail_begin.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_executes(&self, n: usize) {
        self.state.fail_execute.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_commits(&self, n: usize) {
        self.state.fail_commit.store(n, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.state.fail_ping.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn ping(&self) -> Result<(), DriverError> {
        self.state.push(Event::Ping);
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(DriverError::ConnectionClosed);
        }
        if self.state.fail_ping.load(Ordering::SeqCst) {
            return Err(DriverError::backend("ping refused"));
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DriverError> {
        self.state.push(Event::Begin);
        if take_failure(&self.state.fail_begin) {
            return Err(DriverError::backend("begin refused"));
        }
        Ok(Box::new(RecordingTransaction {
            state: Arc::clone(&self.state),
            rows: Arc::new(AtomicUsize::new(0)),
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state.push(Event::Close);
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct RecordingTransaction {
    state: Arc<State>,
    rows: Arc<AtomicUsize>,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>, DriverError> {
        self.state.push(Event::Prepare(sql.to_string()));
        Ok(Box::new(RecordingStatement {
            state: Arc::clone(&self.state),
            rows: Arc::clone(&self.rows),
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), DriverError> {
        let rows = self.rows.load(Ordering::SeqCst);
        self.state.push(Event::Commit { rows });
        if take_failure(&self.state.fail_commit) {
            return Err(DriverError::backend("commit refused"));
        }
        Ok(())
    }
}

struct RecordingStatement {
    state: Arc<State>,
    rows: Arc<AtomicUsize>,
}

#[async_trait]
impl Statement for RecordingStatement {
    async fn execute(&mut self, args: &[Param]) -> Result<(), DriverError> {
        if take_failure(&self.state.fail_execute) {
            return Err(DriverError::backend("execute refused"));
        }
        self.state.push(Event::Execute(args.to_vec()));
        self.rows.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.state.push(Event::StatementClose);
        Ok(())
    }
}
