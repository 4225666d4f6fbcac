//! Transaction - A batch of messages awaiting one acknowledgment
//!
//! The host pipeline hands a sink one `Transaction` at a time. The sink
//! processes every message, then deposits exactly one `Ack` in the
//! transaction's response channel.
//!
//! ```text
//! [Host] --Transaction--> [Sink] --Ack--> [Host]
//! ```

use tokio::sync::mpsc;

use crate::DEFAULT_ACK_CAPACITY;
use crate::message::Message;

/// Acknowledgment for one transaction
///
/// Sent once per transaction regardless of row-level failures. The counts let
/// upstream distinguish a fully written batch from a partially written one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack {
    /// Rows executed successfully against the open statement
    pub rows_written: u64,

    /// Rows that failed to decode or execute
    pub rows_failed: u64,
}

impl Ack {
    /// Create an acknowledgment with the given counts
    pub const fn new(rows_written: u64, rows_failed: u64) -> Self {
        Self {
            rows_written,
            rows_failed,
        }
    }

    /// True when no row in the transaction failed
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.rows_failed == 0
    }

    /// Total rows the sink saw in the transaction
    #[inline]
    pub fn total(&self) -> u64 {
        self.rows_written + self.rows_failed
    }
}

/// An ordered batch of messages and the slot for its acknowledgment
#[derive(Debug)]
pub struct Transaction {
    /// Messages in delivery order
    messages: Vec<Message>,

    /// Where the sink sends the acknowledgment
    response: mpsc::Sender<Ack>,
}

impl Transaction {
    /// Create a transaction with an existing response channel
    pub fn new(messages: Vec<Message>, response: mpsc::Sender<Ack>) -> Self {
        Self { messages, response }
    }

    /// Create a transaction together with a fresh acknowledgment receiver
    pub fn with_ack_channel(messages: Vec<Message>) -> (Self, mpsc::Receiver<Ack>) {
        let (tx, rx) = mpsc::channel(DEFAULT_ACK_CAPACITY);
        (Self::new(messages, tx), rx)
    }

    /// Get the messages
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the transaction carries no messages
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the response channel
    #[inline]
    pub fn response(&self) -> &mpsc::Sender<Ack> {
        &self.response
    }

    /// Split into messages and response channel
    pub fn into_parts(self) -> (Vec<Message>, mpsc::Sender<Ack>) {
        (self.messages, self.response)
    }
}
