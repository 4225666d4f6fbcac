//! Sluice Protocol - Upstream contract consumed by the sinks
//!
//! This crate provides the types that flow from the host pipeline into a sink:
//! - `Message` - One structured record with its creation timestamp
//! - `Transaction` - An ordered batch of messages plus its acknowledgment slot
//! - `Ack` - The single acknowledgment a sink sends back per transaction
//!
//! # Design Principles
//!
//! - **Zero-copy payloads**: Message bodies are `bytes::Bytes`, cheap to clone
//! - **Record time, not wall time**: Every message carries its own `created_at`,
//!   so time-based decisions downstream replay identically from a recording
//! - **One ack per transaction**: The ack carries row counts so a partially
//!   written batch is distinguishable from a complete one

mod error;
mod message;
mod transaction;

pub use error::ProtocolError;
pub use message::{Message, Record};
pub use transaction::{Ack, Transaction};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Capacity of the acknowledgment channel created by [`Transaction::with_ack_channel`]
pub const DEFAULT_ACK_CAPACITY: usize = 1;

// Test modules - only compiled during testing
#[cfg(test)]
mod error_test;
