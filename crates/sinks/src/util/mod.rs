//! Sink utilities

pub mod rate_limited_logger;

pub use rate_limited_logger::{
    DEFAULT_LOG_INTERVAL, MAX_PAYLOAD_LOG_LENGTH, RateLimitedLogger, truncate_payload,
};
