//! Tests for the retry strategies, driver and Tower middleware.
//!
//! Test organization:
//! - retry_behavior.rs: Attempt counting and error propagation through the service
//! - retry_config.rs: Builder defaults and strategy selection
//! - retry_events.rs: Event delivery and listener isolation
//! - retry_strategies.rs: Custom, suspending, cancelled and panicking strategies
//! - retry_streams.rs: Retrying operations that open shard-accounted streams

mod retry_behavior;
mod retry_strategies;
