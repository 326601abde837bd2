//! Mock implementations for testing.

mod loopback;
pub use loopback::{Config, Error, Loopback, LoopbackPublisher, LoopbackSubscriber};
