//! Drive send and expect conformance runs over a pluggable transport.
//!
//! A [Driver] resolves a type in a [wireproof_fixture::Registry] and, for a given seed, either
//! publishes the sample the seed generates ([Driver::send]) or waits for a delivery that
//! validates against it ([Driver::expect]). The middleware that actually moves samples is a
//! collaborator behind the [Transport], [Publisher] and [Subscriber] traits.
//!
//! # Receive semantics
//!
//! Transports may redeliver or reorder under load. Deliveries without data and samples whose key
//! members do not belong to the expected seed are ignored and the driver keeps waiting until its
//! deadline. The first delivery that passes the identity check decides the [Verdict]. Deadlines
//! are measured on a monotonic clock and a delivery that completes after the deadline never
//! yields [Verdict::Match].
//!
//! # Status
//!
//! `wireproof-driver` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use std::{error::Error as StdError, fmt::Debug, future::Future};
use thiserror::Error;
use wireproof_fixture::{Mismatch, Sample};

mod driver;
pub use driver::{Config, Driver, ReceiveState, SendState};
pub mod mocks;

/// Errors that can occur when driving a conformance run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("fixture error: {0}")]
    Fixture(#[from] wireproof_fixture::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Outcome of waiting for a sample.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// A delivery validated against the expected seed.
    Match,
    /// A delivery of the expected instance arrived with the wrong content.
    Mismatch(Mismatch),
    /// Nothing acceptable arrived before the deadline.
    Timeout,
    /// The transport failed while waiting.
    TransportError(String),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// A sample handed over by a [Subscriber].
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub sample: Sample,
    /// Whether the delivery carries data (lifecycle notifications do not).
    pub valid: bool,
}

impl Delivery {
    pub fn new(sample: Sample) -> Self {
        Self {
            sample,
            valid: true,
        }
    }

    pub fn invalid(sample: Sample) -> Self {
        Self {
            sample,
            valid: false,
        }
    }
}

/// Creates typed endpoints on some middleware.
pub trait Transport: Send + 'static {
    /// Error that can occur when creating an endpoint or moving samples.
    type Error: Debug + StdError + Send + Sync;

    type Publisher: Publisher<Error = Self::Error>;
    type Subscriber: Subscriber<Error = Self::Error>;

    /// Create a publishing endpoint for the topic `name`.
    fn create_publisher(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Publisher, Self::Error>> + Send;

    /// Create a subscription to the topic `name`.
    fn create_subscriber(
        &mut self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Subscriber, Self::Error>> + Send;

    /// Diagnostic of the most recent failure, if the middleware keeps one.
    fn last_error(&self) -> Option<String>;
}

/// Interface for publishing samples of a single topic.
pub trait Publisher: Send + 'static {
    type Error: Debug + StdError + Send + Sync;

    /// Publish a sample.
    fn publish(&mut self, sample: &Sample) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Interface for receiving samples of a single topic.
pub trait Subscriber: Send + 'static {
    type Error: Debug + StdError + Send + Sync;

    /// Wait for the next delivery.
    ///
    /// The driver drops the returned future when its deadline expires, so nothing received after
    /// the deadline can produce a match. A delivery the implementation has already dequeued when
    /// the future is dropped may be lost.
    fn receive(&mut self) -> impl Future<Output = Result<Delivery, Self::Error>> + Send;
}
