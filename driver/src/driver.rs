use crate::{Error, Publisher, Subscriber, Transport, Verdict};
use std::{collections::HashMap, fmt::Display, time::Duration};
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, trace, warn};
use wireproof_fixture::{Registry, TypeHandler};

/// Configuration for the [Driver].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Pause after publishing before the publisher is released, giving the transport time to
    /// hand the sample to subscribers.
    pub linger: Duration,
}

/// Progress of the last send of a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SendState {
    #[default]
    Idle,
    Generating,
    Publishing,
    Done,
    Failed,
}

/// Progress of the last expect of a type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReceiveState {
    #[default]
    Idle,
    Waiting,
    Received,
    Validated,
    Mismatched,
    TimedOut,
    Failed,
}

/// Runs conformance operations for the types of a [Registry].
pub struct Driver<T: Transport> {
    config: Config,
    registry: Registry,
    transport: T,

    sends: HashMap<String, SendState>,
    receives: HashMap<String, ReceiveState>,
    last_error: Option<String>,
    transport_error: Option<String>,
}

impl<T: Transport> Driver<T> {
    pub fn new(config: Config, registry: Registry, transport: T) -> Self {
        Self {
            config,
            registry,
            transport,
            sends: HashMap::new(),
            receives: HashMap::new(),
            last_error: None,
            transport_error: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Diagnostic of the most recent operation, if it failed.
    ///
    /// Cleared when the next operation starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn send_state(&self, name: &str) -> SendState {
        self.resolve(name)
            .and_then(|name| self.sends.get(name).copied())
            .unwrap_or_default()
    }

    pub fn receive_state(&self, name: &str) -> ReceiveState {
        self.resolve(name)
            .and_then(|name| self.receives.get(name).copied())
            .unwrap_or_default()
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.registry.lookup(name).map(TypeHandler::name)
    }

    fn set_send(&mut self, name: &str, state: SendState) {
        trace!(name, ?state, "send");
        self.sends.insert(name.to_string(), state);
    }

    fn set_receive(&mut self, name: &str, state: ReceiveState) {
        trace!(name, ?state, "receive");
        self.receives.insert(name.to_string(), state);
    }

    /// Reset diagnostics at the start of an operation.
    fn begin(&mut self) {
        self.last_error = None;
        self.transport_error = self.transport.last_error();
    }

    /// Record a failure, enriched with the transport's own diagnostic if it was raised by the
    /// current operation.
    fn fail(&mut self, err: impl Display) -> String {
        let mut message = err.to_string();
        if let Some(detail) = self.transport.last_error() {
            if detail != message && Some(&detail) != self.transport_error.as_ref() {
                message = format!("{message} ({detail})");
            }
        }
        self.last_error = Some(message.clone());
        message
    }

    /// Publish the sample `seed` generates for the type `name`.
    ///
    /// The sample is released on every path. Transport failures are returned, never swallowed.
    pub async fn send(&mut self, name: &str, seed: i64) -> Result<(), Error> {
        self.begin();
        let registry = self.registry.clone();
        let handler = match registry.get(name) {
            Ok(handler) => handler,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        let topic = handler.name();

        self.set_send(topic, SendState::Generating);
        let sample = handler.generate(seed);

        let mut publisher = match self.transport.create_publisher(topic).await {
            Ok(publisher) => publisher,
            Err(err) => {
                self.set_send(topic, SendState::Failed);
                let message = self.fail(err);
                warn!(name = topic, error = %message, "failed to create publisher");
                return Err(Error::Transport(message));
            }
        };
        self.set_send(topic, SendState::Publishing);
        if let Err(err) = publisher.publish(&sample).await {
            self.set_send(topic, SendState::Failed);
            let message = self.fail(err);
            warn!(name = topic, seed, error = %message, "failed to publish sample");
            return Err(Error::Transport(message));
        }
        debug!(name = topic, seed, "published sample");
        if !self.config.linger.is_zero() {
            sleep(self.config.linger).await;
        }
        self.set_send(topic, SendState::Done);
        Ok(())
    }

    /// Wait up to `timeout` for a delivery of the type `name` and judge it against `seed`.
    ///
    /// Deliveries without data and samples whose key members belong to another seed are ignored.
    /// Only an unknown type is an error; everything the transport does is a [Verdict].
    pub async fn expect(
        &mut self,
        name: &str,
        seed: i64,
        timeout: Duration,
    ) -> Result<Verdict, Error> {
        self.begin();
        let deadline = Instant::now() + timeout;
        let registry = self.registry.clone();
        let handler = match registry.get(name) {
            Ok(handler) => handler,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        let topic = handler.name();

        let mut subscriber = match self.transport.create_subscriber(topic).await {
            Ok(subscriber) => subscriber,
            Err(err) => {
                self.set_receive(topic, ReceiveState::Failed);
                let message = self.fail(err);
                warn!(name = topic, error = %message, "failed to create subscriber");
                return Ok(Verdict::TransportError(message));
            }
        };
        self.set_receive(topic, ReceiveState::Waiting);
        loop {
            let delivery = match timeout_at(deadline, subscriber.receive()).await {
                Ok(Ok(delivery)) => delivery,
                Ok(Err(err)) => {
                    self.set_receive(topic, ReceiveState::Failed);
                    let message = self.fail(err);
                    warn!(name = topic, error = %message, "failed to receive sample");
                    return Ok(Verdict::TransportError(message));
                }
                Err(_) => {
                    self.set_receive(topic, ReceiveState::TimedOut);
                    info!(name = topic, seed, ?timeout, "timed out");
                    return Ok(Verdict::Timeout);
                }
            };

            // Late deliveries never match
            if Instant::now() > deadline {
                self.set_receive(topic, ReceiveState::TimedOut);
                info!(name = topic, seed, ?timeout, "delivery after deadline");
                return Ok(Verdict::Timeout);
            }
            if !delivery.valid {
                debug!(name = topic, "ignoring delivery without data");
                continue;
            }
            if let Err(mismatch) = handler.identify(&delivery.sample, seed) {
                debug!(name = topic, seed, %mismatch, "ignoring sample of another instance");
                continue;
            }

            self.set_receive(topic, ReceiveState::Received);
            return Ok(match handler.validate(&delivery.sample, seed) {
                Ok(()) => {
                    self.set_receive(topic, ReceiveState::Validated);
                    info!(name = topic, seed, "sample matched");
                    Verdict::Match
                }
                Err(mismatch) => {
                    self.set_receive(topic, ReceiveState::Mismatched);
                    self.last_error = Some(mismatch.to_string());
                    warn!(name = topic, seed, %mismatch, "sample mismatched");
                    Verdict::Mismatch(mismatch)
                }
            });
        }
    }
}
