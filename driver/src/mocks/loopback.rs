//! In-memory [Transport] that hands every published sample to every subscriber of its topic.
//!
//! Subscribers only see samples published after they subscribed. Latency is applied on the
//! receiving side, so a delivery that is still in flight when the caller gives up is lost.

use crate::{Delivery, Publisher, Subscriber, Transport};
use futures::{channel::mpsc, StreamExt};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tracing::trace;
use wireproof_fixture::Sample;

/// Errors injected by the [Loopback].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("endpoint refused: {0}")]
    Refused(String),
    #[error("publish refused: {0}")]
    PublishRefused(String),
    #[error("subscription closed: {0}")]
    Closed(String),
}

/// Configuration for the [Loopback].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Delay between publishing a sample and its delivery.
    pub latency: Duration,
    /// Fail every publisher creation.
    pub refuse_publishers: bool,
    /// Fail every subscriber creation.
    pub refuse_subscribers: bool,
    /// Fail every publish.
    pub refuse_publish: bool,
}

struct Envelope {
    at: Instant,
    delivery: Delivery,
}

#[derive(Default)]
struct Hub {
    topics: HashMap<String, Vec<mpsc::UnboundedSender<Envelope>>>,
    last_error: Option<String>,
    published: usize,
}

impl Hub {
    fn fail(&mut self, err: Error) -> Error {
        self.last_error = Some(err.to_string());
        err
    }

    fn broadcast(&mut self, name: &str, delivery: Delivery, at: Instant) {
        let Some(subscribers) = self.topics.get_mut(name) else {
            return;
        };
        subscribers.retain(|subscriber| {
            subscriber
                .unbounded_send(Envelope {
                    at,
                    delivery: delivery.clone(),
                })
                .is_ok()
        });
        trace!(name, subscribers = subscribers.len(), "broadcast");
    }
}

/// In-memory transport shared by every clone.
#[derive(Clone)]
pub struct Loopback {
    config: Config,
    hub: Arc<Mutex<Hub>>,
}

impl Loopback {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hub: Arc::new(Mutex::new(Hub::default())),
        }
    }

    fn hub(&self) -> MutexGuard<'_, Hub> {
        lock(&self.hub)
    }

    /// Hand `delivery` to every current subscriber of `name` without a publisher.
    ///
    /// Used to simulate redelivered (stale) samples and deliveries without data.
    pub fn inject(&self, name: &str, delivery: Delivery) {
        let at = Instant::now() + self.config.latency;
        self.hub().broadcast(name, delivery, at);
    }

    /// Close every subscription to `name`.
    pub fn close(&self, name: &str) {
        self.hub().topics.remove(name);
    }

    /// Number of live subscriptions to `name`.
    pub fn subscribers(&self, name: &str) -> usize {
        self.hub()
            .topics
            .get(name)
            .map_or(0, |subscribers| {
                subscribers
                    .iter()
                    .filter(|subscriber| !subscriber.is_closed())
                    .count()
            })
    }

    /// Number of samples published so far.
    pub fn published(&self) -> usize {
        self.hub().published
    }
}

fn lock(hub: &Mutex<Hub>) -> MutexGuard<'_, Hub> {
    hub.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport for Loopback {
    type Error = Error;
    type Publisher = LoopbackPublisher;
    type Subscriber = LoopbackSubscriber;

    async fn create_publisher(&mut self, name: &str) -> Result<LoopbackPublisher, Error> {
        if self.config.refuse_publishers {
            return Err(self.hub().fail(Error::Refused(name.to_string())));
        }
        Ok(LoopbackPublisher {
            name: name.to_string(),
            latency: self.config.latency,
            refuse: self.config.refuse_publish,
            hub: self.hub.clone(),
        })
    }

    async fn create_subscriber(&mut self, name: &str) -> Result<LoopbackSubscriber, Error> {
        if self.config.refuse_subscribers {
            return Err(self.hub().fail(Error::Refused(name.to_string())));
        }
        let (sender, receiver) = mpsc::unbounded();
        self.hub()
            .topics
            .entry(name.to_string())
            .or_default()
            .push(sender);
        Ok(LoopbackSubscriber {
            name: name.to_string(),
            receiver,
        })
    }

    fn last_error(&self) -> Option<String> {
        self.hub().last_error.clone()
    }
}

/// Publisher of a [Loopback] topic.
pub struct LoopbackPublisher {
    name: String,
    latency: Duration,
    refuse: bool,
    hub: Arc<Mutex<Hub>>,
}

impl Publisher for LoopbackPublisher {
    type Error = Error;

    async fn publish(&mut self, sample: &Sample) -> Result<(), Error> {
        let mut hub = lock(&self.hub);
        if self.refuse {
            return Err(hub.fail(Error::PublishRefused(self.name.clone())));
        }
        hub.published += 1;
        let at = Instant::now() + self.latency;
        hub.broadcast(&self.name, Delivery::new(sample.clone()), at);
        Ok(())
    }
}

/// Subscription to a [Loopback] topic.
pub struct LoopbackSubscriber {
    name: String,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl Subscriber for LoopbackSubscriber {
    type Error = Error;

    async fn receive(&mut self) -> Result<Delivery, Error> {
        let Some(Envelope { at, delivery }) = self.receiver.next().await else {
            return Err(Error::Closed(self.name.clone()));
        };
        sleep_until(at).await;
        Ok(delivery)
    }
}
