//! In-process publish/subscribe middleware.
//!
//! Every [`LocalContext`] is an isolated bus: nodes created from one context
//! never see traffic of another. Nothing is delivered until the owner calls
//! [`LocalContext::spin_once`], which runs the callbacks on the calling thread.
//!
//! Subscriptions belong to the node that created them and are removed once
//! the last clone of that [`LocalNode`] is dropped. A publisher is counted
//! until its handle is dropped. Topics without any registration are removed.

use std::{
    any::Any,
    collections::{HashMap, VecDeque},
    marker::PhantomData,
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    error::Error,
    msg::Message,
    traits::{Middleware, Publisher, QosProfile},
};

type Payload = Arc<dyn Any + Send + Sync>;
type Callback = Arc<Mutex<dyn FnMut(&Payload) -> Result<(), Error> + Send>>;

/// Registration counts of a topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicInfo {
    pub type_name: &'static str,
    pub publisher_count: usize,
    pub subscription_count: usize,
}

/// An in-process middleware context. Dropping it shuts it down.
pub struct LocalContext {
    bus: Arc<Mutex<Bus>>,
}

#[derive(Default)]
struct Bus {
    is_shutdown: bool,
    next_seq: u64,
    next_node_id: u64,
    topics: HashMap<String, Topic>,
}

struct Topic {
    type_name: &'static str,
    publisher_count: usize,
    subscriptions: Vec<Subscription>,
}

struct Subscription {
    node_id: u64,
    depth: usize,
    queue: VecDeque<(u64, Payload)>,
    callback: Callback,
}

impl Topic {
    fn is_unused(&self) -> bool {
        self.publisher_count == 0 && self.subscriptions.is_empty()
    }
}

impl Bus {
    fn ensure_ok(&self) -> Result<(), Error> {
        if self.is_shutdown {
            return Err(Error::Uninitialized {
                message: "local context has been shut down".to_string(),
            });
        }
        Ok(())
    }

    fn topic_mut<T: Message>(&mut self, topic: &str) -> Result<&mut Topic, Error> {
        if let Some(registered) = self.topics.get(topic).map(|t| t.type_name) {
            if registered != T::TYPE_NAME {
                return Err(Error::TypeMismatch {
                    topic: topic.to_string(),
                    registered,
                    requested: T::TYPE_NAME,
                });
            }
        }
        Ok(self.topics.entry(topic.to_string()).or_insert_with(|| Topic {
            type_name: T::TYPE_NAME,
            publisher_count: 0,
            subscriptions: Vec::new(),
        }))
    }

    /// Removes the subscriptions of `node_id` and returns them, so that the
    /// callbacks can be dropped after the lock is released.
    fn remove_node(&mut self, node_id: u64) -> Vec<Subscription> {
        let mut removed = vec![];
        for topic in self.topics.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut topic.subscriptions)
                .into_iter()
                .partition(|sub| sub.node_id == node_id);
            topic.subscriptions = kept;
            removed.extend(gone);
        }
        self.topics.retain(|_, topic| !topic.is_unused());
        removed
    }
}

impl LocalContext {
    /// Creates a new, running context.
    pub fn init() -> Self {
        info!("local context initialized");
        Self {
            bus: Arc::new(Mutex::new(Bus::default())),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.bus.lock().is_shutdown
    }

    /// Stops the context and drops all registrations and queued messages.
    /// Calling this more than once has no further effect.
    pub fn shutdown(&self) {
        let topics = {
            let mut bus = self.bus.lock();
            if bus.is_shutdown {
                return;
            }
            bus.is_shutdown = true;
            std::mem::take(&mut bus.topics)
        };
        // Callbacks may own publishers whose drop locks the bus.
        drop(topics);
        info!("local context shut down");
    }

    pub fn create_node(&self, name: &str) -> Result<LocalNode, Error> {
        let id = {
            let mut bus = self.bus.lock();
            bus.ensure_ok()?;
            bus.next_node_id += 1;
            bus.next_node_id
        };
        debug!("create local node {name}");
        Ok(LocalNode {
            handle: Arc::new(NodeHandle {
                id,
                name: name.to_string(),
                bus: self.bus.clone(),
            }),
        })
    }

    pub fn topic_info(&self, topic: &str) -> Option<TopicInfo> {
        self.bus.lock().topics.get(topic).map(|t| TopicInfo {
            type_name: t.type_name,
            publisher_count: t.publisher_count,
            subscription_count: t.subscriptions.len(),
        })
    }

    /// Delivers every queued message in publication order and returns the
    /// number of callbacks invoked. Messages published by the callbacks are
    /// queued for the next call.
    pub fn spin_once(&self) -> Result<usize, Error> {
        let mut deliveries = {
            let mut bus = self.bus.lock();
            bus.ensure_ok()?;
            let mut deliveries = vec![];
            for topic in bus.topics.values_mut() {
                for sub in &mut topic.subscriptions {
                    for (seq, payload) in sub.queue.drain(..) {
                        deliveries.push((seq, sub.callback.clone(), payload));
                    }
                }
            }
            deliveries
        };
        deliveries.sort_by_key(|(seq, _, _)| *seq);

        let count = deliveries.len();
        for (_, callback, payload) in deliveries {
            let mut callback = callback.lock();
            (*callback)(&payload)?;
        }
        Ok(count)
    }

    /// Spins until a round delivers nothing or `max_rounds` rounds have run.
    /// Returns the total number of callbacks invoked.
    pub fn spin_until_idle(&self, max_rounds: usize) -> Result<usize, Error> {
        let mut total = 0;
        for _ in 0..max_rounds {
            let n = self.spin_once()?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }
}

impl Drop for LocalContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LocalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bus = self.bus.lock();
        f.debug_struct("LocalContext")
            .field("is_shutdown", &bus.is_shutdown)
            .field("topics", &bus.topics.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A node registered with a [`LocalContext`]. Clones share the same
/// registrations.
#[derive(Clone)]
pub struct LocalNode {
    handle: Arc<NodeHandle>,
}

struct NodeHandle {
    id: u64,
    name: String,
    bus: Arc<Mutex<Bus>>,
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        let removed = self.bus.lock().remove_node(self.id);
        debug!("drop local node {} ({} subscriptions)", self.name, removed.len());
        drop(removed);
    }
}

impl LocalNode {
    pub fn name(&self) -> &str {
        &self.handle.name
    }
}

impl std::fmt::Debug for LocalNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNode")
            .field("name", &self.handle.name)
            .finish_non_exhaustive()
    }
}

impl Middleware for LocalNode {
    fn create_publisher<T: Message>(
        &mut self,
        topic: &str,
        _qos: QosProfile,
    ) -> Result<Box<dyn Publisher<T>>, Error> {
        let mut bus = self.handle.bus.lock();
        bus.ensure_ok()?;
        bus.topic_mut::<T>(topic)?.publisher_count += 1;
        debug!("{}: create publisher {topic} [{}]", self.name(), T::TYPE_NAME);
        Ok(Box::new(LocalPublisher {
            topic: topic.to_string(),
            bus: self.handle.bus.clone(),
            _phantom: PhantomData,
        }))
    }

    fn create_subscription<T, F>(
        &mut self,
        topic: &str,
        qos: QosProfile,
        mut callback: F,
    ) -> Result<(), Error>
    where
        T: Message,
        F: FnMut(T) -> Result<(), Error> + Send + 'static,
    {
        // Built before locking: on error it is dropped after the guard.
        let callback: Callback = Arc::new(Mutex::new(move |payload: &Payload| {
            // Topics are typed at registration, so the downcast cannot fail.
            match payload.downcast_ref::<T>() {
                Some(msg) => callback(msg.clone()),
                None => Ok(()),
            }
        }));
        let mut bus = self.handle.bus.lock();
        bus.ensure_ok()?;
        bus.topic_mut::<T>(topic)?.subscriptions.push(Subscription {
            node_id: self.handle.id,
            depth: qos.depth.max(1),
            queue: VecDeque::new(),
            callback,
        });
        debug!("{}: create subscription {topic} [{}]", self.name(), T::TYPE_NAME);
        Ok(())
    }
}

struct LocalPublisher<T> {
    topic: String,
    bus: Arc<Mutex<Bus>>,
    _phantom: PhantomData<fn(T)>,
}

impl<T> Drop for LocalPublisher<T> {
    fn drop(&mut self) {
        let mut bus = self.bus.lock();
        let Some(topic) = bus.topics.get_mut(&self.topic) else {
            return;
        };
        topic.publisher_count -= 1;
        if topic.is_unused() {
            bus.topics.remove(&self.topic);
        }
    }
}

impl<T: Message> Publisher<T> for LocalPublisher<T> {
    fn publish(&self, msg: &T) -> Result<(), Error> {
        let mut bus = self.bus.lock();
        bus.ensure_ok()?;
        let seq = bus.next_seq;
        bus.next_seq += 1;
        let Some(topic) = bus.topics.get_mut(&self.topic) else {
            return Ok(());
        };
        let payload: Payload = Arc::new(msg.clone());
        for sub in &mut topic.subscriptions {
            if sub.queue.len() == sub.depth {
                sub.queue.pop_front();
            }
            sub.queue.push_back((seq, payload.clone()));
        }
        Ok(())
    }
}
