use auto_impl::auto_impl;

use crate::{error::Error, msg::Message};

/// Keep-last history settings of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QosProfile {
    pub depth: usize,
}

impl QosProfile {
    pub const fn keep_last(depth: usize) -> Self {
        Self { depth }
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::keep_last(crate::QUEUE_DEPTH)
    }
}

#[auto_impl(&, Box, Arc)]
pub trait Publisher<T: Message>: Send + Sync {
    fn publish(&self, msg: &T) -> Result<(), Error>;
}

/// A publish/subscribe middleware that nodes register their channels with.
pub trait Middleware {
    fn create_publisher<T: Message>(
        &mut self,
        topic: &str,
        qos: QosProfile,
    ) -> Result<Box<dyn Publisher<T>>, Error>;

    /// Binds `callback` to `topic`. The middleware's dispatcher invokes it
    /// once per delivered message; an `Err` from the callback is fatal to
    /// the dispatch loop.
    fn create_subscription<T, F>(
        &mut self,
        topic: &str,
        qos: QosProfile,
        callback: F,
    ) -> Result<(), Error>
    where
        T: Message,
        F: FnMut(T) -> Result<(), Error> + Send + 'static;
}
