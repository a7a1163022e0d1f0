use parking_lot::Mutex;

use crate::{error::Error, msg::Message, traits::Publisher};

/// Publisher that keeps every published message in memory.
#[derive(Debug, Default)]
pub struct DummyPublisher<T> {
    pub published: Mutex<Vec<T>>,
}

impl<T: Message> DummyPublisher<T> {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.published.lock())
    }
}

impl<T: Message> Publisher<T> for DummyPublisher<T> {
    fn publish(&self, msg: &T) -> Result<(), Error> {
        self.published.lock().push(msg.clone());
        Ok(())
    }
}
