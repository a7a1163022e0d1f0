use std::marker::PhantomData;

use futures::stream::StreamExt;
use parking_lot::Mutex;
use tracing::{debug, error};
use turtle_controller::{msg::Message, Error, Middleware, Publisher, QosProfile};

use crate::Node;

fn r2r_qos(qos: QosProfile) -> r2r::QosProfile {
    r2r::QosProfile::default().keep_last(qos.depth)
}

struct Ros2Publisher<T> {
    topic: String,
    inner: Mutex<r2r::PublisherUntyped>,
    _phantom: PhantomData<fn(T)>,
}

impl<T: Message> Publisher<T> for Ros2Publisher<T> {
    fn publish(&self, msg: &T) -> Result<(), Error> {
        let value = serde_json::to_value(msg).map_err(anyhow::Error::from)?;
        self.inner
            .lock()
            .publish(value)
            .map_err(|e| Error::Connection {
                message: format!("r2r publish error on {}: {e:?}", self.topic),
            })
    }
}

impl Middleware for Node {
    fn create_publisher<T: Message>(
        &mut self,
        topic: &str,
        qos: QosProfile,
    ) -> Result<Box<dyn Publisher<T>>, Error> {
        let publisher = self
            .r2r()
            .create_publisher_untyped(topic, T::TYPE_NAME, r2r_qos(qos))
            .map_err(anyhow::Error::from)?;
        debug!("create publisher {topic} [{}]", T::TYPE_NAME);
        Ok(Box::new(Ros2Publisher {
            topic: topic.to_string(),
            inner: Mutex::new(publisher),
            _phantom: PhantomData,
        }))
    }

    /// Must be called from within a tokio runtime; each subscription is
    /// drained by its own task.
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
        let mut stream = self
            .r2r()
            .subscribe_untyped(topic, T::TYPE_NAME, r2r_qos(qos))
            .map_err(anyhow::Error::from)?;
        debug!("create subscription {topic} [{}]", T::TYPE_NAME);

        let failure_tx = self.failure_sender();
        let topic = topic.to_string();
        let handle = tokio::spawn(async move {
            let result: Result<(), Error> = async {
                while let Some(value) = stream.next().await {
                    let value = value.map_err(anyhow::Error::from)?;
                    let msg: T = serde_json::from_value(value).map_err(anyhow::Error::from)?;
                    callback(msg)?;
                }
                Ok(())
            }
            .await;
            if let Err(e) = result {
                error!("subscription {topic} stopped: {e}");
                // The receiver lives as long as the node.
                let _ = failure_tx.send(e);
            }
        });
        self.push_subscription(handle);
        Ok(())
    }
}
