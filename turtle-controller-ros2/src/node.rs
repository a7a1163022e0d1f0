use std::{
    future::Future,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::{Mutex, MutexGuard};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;
use turtle_controller::Error;

/// ROS2 context. The middleware is shut down once this and every node
/// created from it are dropped.
#[derive(Clone)]
pub struct Context {
    inner: r2r::Context,
}

impl Context {
    /// Initializes the ROS2 middleware.
    pub fn init() -> Result<Self, Error> {
        let inner = r2r::Context::create().map_err(anyhow::Error::from)?;
        info!("ROS2 context initialized");
        Ok(Self { inner })
    }

    /// Creates a new ROS2 node in this context.
    pub fn create_node(&self, name: &str, namespace: &str) -> Result<Node, Error> {
        Node::with_context(self.inner.clone(), name, namespace)
    }

    /// Releases this handle on the middleware.
    pub fn shutdown(self) {
        drop(self.inner);
        info!("ROS2 context shut down");
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

/// ROS2 node. This is a wrapper around `Arc<Mutex<r2r::Node>>`.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    node: Mutex<r2r::Node>,
    has_spin_thread: AtomicBool,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
    failure_tx: mpsc::UnboundedSender<Error>,
    failure_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Error>>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        for handle in self.subscriptions.get_mut().drain(..) {
            handle.abort();
        }
    }
}

impl Node {
    /// Creates a new ROS2 node with its own context.
    pub fn new(name: &str, namespace: &str) -> Result<Self, Error> {
        Context::init()?.create_node(name, namespace)
    }

    /// Creates a new ROS2 node with `r2r::Context`.
    pub fn with_context(ctx: r2r::Context, name: &str, namespace: &str) -> Result<Self, Error> {
        let node = r2r::Node::create(ctx, name, namespace).map_err(anyhow::Error::from)?;
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(NodeInner {
                node: Mutex::new(node),
                has_spin_thread: AtomicBool::new(false),
                subscriptions: Mutex::new(vec![]),
                failure_tx,
                failure_rx: tokio::sync::Mutex::new(failure_rx),
            }),
        })
    }

    /// Gets underlying `r2r::Node`.
    pub fn r2r(&self) -> MutexGuard<'_, r2r::Node> {
        self.inner.node.lock()
    }

    /// Creates a thread to spin the ROS2 node.
    pub fn run_spin_thread(&self, interval: Duration) {
        if self.inner.has_spin_thread.swap(true, Ordering::Relaxed) {
            return;
        }
        let node = self.clone();
        tokio::spawn(async move {
            while Arc::strong_count(&node.inner) > 1 {
                node.spin_once(interval).await;
            }
        });
    }

    pub(crate) fn failure_sender(&self) -> mpsc::UnboundedSender<Error> {
        self.inner.failure_tx.clone()
    }

    pub(crate) fn push_subscription(&self, handle: JoinHandle<()>) {
        self.inner.subscriptions.lock().push(handle);
    }

    /// Spins the ROS2 node.
    pub async fn spin_once(&self, duration: Duration) {
        let now = std::time::Instant::now();
        // Sleep with tokio::time::sleep instead of spin_once, since spin_once
        // blocks the current thread while still holding the lock.
        self.r2r().spin_once(Duration::ZERO);
        tokio::time::sleep(duration.saturating_sub(now.elapsed())).await;
    }

    /// Spins the ROS2 node until `shutdown` completes or a subscription
    /// fails. The failure of a subscription is returned as is, and so is an
    /// error from `shutdown`.
    pub async fn spin_until(
        &self,
        interval: Duration,
        shutdown: impl Future<Output = io::Result<()>>,
    ) -> Result<(), Error> {
        tokio::pin!(shutdown);
        let mut failures = self.inner.failure_rx.lock().await;
        loop {
            tokio::select! {
                res = &mut shutdown => {
                    return res.map_err(|e| {
                        Error::Other(anyhow::Error::from(e).context("failed to wait for shutdown"))
                    });
                }
                Some(e) = failures.recv() => return Err(e),
                () = self.spin_once(interval) => {}
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field(
                "has_spin_thread",
                &self.inner.has_spin_thread.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}
