use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use turtle_controller::{TurtleControllerNode, NODE_NAME, SPIN_INTERVAL};
use turtle_controller_ros2::Context;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let ctx = Context::init()?;
    let mut node = ctx.create_node(NODE_NAME, "")?;
    let controller = TurtleControllerNode::new(&mut node)?;

    let result = node.spin_until(SPIN_INTERVAL, tokio::signal::ctrl_c()).await;
    match &result {
        Ok(()) => info!("shutting down"),
        Err(e) => error!("shutting down: {e:#}"),
    }

    drop(controller);
    drop(node);
    ctx.shutdown();
    result?;
    Ok(())
}
