use std::fmt::Debug;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use warden_core::EventBus;

/// Subscribe to `bus` and log every domain event it carries
pub fn spawn_event_logger<E>(bus: &EventBus<E>) -> JoinHandle<()>
where
    E: Clone + Debug + Send + 'static,
{
    let name = bus.name().to_string();
    let mut receiver = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(bus = %name, ?event, "Domain event received"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(bus = %name, skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
