use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

/// Runs the whole authentication flow again. Invoked when a refreshed token expires.
#[async_trait]
pub trait Reauthenticate: Send + Sync {
    async fn reauthenticate(&self);
}

#[async_trait]
impl<F, Fut> Reauthenticate for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn reauthenticate(&self) {
        (self)().await
    }
}

/// Defers a re-authentication. Scheduled tasks are detached: the caller neither
/// awaits nor cancels them, and their outcome is not reported back.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Arc<dyn Reauthenticate>);
}

/// Spawns each task on the current tokio runtime behind a sleep.
///
/// Panics if called outside a Tokio runtime.
///
/// Previously scheduled tasks are left running; refreshing repeatedly before
/// expiry stacks up re-authentications.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Arc<dyn Reauthenticate>) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("Re-authenticating after token expiry");
            task.reauthenticate().await;
        });
    }
}
