use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::RemoteError;
use crate::models::identity::Identity;

/// Supplies the current identity and announces sign-in/sign-out.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Identity>, RemoteError>;

    /// Every later identity change is delivered to the returned subscription
    /// until it is cancelled or dropped.
    fn on_session_change(&self) -> SessionSubscription;

    async fn sign_out(&self) -> Result<(), RemoteError>;
}

/// Holds the current identity and fans changes out to subscriptions.
#[derive(Debug)]
pub struct SessionChannel {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionChannel {
    pub fn new(initial: Option<Identity>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Publish a new identity. Subscribers are only woken if it differs from
    /// the previous one.
    pub fn set(&self, identity: Option<Identity>) {
        self.tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Scoped registration for session-change notifications. Released exactly
/// once, either by `cancel` or on drop.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: Option<watch::Receiver<Option<Identity>>>,
}

impl SessionSubscription {
    /// Wait for the next identity change. `None` once the subscription is
    /// released or the provider has gone away.
    pub async fn changed(&mut self) -> Option<Option<Identity>> {
        let rx = self.rx.as_mut()?;
        rx.changed().await.ok()?;
        let identity = rx.borrow_and_update().clone();
        Some(identity)
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!("Session subscription released");
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
