//! Registration notifications.
//!
//! [`MemberService::create`](super::service::MemberService::create) hands a [`UserRegistered`]
//! to the configured [`RegistrationNotifier`] after the row is stored. Delivery is best effort:
//! a failing notifier is logged and never fails the registration.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::domain::{Member, MemberId};

/// Event name used on external buses.
pub const EVENT_USER_REGISTERED: &str = "user.registered";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub user_id: MemberId,
    pub user_name: String,
    pub email: String,
}

impl UserRegistered {
    pub fn new(user_id: MemberId, user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
            user_name: user_name.into(),
            email: email.into(),
        }
    }

    pub fn name(&self) -> &'static str { EVENT_USER_REGISTERED }
}

impl From<&Member> for UserRegistered {
    fn from(m: &Member) -> Self { Self::new(m.id, m.name.clone(), m.email.clone()) }
}

#[async_trait]
pub trait RegistrationNotifier: Send + Sync {
    async fn user_registered(&self, event: UserRegistered) -> anyhow::Result<()>;
}

// NoopNotifier: for deployments without subscribers
#[derive(Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl RegistrationNotifier for NoopNotifier {
    async fn user_registered(&self, _event: UserRegistered) -> anyhow::Result<()> {
        Ok(())
    }
}

/// In-process fan-out over a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<UserRegistered>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserRegistered> { self.tx.subscribe() }

    pub fn subscriber_count(&self) -> usize { self.tx.receiver_count() }
}

#[async_trait]
impl RegistrationNotifier for BroadcastNotifier {
    async fn user_registered(&self, event: UserRegistered) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| anyhow!("no subscribers for {}", EVENT_USER_REGISTERED))
    }
}
