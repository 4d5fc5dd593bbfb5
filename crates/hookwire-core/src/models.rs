//! Domain models and strongly-typed identifiers.
//!
//! Defines subscriptions, event kinds, payload envelopes, and delivery
//! records for the webhook dispatch pipeline. Identifiers use newtype UUID
//! wrappers for compile-time type safety.

use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Strongly-typed scope identifier.
///
/// A scope isolates subscriptions belonging to one workspace or account.
/// Every trigger call and registry lookup is bound to a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    /// Creates a new random scope ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ScopeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Strongly-typed subscription identifier.
///
/// Each subscription represents one configured webhook destination owned
/// by the external registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Creates a new random subscription ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Closed enumeration of domain events that can trigger webhook dispatch.
///
/// Wire names follow the `<entity>.<verb>` convention. Adding a new kind
/// requires extending this enum and the matching convenience helper on the
/// dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A client record was created.
    #[serde(rename = "client.created")]
    ClientCreated,
    /// A client record was updated.
    #[serde(rename = "client.updated")]
    ClientUpdated,
    /// A client record was deleted.
    #[serde(rename = "client.deleted")]
    ClientDeleted,
    /// A client transitioned to a new status.
    #[serde(rename = "client.status_changed")]
    ClientStatusChanged,
    /// A project record was created.
    #[serde(rename = "project.created")]
    ProjectCreated,
    /// A project record was updated.
    #[serde(rename = "project.updated")]
    ProjectUpdated,
    /// A project record was deleted.
    #[serde(rename = "project.deleted")]
    ProjectDeleted,
    /// A project transitioned to a new status.
    #[serde(rename = "project.status_changed")]
    ProjectStatusChanged,
    /// A project reached its completed state.
    #[serde(rename = "project.completed")]
    ProjectCompleted,
    /// A task record was created.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A task record was updated.
    #[serde(rename = "task.updated")]
    TaskUpdated,
    /// A task record was deleted.
    #[serde(rename = "task.deleted")]
    TaskDeleted,
    /// A task was marked complete.
    #[serde(rename = "task.completed")]
    TaskCompleted,
    /// A free-form activity entry was recorded.
    #[serde(rename = "activity.created")]
    ActivityCreated,
}

impl EventKind {
    /// Wire name of this event kind (`<entity>.<verb>`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientCreated => "client.created",
            Self::ClientUpdated => "client.updated",
            Self::ClientDeleted => "client.deleted",
            Self::ClientStatusChanged => "client.status_changed",
            Self::ProjectCreated => "project.created",
            Self::ProjectUpdated => "project.updated",
            Self::ProjectDeleted => "project.deleted",
            Self::ProjectStatusChanged => "project.status_changed",
            Self::ProjectCompleted => "project.completed",
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskDeleted => "task.deleted",
            Self::TaskCompleted => "task.completed",
            Self::ActivityCreated => "activity.created",
        }
    }

    /// All event kinds, for registries that subscribe to everything.
    pub const ALL: [Self; 14] = [
        Self::ClientCreated,
        Self::ClientUpdated,
        Self::ClientDeleted,
        Self::ClientStatusChanged,
        Self::ProjectCreated,
        Self::ProjectUpdated,
        Self::ProjectDeleted,
        Self::ProjectStatusChanged,
        Self::ProjectCompleted,
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskDeleted,
        Self::TaskCompleted,
        Self::ActivityCreated,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownEventKind(s.to_string()))
    }
}

/// One configured webhook destination.
///
/// Owned by the external subscription registry; the dispatch core only
/// reads it and never mutates subscription state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    pub id: SubscriptionId,

    /// Human-readable subscription name.
    pub name: String,

    /// Destination URL for webhook delivery.
    pub url: String,

    /// HMAC signing secret. When absent, deliveries are unsigned.
    pub secret: Option<String>,

    /// Event kinds this subscription wants to receive.
    pub events: HashSet<EventKind>,

    /// Whether this subscription should receive webhooks at all.
    pub active: bool,
}

impl Subscription {
    /// Creates an active subscription with no secret and no events.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: SubscriptionId::new(),
            name: name.into(),
            url: url.into(),
            secret: None,
            events: HashSet::new(),
            active: true,
        }
    }

    /// Sets the signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Subscribes to the given event kinds.
    #[must_use]
    pub fn with_events(mut self, events: impl IntoIterator<Item = EventKind>) -> Self {
        self.events = events.into_iter().collect();
        self
    }

    /// Whether this subscription should receive the given event.
    ///
    /// A subscription is eligible iff it is active and the event is in its
    /// subscribed set.
    pub fn is_eligible(&self, event: EventKind) -> bool {
        self.active && self.events.contains(&event)
    }
}

/// Payload envelope transmitted to every matched subscription.
///
/// Built once per trigger call and shared across all matches: every
/// destination sees the same timestamp and the same data. Immutable once
/// constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// The domain event that occurred.
    pub event: EventKind,

    /// When the trigger fired (RFC 3339).
    pub timestamp: DateTime<Utc>,

    /// Event-specific data: entity snapshot(s), optional previous snapshot,
    /// optional computed changes.
    pub data: serde_json::Value,
}

impl Envelope {
    /// Creates an envelope for an event at the given instant.
    pub fn new(event: EventKind, timestamp: DateTime<Utc>, data: serde_json::Value) -> Self {
        Self { event, timestamp, data }
    }
}

/// Delivery outcome state.
///
/// `Pending` persists across retries and becomes terminal only on a 2xx
/// response (`Success`) or retry exhaustion (`Failed`). No transition back
/// to `Pending` once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Delivery attempts are still in progress.
    Pending,
    /// A 2xx response was received.
    Success,
    /// Retries were exhausted or delivery could not be attempted.
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome record for one subscription's delivery of one event.
///
/// Created at the start of a delivery, updated in place as retries
/// proceed, and immutable once a terminal status is reached. One record
/// per subscription per trigger call, regardless of how many HTTP attempts
/// were made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Unique identifier for this delivery.
    pub id: Uuid,

    /// Subscription this delivery targeted.
    pub subscription_id: SubscriptionId,

    /// Subscription name at delivery time.
    pub subscription_name: String,

    /// Destination URL.
    pub url: String,

    /// Event kind that was delivered.
    pub event: EventKind,

    /// The envelope that was transmitted.
    pub payload: serde_json::Value,

    /// Current delivery state.
    pub status: DeliveryStatus,

    /// Last observed HTTP status code, if any response was received.
    pub status_code: Option<u16>,

    /// Last observed response body (best-effort; may be a placeholder when
    /// the body could not be read).
    pub response_body: Option<String>,

    /// Last observed transport or signing error, if any.
    pub error_message: Option<String>,

    /// When this delivery started.
    pub timestamp: DateTime<Utc>,

    /// Number of retries actually performed (excludes the first attempt).
    pub retry_count: u32,

    /// Retry budget this delivery ran with.
    pub max_retries: u32,
}

impl DeliveryRecord {
    /// Creates a pending record for a subscription about to be delivered.
    pub fn pending(
        subscription: &Subscription,
        event: EventKind,
        payload: serde_json::Value,
        timestamp: DateTime<Utc>,
        max_retries: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription_id: subscription.id,
            subscription_name: subscription.name.clone(),
            url: subscription.url.clone(),
            event,
            payload,
            status: DeliveryStatus::Pending,
            status_code: None,
            response_body: None,
            error_message: None,
            timestamp,
            retry_count: 0,
            max_retries,
        }
    }

    /// Marks the record as terminally successful.
    pub fn mark_success(&mut self) {
        self.status = DeliveryStatus::Success;
    }

    /// Marks the record as terminally failed.
    pub fn mark_failed(&mut self) {
        self.status = DeliveryStatus::Failed;
    }

    /// Whether the record has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status != DeliveryStatus::Pending
    }
}
