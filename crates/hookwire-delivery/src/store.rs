//! Read-only seam to the external subscription registry.
//!
//! The registry owns subscription CRUD; the dispatch core only asks one
//! question: which active subscriptions in a scope want this event. The
//! in-memory implementation backs embedded deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use hookwire_core::{error::RegistryError, EventKind, ScopeId, Subscription};

/// Query interface over the subscription registry.
///
/// Implementations return only eligible subscriptions: `active == true`
/// and the event present in the subscribed set. Lookup failures are
/// surfaced as `RegistryError`; the dispatcher fails open and treats them
/// as "no matches".
#[async_trait]
pub trait SubscriptionStore: Send + Sync + std::fmt::Debug {
    /// Returns the subscriptions in `scope` eligible for `event`.
    async fn find_subscriptions(
        &self,
        scope: ScopeId,
        event: EventKind,
    ) -> Result<Vec<Subscription>, RegistryError>;
}

/// Scope-keyed in-memory subscription registry.
///
/// Mirrors the external registry's writes via `insert`/`remove`; lookups
/// never fail.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<ScopeId, Vec<Subscription>>>,
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription under a scope.
    pub async fn insert(&self, scope: ScopeId, subscription: Subscription) {
        self.subscriptions.write().await.entry(scope).or_default().push(subscription);
    }

    /// Removes a subscription by ID. Returns whether anything was removed.
    pub async fn remove(
        &self,
        scope: ScopeId,
        id: hookwire_core::SubscriptionId,
    ) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let Some(entries) = subscriptions.get_mut(&scope) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|s| s.id != id);
        entries.len() != before
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_subscriptions(
        &self,
        scope: ScopeId,
        event: EventKind,
    ) -> Result<Vec<Subscription>, RegistryError> {
        let subscriptions = self.subscriptions.read().await;

        Ok(subscriptions
            .get(&scope)
            .map(|entries| {
                entries.iter().filter(|s| s.is_eligible(event)).cloned().collect()
            })
            .unwrap_or_default())
    }
}
