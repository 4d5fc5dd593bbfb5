//! Webhook dispatch engine with bounded retries and signed payloads.
//!
//! This crate implements the outbound half of the webhook system: when a
//! domain event occurs, the dispatcher resolves which subscriptions care,
//! builds one shared payload envelope, and delivers it to every matching
//! destination with HMAC signing, capped exponential backoff, and an
//! inspectable in-memory log of outcomes.
//!
//! # Architecture
//!
//! One `trigger` call fans out concurrently across matched subscriptions,
//! while each subscription's delivery stays strictly sequential:
//!
//! 1. **Resolve** - query the subscription registry for eligible matches
//! 2. **Envelope** - build one payload shared by every match
//! 3. **Deliver** - POST with signing, timeout, and retry-with-backoff
//! 4. **Record** - append the outcome to the bounded delivery log
//!
//! Delivery failures never propagate to the caller: the domain operation
//! that raised the event always completes, and the returned records carry
//! the per-subscription outcomes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hookwire_core::{EventKind, ScopeId, Subscription};
//! use hookwire_delivery::{DeliveryConfig, Dispatcher, InMemorySubscriptionStore};
//!
//! # async fn example() -> Result<(), hookwire_delivery::DeliveryError> {
//! let store = Arc::new(InMemorySubscriptionStore::new());
//! let scope = ScopeId::new();
//! store
//!     .insert(
//!         scope,
//!         Subscription::new("crm sync", "https://ok.example/hook")
//!             .with_events([EventKind::ClientCreated]),
//!     )
//!     .await;
//!
//! let dispatcher = Dispatcher::new(store, DeliveryConfig::default())?;
//! let records = dispatcher
//!     .client_created(scope, &serde_json::json!({ "name": "Acme" }))
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod retry;
pub mod sign;
pub mod store;
mod triggers;

// Re-export main public API
pub use client::{AttemptResponse, ClientConfig, DeliveryClient};
pub use dispatch::{DeliveryConfig, Dispatcher};
pub use error::{DeliveryError, Result};
pub use log::DeliveryLog;
pub use retry::RetryPolicy;
pub use store::{InMemorySubscriptionStore, SubscriptionStore};

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Default retry budget per delivery (excluding the initial attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default capacity of the in-memory delivery log.
pub const DELIVERY_LOG_CAPACITY: usize = 50;
