//! Core domain models and event types.
//!
//! Provides strongly-typed domain primitives for the outbound webhook
//! dispatch system: subscription records, event kinds, payload envelopes,
//! delivery records, and the clock abstraction used to make retry timing
//! testable. All other crates depend on these foundational types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
pub mod error;
pub mod models;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{
    DeliveryRecord, DeliveryStatus, Envelope, EventKind, ScopeId, Subscription, SubscriptionId,
};
pub use time::{Clock, RealClock, TestClock};
