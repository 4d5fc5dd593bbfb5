//! Event dispatch: subscription resolution, fan-out, and retried delivery.
//!
//! `Dispatcher::trigger` is the single entry point the domain layer calls
//! when a mutation completes. Matched subscriptions are delivered to
//! concurrently; retries within one subscription stay strictly sequential
//! with backoff between attempts.

use std::sync::Arc;

use bytes::Bytes;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use hookwire_core::{
    Clock, DeliveryRecord, Envelope, EventKind, RealClock, ScopeId, Subscription,
};

use crate::{
    client::{ClientConfig, DeliveryClient, DeliveryRequest},
    error::{DeliveryError, Result},
    log::DeliveryLog,
    retry::RetryPolicy,
    sign,
    store::SubscriptionStore,
};

/// Configuration for a dispatcher instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// HTTP client settings.
    pub client: ClientConfig,

    /// Retry policy applied to every delivery.
    pub retry: RetryPolicy,

    /// Capacity of the delivery log.
    pub log_capacity: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            retry: RetryPolicy::default(),
            log_capacity: crate::DELIVERY_LOG_CAPACITY,
        }
    }
}

/// Webhook dispatcher for one embedding application.
///
/// Owns the HTTP client, retry policy, and delivery log; reads
/// subscriptions through the injected [`SubscriptionStore`]. All state is
/// scoped to the instance, so separate tenants or tests can run isolated
/// dispatchers side by side.
#[derive(Debug)]
pub struct Dispatcher {
    store: Arc<dyn SubscriptionStore>,
    client: DeliveryClient,
    log: Arc<DeliveryLog>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    cancellation: CancellationToken,
}

impl Dispatcher {
    /// Creates a dispatcher with the system clock.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be
    /// initialized.
    pub fn new(store: Arc<dyn SubscriptionStore>, config: DeliveryConfig) -> Result<Self> {
        Self::with_clock(store, config, Arc::new(RealClock::new()))
    }

    /// Creates a dispatcher with an injected clock.
    ///
    /// Tests use this with a virtual clock so backoff delays resolve
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Configuration` if the HTTP client cannot be
    /// initialized.
    pub fn with_clock(
        store: Arc<dyn SubscriptionStore>,
        config: DeliveryConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = DeliveryClient::new(config.client)?;
        let log = Arc::new(DeliveryLog::with_capacity(config.log_capacity));

        Ok(Self {
            store,
            client,
            log,
            retry: config.retry,
            clock,
            cancellation: CancellationToken::new(),
        })
    }

    /// Dispatches an event to every eligible subscription in the scope.
    ///
    /// Resolves matches through the registry, builds one shared envelope,
    /// and delivers concurrently. Returns one record per matched
    /// subscription; an event nobody subscribes to returns an empty list
    /// without building a payload. Individual delivery failures are
    /// captured in the records and never propagate to the caller.
    pub async fn trigger(
        &self,
        scope: ScopeId,
        event: EventKind,
        data: Value,
    ) -> Vec<DeliveryRecord> {
        let subscriptions = match self.store.find_subscriptions(scope, event).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                // Fail open: a registry outage must not break the domain
                // operation that raised the event.
                warn!(%scope, %event, error = %e, "registry lookup failed, skipping dispatch");
                return Vec::new();
            },
        };

        if subscriptions.is_empty() {
            debug!(%scope, %event, "no matching subscriptions");
            return Vec::new();
        }

        let envelope = Envelope::new(event, self.clock.now_utc(), data);

        // Serialize once; every subscription and every retry transmits
        // these exact bytes so signatures always match the body.
        let body = match serde_json::to_vec(&envelope) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!(%event, error = %e, "failed to serialize payload envelope");
                return Vec::new();
            },
        };
        let payload = serde_json::to_value(&envelope).unwrap_or(Value::Null);
        let timestamp = envelope.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);

        info!(
            %scope,
            %event,
            subscription_count = subscriptions.len(),
            "dispatching webhook event"
        );

        let deliveries = subscriptions
            .iter()
            .map(|subscription| self.deliver(subscription, event, &body, &payload, &timestamp));

        futures::future::join_all(deliveries).await
    }

    /// Delivers one envelope to one subscription, retrying with backoff.
    ///
    /// Produces exactly one terminal record, appended to the delivery log
    /// on completion. Never panics and never returns an error: all failure
    /// modes end up inside the record.
    async fn deliver(
        &self,
        subscription: &Subscription,
        event: EventKind,
        body: &Bytes,
        payload: &Value,
        timestamp: &str,
    ) -> DeliveryRecord {
        let span = info_span!(
            "webhook_delivery",
            subscription_id = %subscription.id,
            url = %subscription.url,
            event = %event,
        );

        async move {
            let mut record = DeliveryRecord::pending(
                subscription,
                event,
                payload.clone(),
                self.clock.now_utc(),
                self.retry.max_retries,
            );

            let signature = match &subscription.secret {
                Some(secret) => match sign::sign(body, secret) {
                    Ok(signature) => Some(signature),
                    Err(e) => {
                        // One subscription's bad key must not block the
                        // others; record and move on.
                        warn!(error = %e, "payload signing failed");
                        record.error_message = Some(e.to_string());
                        record.mark_failed();
                        self.log.record(record.clone()).await;
                        return record;
                    },
                },
                None => None,
            };

            let request = DeliveryRequest {
                url: subscription.url.clone(),
                event,
                timestamp: timestamp.to_string(),
                signature,
                body: body.clone(),
            };

            for attempt in 0..=self.retry.max_retries {
                record.retry_count = attempt;

                let outcome = tokio::select! {
                    result = self.client.attempt(&request, attempt) => result,
                    () = self.cancellation.cancelled() => Err(DeliveryError::Cancelled),
                };

                match outcome {
                    Ok(response) => {
                        record.status_code = Some(response.status_code);
                        record.response_body = Some(response.body);

                        if response.is_success {
                            record.error_message = None;
                            record.mark_success();
                            info!(
                                status = response.status_code,
                                retry_count = attempt,
                                "webhook delivered"
                            );
                            break;
                        }

                        record.error_message =
                            Some(DeliveryError::http_status(response.status_code).to_string());
                        warn!(status = response.status_code, attempt, "webhook attempt rejected");
                    },
                    Err(DeliveryError::Cancelled) => {
                        record.error_message = Some(DeliveryError::Cancelled.to_string());
                        warn!(attempt, "delivery cancelled");
                        break;
                    },
                    Err(e) => {
                        record.error_message = Some(e.to_string());
                        warn!(error = %e, attempt, "webhook attempt failed");
                    },
                }

                if attempt < self.retry.max_retries {
                    let delay = self.retry.delay_for(attempt);
                    debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");

                    tokio::select! {
                        () = self.clock.sleep(delay) => {},
                        () = self.cancellation.cancelled() => {
                            record.error_message =
                                Some(DeliveryError::Cancelled.to_string());
                            warn!("delivery cancelled during backoff");
                            break;
                        },
                    }
                }
            }

            if !record.is_terminal() {
                record.mark_failed();
                error!(
                    retry_count = record.retry_count,
                    status = record.status_code,
                    error = record.error_message.as_deref().unwrap_or("none"),
                    "webhook delivery permanently failed"
                );
            }

            self.log.record(record.clone()).await;
            record
        }
        .instrument(span)
        .await
    }

    /// Recorded delivery outcomes, most recent first.
    pub async fn recent_deliveries(&self) -> Vec<DeliveryRecord> {
        self.log.recent().await
    }

    /// Clears the delivery history.
    pub async fn clear_recent_deliveries(&self) {
        self.log.clear().await;
    }

    /// The delivery log backing this dispatcher.
    pub fn log(&self) -> Arc<DeliveryLog> {
        self.log.clone()
    }

    /// Token observed by in-flight deliveries; cancel it to interrupt
    /// pending backoffs during shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Interrupts all in-flight deliveries.
    ///
    /// Deliveries waiting in a backoff or on an HTTP response complete
    /// immediately with a failed record.
    pub fn shutdown(&self) {
        self.cancellation.cancel();
    }
}
