//! Typed trigger helpers, one per domain event.
//!
//! These shape the envelope `data` consistently before handing off to
//! [`Dispatcher::trigger`]: create/delete/complete events carry the entity
//! snapshot; update and status-change events additionally carry the
//! previous snapshot and the computed field changes. No I/O happens here.

use serde_json::{json, Value};

use hookwire_core::{diff::changed_fields, DeliveryRecord, EventKind, ScopeId};

use crate::dispatch::Dispatcher;

fn entity_data(key: &str, entity: &Value) -> Value {
    json!({ key: entity })
}

fn update_data(key: &str, previous: &Value, current: &Value) -> Value {
    json!({
        key: current,
        "previous": previous,
        "changes": Value::Object(changed_fields(previous, current)),
    })
}

impl Dispatcher {
    /// Notifies subscribers that a client was created.
    pub async fn client_created(&self, scope: ScopeId, client: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ClientCreated, entity_data("client", client)).await
    }

    /// Notifies subscribers that a client was updated.
    pub async fn client_updated(
        &self,
        scope: ScopeId,
        previous: &Value,
        current: &Value,
    ) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ClientUpdated, update_data("client", previous, current))
            .await
    }

    /// Notifies subscribers that a client was deleted.
    pub async fn client_deleted(&self, scope: ScopeId, client: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ClientDeleted, entity_data("client", client)).await
    }

    /// Notifies subscribers that a client changed status.
    pub async fn client_status_changed(
        &self,
        scope: ScopeId,
        previous: &Value,
        current: &Value,
    ) -> Vec<DeliveryRecord> {
        self.trigger(
            scope,
            EventKind::ClientStatusChanged,
            update_data("client", previous, current),
        )
        .await
    }

    /// Notifies subscribers that a project was created.
    pub async fn project_created(&self, scope: ScopeId, project: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ProjectCreated, entity_data("project", project)).await
    }

    /// Notifies subscribers that a project was updated.
    pub async fn project_updated(
        &self,
        scope: ScopeId,
        previous: &Value,
        current: &Value,
    ) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ProjectUpdated, update_data("project", previous, current))
            .await
    }

    /// Notifies subscribers that a project was deleted.
    pub async fn project_deleted(&self, scope: ScopeId, project: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ProjectDeleted, entity_data("project", project)).await
    }

    /// Notifies subscribers that a project changed status.
    pub async fn project_status_changed(
        &self,
        scope: ScopeId,
        previous: &Value,
        current: &Value,
    ) -> Vec<DeliveryRecord> {
        self.trigger(
            scope,
            EventKind::ProjectStatusChanged,
            update_data("project", previous, current),
        )
        .await
    }

    /// Notifies subscribers that a project was completed.
    pub async fn project_completed(&self, scope: ScopeId, project: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ProjectCompleted, entity_data("project", project)).await
    }

    /// Notifies subscribers that a task was created.
    pub async fn task_created(&self, scope: ScopeId, task: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::TaskCreated, entity_data("task", task)).await
    }

    /// Notifies subscribers that a task was updated.
    pub async fn task_updated(
        &self,
        scope: ScopeId,
        previous: &Value,
        current: &Value,
    ) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::TaskUpdated, update_data("task", previous, current)).await
    }

    /// Notifies subscribers that a task was deleted.
    pub async fn task_deleted(&self, scope: ScopeId, task: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::TaskDeleted, entity_data("task", task)).await
    }

    /// Notifies subscribers that a task was completed.
    pub async fn task_completed(&self, scope: ScopeId, task: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::TaskCompleted, entity_data("task", task)).await
    }

    /// Notifies subscribers that an activity entry was recorded.
    pub async fn activity_created(&self, scope: ScopeId, activity: &Value) -> Vec<DeliveryRecord> {
        self.trigger(scope, EventKind::ActivityCreated, entity_data("activity", activity)).await
    }
}
