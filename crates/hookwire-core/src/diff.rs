//! Field-level change computation between entity snapshots.
//!
//! Used by `*.updated` and `*.status_changed` events to report which
//! fields changed and how.

use serde_json::{json, Map, Value};

/// Computes a change map between two entity snapshots.
///
/// Walks the keys of `current` and records `{"from": .., "to": ..}` for
/// every key that also exists on `previous` with a different value. Keys
/// that only exist on `current` are not reported, and keys removed
/// entirely (present on `previous`, absent from `current`) are ignored.
///
/// Non-object inputs produce an empty map.
pub fn changed_fields(previous: &Value, current: &Value) -> Map<String, Value> {
    let mut changes = Map::new();

    let (Some(previous), Some(current)) = (previous.as_object(), current.as_object()) else {
        return changes;
    };

    for (key, to) in current {
        if let Some(from) = previous.get(key) {
            if from != to {
                changes.insert(key.clone(), json!({ "from": from, "to": to }));
            }
        }
    }

    changes
}
