use crate::domain::{CachedEvent, Delta, EventId, collapse_duplicates};
use std::collections::{HashMap, HashSet};

/// Apply a server delta to a cached snapshot.
///
/// Deletions go first. Updates then merge onto the event with the same id or
/// are appended. An id listed as both deleted and updated stays deleted.
pub fn apply_delta(events: Vec<CachedEvent>, delta: Delta) -> Vec<CachedEvent> {
    let deleted: HashSet<EventId> = delta.deleted.into_iter().collect();

    let mut merged: Vec<CachedEvent> = collapse_duplicates(events)
        .into_iter()
        .filter(|e| !deleted.contains(&e.event_id))
        .collect();

    let mut position: HashMap<EventId, usize> = merged
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.event_id.clone(), idx))
        .collect();

    for incoming in delta.updated {
        if deleted.contains(&incoming.event_id) {
            continue;
        }

        match position.get(&incoming.event_id) {
            Some(&idx) => merged[idx].merge_from(incoming),
            None => {
                position.insert(incoming.event_id.clone(), merged.len());
                merged.push(incoming);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CacheVersion;
    use serde_json::json;

    fn event(value: serde_json::Value) -> CachedEvent {
        serde_json::from_value(value).unwrap()
    }

    fn ids(events: &[CachedEvent]) -> Vec<EventId> {
        events.iter().map(|e| e.event_id.clone()).collect()
    }

    #[test]
    fn test_empty_delta_leaves_snapshot_unchanged() {
        let snapshot = vec![
            event(json!({"id": 1, "cacheVersion": 2, "title": "A", "room": "B12"})),
            event(json!({"id": 2, "cacheVersion": 1})),
        ];

        let merged = apply_delta(snapshot.clone(), Delta::default());

        assert_eq!(merged, snapshot);
    }

    #[test]
    fn test_deletions_remove_events() {
        let snapshot = vec![CachedEvent::new("a"), CachedEvent::new("b"), CachedEvent::new("c")];
        let delta = Delta {
            updated: vec![],
            deleted: vec![EventId::from("b"), EventId::from("missing")],
        };

        assert_eq!(
            ids(&apply_delta(snapshot, delta)),
            vec![EventId::from("a"), EventId::from("c")]
        );
    }

    #[test]
    fn test_updates_merge_or_append() {
        let snapshot = vec![event(json!({"id": 1, "title": "A", "desc": "x", "cacheVersion": 1}))];
        let delta = Delta {
            updated: vec![
                event(json!({"id": 1, "title": "B", "cacheVersion": 2})),
                event(json!({"id": 2, "title": "New", "cacheVersion": 1})),
            ],
            deleted: vec![],
        };

        let merged = apply_delta(snapshot, delta);

        assert_eq!(merged.len(), 2);
        assert_eq!(
            serde_json::to_value(&merged[0]).unwrap(),
            json!({"eventId": 1, "cacheVersion": 2, "title": "B", "desc": "x"})
        );
        assert_eq!(merged[1].title(), Some("New"));
    }

    #[test]
    fn test_deletion_wins_over_update_in_same_delta() {
        let snapshot = vec![CachedEvent::new("a"), CachedEvent::new("b")];
        let delta = Delta {
            updated: vec![
                CachedEvent::new("a").with_title("renamed"),
                CachedEvent::new("z").with_title("brand new"),
            ],
            deleted: vec![EventId::from("a"), EventId::from("z")],
        };

        assert_eq!(ids(&apply_delta(snapshot, delta)), vec![EventId::from("b")]);
    }

    #[test]
    fn test_ids_stay_unique_after_repeated_updates() {
        let snapshot = vec![CachedEvent::new(1).with_version(1)];
        let delta = Delta {
            updated: vec![
                CachedEvent::new(2).with_version(1),
                CachedEvent::new(2).with_title("second copy"),
                CachedEvent::new(1).with_version(3),
            ],
            deleted: vec![],
        };

        let merged = apply_delta(snapshot, delta);

        let unique: HashSet<EventId> = merged.iter().map(|e| e.event_id.clone()).collect();
        assert_eq!(unique.len(), merged.len());
        assert_eq!(merged[0].cache_version, Some(CacheVersion::from(3)));
        assert_eq!(merged[1].cache_version, Some(CacheVersion::from(1)));
        assert_eq!(merged[1].title(), Some("second copy"));
    }

    #[test]
    fn test_explicit_null_in_update_clears_field() {
        let snapshot = vec![event(json!({"id": 1, "description": "x", "room": "A", "cacheVersion": 1}))];
        let delta = Delta {
            updated: vec![event(json!({"id": 1, "description": null, "room": null}))],
            deleted: vec![],
        };

        let merged = apply_delta(snapshot, delta);

        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!([{"eventId": 1, "cacheVersion": 1, "description": null, "room": null}])
        );
    }

    #[test]
    fn test_non_string_display_fields_merge_verbatim() {
        let snapshot = vec![event(json!({"id": 1, "start": "2024-05-01T09:00:00Z", "end": 1714554000000_i64}))];
        let delta = Delta {
            updated: vec![event(json!({"id": 1, "start": 1714550400000_i64}))],
            deleted: vec![],
        };

        let merged = apply_delta(snapshot, delta);

        assert_eq!(merged[0].start, Some(json!(1714550400000_i64)));
        assert_eq!(merged[0].end, Some(json!(1714554000000_i64)));
    }

    #[test]
    fn test_ids_match_across_integer_and_string_forms() {
        let snapshot = vec![
            event(json!({"id": 5, "title": "integer id"})),
            event(json!({"id": "6", "title": "string id"})),
            event(json!({"id": 7})),
        ];
        let delta = Delta {
            updated: vec![event(json!({"id": 6, "title": "renamed"}))],
            deleted: vec![EventId::from("5"), EventId::from(7)],
        };

        let merged = apply_delta(snapshot, delta);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title(), Some("renamed"));
        // The cached form of the id is kept
        assert_eq!(
            serde_json::to_value(&merged[0].event_id).unwrap(),
            json!("6")
        );
    }
}
