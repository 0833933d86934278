//! Annotation reconciliation.
//!
//! Turns the stored entries of one annotation set and the set a caller
//! wants into the create/update/delete writes that move the former to the
//! latter. Entries whose key survives keep their id.

use std::collections::HashMap;

use crate::models::annotation::{Annotation, AnnotationOp, KeyValue};

/// Computes the writes that make `current` equal to `desired`.
///
/// Runs in O(current + desired). When `desired` repeats a key the last
/// occurrence wins. Unchanged entries produce no write at all.
pub fn reconcile(current: &[Annotation], desired: &[KeyValue]) -> Vec<AnnotationOp> {
    let mut existing: HashMap<&str, &Annotation> = current
        .iter()
        .map(|entry| (entry.key.as_str(), entry))
        .collect();

    let last_index: HashMap<&str, usize> = desired
        .iter()
        .enumerate()
        .map(|(index, pair)| (pair.key.as_str(), index))
        .collect();

    let mut ops = Vec::new();

    for (index, pair) in desired.iter().enumerate() {
        if last_index.get(pair.key.as_str()) != Some(&index) {
            continue;
        }

        match existing.remove(pair.key.as_str()) {
            Some(entry) if entry.value == pair.value => {}
            Some(entry) => ops.push(AnnotationOp::Update {
                id: entry.id,
                key: pair.key.clone(),
                value: pair.value.clone(),
            }),
            None => ops.push(AnnotationOp::Create {
                key: pair.key.clone(),
                value: pair.value.clone(),
            }),
        }
    }

    // Whatever is left was not asked for again. Iterate `current` rather
    // than the map so deletes come out in a stable order.
    ops.extend(
        current
            .iter()
            .filter(|entry| existing.contains_key(entry.key.as_str()))
            .map(|entry| AnnotationOp::Delete {
                id: entry.id,
                key: entry.key.clone(),
            }),
    );

    ops
}

/// Writes for a brand new owner: every desired pair becomes a create.
pub fn reconcile_new(desired: &[KeyValue]) -> Vec<AnnotationOp> {
    reconcile(&[], desired)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn entry(key: &str, value: &str) -> Annotation {
        let now = Utc::now();
        let actor = Uuid::nil();
        Annotation {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            key: key.into(),
            value: value.into(),
            created_at: now,
            modified_at: now,
            creator_id: actor,
            last_modifier_id: actor,
        }
    }

    fn kv(key: &str, value: &str) -> KeyValue {
        KeyValue::new(key, value)
    }

    /// Applies `ops` to `current` the way a store would, returning
    /// `(id, key, value)` triples sorted by key.
    fn apply(current: &[Annotation], ops: &[AnnotationOp]) -> Vec<(Uuid, String, String)> {
        let mut state: HashMap<String, (Uuid, String)> = current
            .iter()
            .map(|e| (e.key.clone(), (e.id, e.value.clone())))
            .collect();
        for op in ops {
            match op {
                AnnotationOp::Create { key, value } => {
                    assert!(!state.contains_key(key), "create of existing key {key}");
                    state.insert(key.clone(), (Uuid::new_v4(), value.clone()));
                }
                AnnotationOp::Update { id, key, value } => {
                    let slot = state.get_mut(key).expect("update of missing key");
                    assert_eq!(slot.0, *id);
                    slot.1 = value.clone();
                }
                AnnotationOp::Delete { id, key } => {
                    let removed = state.remove(key).expect("delete of missing key");
                    assert_eq!(removed.0, *id);
                }
            }
        }
        let mut out: Vec<_> = state.into_iter().map(|(k, (id, v))| (id, k, v)).collect();
        out.sort_by(|a, b| a.1.cmp(&b.1));
        out
    }

    #[test]
    fn empty_current_creates_everything() {
        let ops = reconcile_new(&[kv("a", "1"), kv("b", "2")]);
        assert_eq!(
            ops,
            vec![
                AnnotationOp::Create {
                    key: "a".into(),
                    value: "1".into()
                },
                AnnotationOp::Create {
                    key: "b".into(),
                    value: "2".into()
                },
            ]
        );
    }

    #[test]
    fn empty_desired_deletes_everything() {
        let current = vec![entry("a", "1"), entry("b", "2")];
        let ops = reconcile(&current, &[]);
        assert_eq!(
            ops,
            vec![
                AnnotationOp::Delete {
                    id: current[0].id,
                    key: "a".into()
                },
                AnnotationOp::Delete {
                    id: current[1].id,
                    key: "b".into()
                },
            ]
        );
    }

    #[test]
    fn lifecycle_keeps_identity_of_surviving_key() {
        let current = vec![entry("a", "1"), entry("b", "2")];
        let desired = vec![kv("a", "1"), kv("c", "3")];

        let ops = reconcile(&current, &desired);
        assert_eq!(ops.len(), 2);
        assert!(ops.contains(&AnnotationOp::Create {
            key: "c".into(),
            value: "3".into()
        }));
        assert!(ops.contains(&AnnotationOp::Delete {
            id: current[1].id,
            key: "b".into()
        }));

        let result = apply(&current, &ops);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, current[0].id);
        assert_eq!((result[0].1.as_str(), result[0].2.as_str()), ("a", "1"));
        assert_eq!((result[1].1.as_str(), result[1].2.as_str()), ("c", "3"));
    }

    #[test]
    fn changed_value_is_an_identity_preserving_update() {
        let current = vec![entry("color", "red")];
        let ops = reconcile(&current, &[kv("color", "blue")]);
        assert_eq!(
            ops,
            vec![AnnotationOp::Update {
                id: current[0].id,
                key: "color".into(),
                value: "blue".into()
            }]
        );
    }

    #[test]
    fn reconciling_a_set_with_itself_is_a_no_op() {
        let current = vec![entry("a", "1"), entry("b", "2"), entry("c", "")];
        let desired: Vec<KeyValue> = current.iter().map(|e| kv(&e.key, &e.value)).collect();
        assert!(reconcile(&current, &desired).is_empty());
    }

    #[test]
    fn duplicate_desired_keys_last_one_wins() {
        let current = vec![entry("a", "1")];
        let ops = reconcile(&current, &[kv("a", "2"), kv("b", "x"), kv("a", "3")]);

        let result = apply(&current, &ops);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, current[0].id);
        assert_eq!(result[0].2, "3");
        assert_eq!(result[1].2, "x");
    }

    #[test]
    fn mixed_changes_converge_to_desired() {
        let current = vec![
            entry("keep", "same"),
            entry("change", "old"),
            entry("drop", "gone"),
        ];
        let desired = vec![kv("change", "new"), kv("add", "fresh"), kv("keep", "same")];

        let ops = reconcile(&current, &desired);
        assert_eq!(ops.len(), 3);

        let result = apply(&current, &ops);
        let pairs: Vec<(&str, &str)> = result
            .iter()
            .map(|(_, k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("add", "fresh"), ("change", "new"), ("keep", "same")]
        );
        assert_eq!(result[1].0, current[1].id);
        assert_eq!(result[2].0, current[0].id);
    }
}
