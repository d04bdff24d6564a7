// libs/shared/database/src/memory.rs
//
// In-process document store implementing the same filter/update subset as
// the Data API. Each operation runs under one mutex acquisition, so
// `update_one` has the same single-document atomicity the production store
// guarantees, which lets engine tests exercise real CAS races.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::store::{DeleteOutcome, DocumentStore, UpdateOutcome};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot of a collection, for test assertions.
    pub fn dump(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.lock().unwrap();
        collections.get(collection).cloned().unwrap_or_default()
    }
}

fn matches(doc: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return false;
    };
    conditions
        .iter()
        .all(|(field, cond)| field_matches(doc.get(field), cond))
}

fn field_matches(field: Option<&Value>, cond: &Value) -> bool {
    if let Some(ops) = cond.as_object() {
        if ops.keys().any(|k| k.starts_with('$')) {
            return ops.iter().all(|(op, arg)| match op.as_str() {
                "$elemMatch" => field
                    .and_then(Value::as_array)
                    .is_some_and(|arr| arr.iter().any(|elem| matches(elem, arg))),
                "$eq" => field == Some(arg),
                "$ne" => field != Some(arg),
                "$exists" => arg.as_bool().is_some_and(|want| want == field.is_some()),
                _ => false,
            });
        }
    }
    field == Some(cond)
}

/// Index of the first array element selected by the filter's `$elemMatch`
/// on `array_field`, used to resolve the positional `$` operator.
fn elem_match_index(doc: &Value, filter: &Value, array_field: &str) -> Option<usize> {
    let cond = filter.get(array_field)?.get("$elemMatch")?;
    doc.get(array_field)?
        .as_array()?
        .iter()
        .position(|elem| matches(elem, cond))
}

fn apply_update(doc: &mut Value, filter: &Value, update: &Value) -> Result<()> {
    let Some(operators) = update.as_object() else {
        return Err(anyhow!("update must be an object of update operators"));
    };

    for (op, args) in operators {
        let args = args
            .as_object()
            .ok_or_else(|| anyhow!("{} takes an object argument", op))?;
        match op.as_str() {
            "$set" => apply_set(doc, filter, args)?,
            "$push" => apply_push(doc, args)?,
            "$pull" => apply_pull(doc, args)?,
            other => return Err(anyhow!("unsupported update operator: {}", other)),
        }
    }
    Ok(())
}

fn apply_set(doc: &mut Value, filter: &Value, fields: &Map<String, Value>) -> Result<()> {
    for (path, value) in fields {
        if let Some((array_field, sub_field)) = path.split_once(".$.") {
            let index = elem_match_index(doc, filter, array_field)
                .ok_or_else(|| anyhow!("positional operator without a matched element"))?;
            let elem = doc
                .get_mut(array_field)
                .and_then(|v| v.get_mut(index))
                .ok_or_else(|| anyhow!("positional target vanished"))?;
            elem.as_object_mut()
                .ok_or_else(|| anyhow!("array element is not an object"))?
                .insert(sub_field.to_string(), value.clone());
        } else {
            doc.as_object_mut()
                .ok_or_else(|| anyhow!("document is not an object"))?
                .insert(path.clone(), value.clone());
        }
    }
    Ok(())
}

fn apply_push(doc: &mut Value, fields: &Map<String, Value>) -> Result<()> {
    for (field, value) in fields {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("document is not an object"))?;
        let entry = obj.entry(field.clone()).or_insert_with(|| Value::Array(vec![]));
        entry
            .as_array_mut()
            .ok_or_else(|| anyhow!("$push target {} is not an array", field))?
            .push(value.clone());
    }
    Ok(())
}

fn apply_pull(doc: &mut Value, fields: &Map<String, Value>) -> Result<()> {
    for (field, cond) in fields {
        if let Some(arr) = doc.get_mut(field).and_then(Value::as_array_mut) {
            arr.retain(|elem| {
                if cond.is_object() {
                    !matches(elem, cond)
                } else {
                    elem != cond
                }
            });
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: &str, filter: Value) -> Result<Option<Value>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, &filter)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Value,
        projection: Option<Value>,
    ) -> Result<Vec<Value>> {
        let collections = self.collections.lock().unwrap();
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches(doc, &filter))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let Some(projection) = projection.as_ref().and_then(Value::as_object) else {
            return Ok(docs);
        };

        let projected = docs
            .into_iter()
            .map(|doc| {
                let fields: Map<String, Value> = projection
                    .iter()
                    .filter(|(_, keep)| keep.as_i64() == Some(1))
                    .filter_map(|(field, _)| {
                        doc.get(field).map(|v| (field.clone(), v.clone()))
                    })
                    .collect();
                Value::Object(fields)
            })
            .collect();
        Ok(projected)
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        document
            .as_object_mut()
            .ok_or_else(|| anyhow!("document is not an object"))?
            .entry("_id".to_string())
            .or_insert_with(|| Value::String(id.clone()));

        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> Result<UpdateOutcome> {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        let Some(doc) = docs.iter_mut().find(|doc| matches(doc, &filter)) else {
            return Ok(UpdateOutcome { matched: 0, modified: 0 });
        };

        let before = doc.clone();
        apply_update(doc, &filter, &update)?;
        let modified = u64::from(*doc != before);
        Ok(UpdateOutcome { matched: 1, modified })
    }

    async fn delete_one(&self, collection: &str, filter: Value) -> Result<DeleteOutcome> {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        match docs.iter().position(|doc| matches(doc, &filter)) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteOutcome { deleted: 1 })
            }
            None => Ok(DeleteOutcome { deleted: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn equality_and_elem_match_filters() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "users",
                json!({
                    "email": "doc@clinic.test",
                    "role": "doctor",
                    "schedule": [
                        {"id": "s1", "booked": false},
                        {"id": "s2", "booked": true},
                    ]
                }),
            )
            .await
            .unwrap();

        let found = store
            .find_one("users", json!({"email": "doc@clinic.test", "role": "doctor"}))
            .await
            .unwrap();
        assert!(found.is_some());

        let found = store
            .find_one("users", json!({"email": "doc@clinic.test", "role": "patient"}))
            .await
            .unwrap();
        assert!(found.is_none());

        let found = store
            .find_one(
                "users",
                json!({"schedule": {"$elemMatch": {"id": "s1", "booked": false}}}),
            )
            .await
            .unwrap();
        assert!(found.is_some());

        let found = store
            .find_one(
                "users",
                json!({"schedule": {"$elemMatch": {"id": "s2", "booked": false}}}),
            )
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn positional_set_targets_the_matched_element() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "users",
                json!({
                    "email": "doc@clinic.test",
                    "schedule": [
                        {"id": "s1", "booked": false},
                        {"id": "s2", "booked": false},
                    ]
                }),
            )
            .await
            .unwrap();

        let outcome = store
            .update_one(
                "users",
                json!({"schedule": {"$elemMatch": {"id": "s2", "booked": false}}}),
                json!({"$set": {"schedule.$.booked": true}}),
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.modified, 1);

        let doc = store.dump("users").remove(0);
        assert_eq!(doc["schedule"][0]["booked"], json!(false));
        assert_eq!(doc["schedule"][1]["booked"], json!(true));
    }

    #[tokio::test]
    async fn cas_update_reports_zero_modified_once_state_changed() {
        let store = MemoryStore::new();
        store
            .insert_one(
                "users",
                json!({"email": "d", "schedule": [{"id": "s1", "booked": false}]}),
            )
            .await
            .unwrap();

        let filter = json!({"schedule": {"$elemMatch": {"id": "s1", "booked": false}}});
        let update = json!({"$set": {"schedule.$.booked": true}});

        let first = store
            .update_one("users", filter.clone(), update.clone())
            .await
            .unwrap();
        assert!(first.modified_any());

        let second = store.update_one("users", filter, update).await.unwrap();
        assert_eq!(second.matched, 0);
        assert!(!second.modified_any());
    }

    #[tokio::test]
    async fn push_and_pull_round_trip() {
        let store = MemoryStore::new();
        store
            .insert_one("users", json!({"email": "p", "appointments": []}))
            .await
            .unwrap();

        store
            .update_one(
                "users",
                json!({"email": "p"}),
                json!({"$push": {"appointments": {"slot_id": "s1", "doctor_email": "d"}}}),
            )
            .await
            .unwrap();
        assert_eq!(store.dump("users")[0]["appointments"].as_array().unwrap().len(), 1);

        let outcome = store
            .update_one(
                "users",
                json!({"email": "p"}),
                json!({"$pull": {"appointments": {"slot_id": "s1"}}}),
            )
            .await
            .unwrap();
        assert!(outcome.modified_any());
        assert!(store.dump("users")[0]["appointments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn projection_keeps_only_requested_fields() {
        let store = MemoryStore::new();
        store
            .insert_one("users", json!({"email": "a", "role": "doctor", "password_hash": "x"}))
            .await
            .unwrap();

        let docs = store
            .find_many("users", json!({"role": "doctor"}), Some(json!({"email": 1})))
            .await
            .unwrap();
        assert_eq!(docs, vec![json!({"email": "a"})]);
    }

    #[tokio::test]
    async fn delete_one_removes_a_single_match() {
        let store = MemoryStore::new();
        store.insert_one("ledger", json!({"slot_id": "s1"})).await.unwrap();
        store.insert_one("ledger", json!({"slot_id": "s2"})).await.unwrap();

        let outcome = store
            .delete_one("ledger", json!({"slot_id": "s1"}))
            .await
            .unwrap();
        assert_eq!(outcome.deleted, 1);

        let outcome = store
            .delete_one("ledger", json!({"slot_id": "s1"}))
            .await
            .unwrap();
        assert_eq!(outcome.deleted, 0);
        assert_eq!(store.dump("ledger").len(), 1);
    }
}
