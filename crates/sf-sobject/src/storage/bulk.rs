//! Batch writes through the bulk endpoint.
//!
//! The endpoint accepts `{"entities": [...]}` for POST and PATCH and an
//! `ids` query parameter for DELETE.

use busbar_sf_client::{Connection, RequestOptions};
use serde_json::{json, Map, Value};
use tracing::instrument;

use super::{record_id, require_id, to_remote, RecordId, RemoteFormatOptions, SObjectStorage};
use crate::error::{Error, ErrorKind, Result};

impl<C: Connection> SObjectStorage<C> {
    /// Create several records in one request.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub async fn insert_many(&self, entities: &[Value]) -> Result<Vec<RecordId>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        async {
            let map = self.property_map().await?;
            let object_name = self.object_name()?;
            let remote = entities
                .iter()
                .map(|entity| {
                    to_remote(&map, entity, None, RemoteFormatOptions::default()).map(Value::Object)
                })
                .collect::<Result<Vec<_>>>()?;

            let request = RequestOptions::post(self.bulk_endpoint(&object_name))
                .json_value(json!({ "entities": remote }));
            entity_ids(self.connection.request(request).await?)
        }
        .await
        .map_err(|err| self.report("insert_many", &entities, err))
    }

    /// Update several records in one request. Every entity must carry an `id`.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub async fn update_many(&self, entities: &[Value]) -> Result<Vec<RecordId>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        async {
            let ids = require_ids(entities)?;
            let map = self.property_map().await?;
            let object_name = self.object_name()?;
            let id_field = map
                .basic_names()
                .get("id")
                .cloned()
                .unwrap_or_else(|| "Id".to_string());

            let remote = entities
                .iter()
                .zip(ids)
                .map(|(entity, id)| -> Result<Value> {
                    let fields: Map<String, Value> = entity
                        .as_object()
                        .into_iter()
                        .flatten()
                        .filter(|(name, _)| name.as_str() != "id")
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect();
                    let mut record = to_remote(
                        &map,
                        &Value::Object(fields),
                        None,
                        RemoteFormatOptions::default(),
                    )?;
                    record.insert(id_field.clone(), Value::String(id));
                    Ok(Value::Object(record))
                })
                .collect::<Result<Vec<_>>>()?;

            let request = RequestOptions::patch(self.bulk_endpoint(&object_name))
                .json_value(json!({ "entities": remote }));
            entity_ids(self.connection.request(request).await?)
        }
        .await
        .map_err(|err| self.report("update_many", &entities, err))
    }

    /// Delete several records in one request. Every entry must carry an `id`.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub async fn delete_many(&self, entities: &[Value]) -> Result<Vec<RecordId>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        async {
            let ids = require_ids(entities)?;
            let object_name = self.object_name()?;

            let request =
                RequestOptions::delete(self.bulk_endpoint(&object_name)).query("ids", ids.join(","));
            let response = self.connection.request(request).await?;

            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| unexpected("bulk delete response has no results"))?;
            results
                .iter()
                .map(|result| match result {
                    Value::String(id) if !id.is_empty() => Ok(RecordId { id: id.clone() }),
                    other => record_id(other)
                        .map(|id| RecordId { id })
                        .ok_or_else(|| unexpected("bulk delete result has no id")),
                })
                .collect::<Result<Vec<_>>>()
        }
        .await
        .map_err(|err| self.report("delete_many", &entities, err))
    }
}

/// Ids of every entity, or a validation error naming the positions without one.
fn require_ids(entities: &[Value]) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(entities.len());
    let mut missing = Vec::new();

    for (position, entity) in entities.iter().enumerate() {
        match require_id(entity) {
            Ok(id) => ids.push(id),
            Err(_) => missing.push(position.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "id is required for entities at positions {}",
            missing.join(", ")
        )));
    }
    Ok(ids)
}

fn entity_ids(response: Value) -> Result<Vec<RecordId>> {
    response
        .get("entities")
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected("bulk response has no entities"))?
        .iter()
        .map(|entity| {
            record_id(entity)
                .map(|id| RecordId { id })
                .ok_or_else(|| unexpected("bulk response entity has no id"))
        })
        .collect()
}

fn unexpected(message: &str) -> Error {
    Error::new(ErrorKind::UnexpectedResponse(message.to_string()))
}
