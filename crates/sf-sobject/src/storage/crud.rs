//! Single-record writes.

use busbar_sf_client::{security::url as url_security, Connection, RequestOptions};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{require_id, require_record, to_remote, RecordId, RemoteFormatOptions, SObjectStorage};
use crate::error::{Error, ErrorKind, Result};

/// Response of a single-record create.
#[derive(Debug, Deserialize)]
struct SaveResult {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    errors: Vec<SaveError>,
}

#[derive(Debug, Deserialize)]
struct SaveError {
    #[serde(default, rename = "statusCode")]
    status_code: String,
    #[serde(default)]
    message: String,
}

impl SaveResult {
    fn into_record_id(self) -> Result<RecordId> {
        match self.id.filter(|id| !id.is_empty()) {
            Some(id) if self.success != Some(false) => Ok(RecordId { id }),
            _ => {
                let reasons: Vec<String> = self
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.status_code, e.message))
                    .collect();
                Err(Error::new(ErrorKind::UnexpectedResponse(format!(
                    "record was not created ({})",
                    reasons.join("; ")
                ))))
            }
        }
    }
}

impl<C: Connection> SObjectStorage<C> {
    /// Create a record and return its id.
    #[instrument(skip(self, entity))]
    pub async fn insert(&self, entity: &Value) -> Result<RecordId> {
        async {
            let map = self.property_map().await?;
            let object_name = self.object_name()?;
            let remote = to_remote(&map, entity, None, RemoteFormatOptions::default())?;

            let request = RequestOptions::post(self.data_path(&format!("sobjects/{object_name}")))
                .json_value(Value::Object(remote));
            let result: SaveResult = serde_json::from_value(self.connection.request(request).await?)?;
            result.into_record_id()
        }
        .await
        .map_err(|err| self.report("insert", entity, err))
    }

    /// Update the fields present on `entity`, which must carry an `id`.
    ///
    /// Sends nothing when no mapped field besides `id` is present.
    #[instrument(skip(self, entity))]
    pub async fn update(&self, entity: &Value) -> Result<RecordId> {
        async {
            let id = require_id(entity)?;
            let fields: Map<String, Value> = require_record(entity)?
                .iter()
                .filter(|(name, _)| name.as_str() != "id")
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            if fields.is_empty() {
                debug!(id = %id, "Nothing to update");
                return Ok(RecordId { id });
            }

            let map = self.property_map().await?;
            let remote = to_remote(&map, &Value::Object(fields), None, RemoteFormatOptions::default())?;
            if remote.is_empty() {
                debug!(id = %id, "No mapped fields to update");
                return Ok(RecordId { id });
            }

            let object_name = self.object_name()?;
            let request = RequestOptions::patch(self.record_path(&object_name, &id))
                .json_value(Value::Object(remote));
            self.connection.request(request).await?;
            Ok(RecordId { id })
        }
        .await
        .map_err(|err| self.report("update", entity, err))
    }

    /// Delete the record identified by `options.id`.
    #[instrument(skip(self, options))]
    pub async fn delete(&self, options: &Value) -> Result<RecordId> {
        async {
            let id = require_id(options)?;
            let object_name = self.object_name()?;
            self.connection
                .request(RequestOptions::delete(self.record_path(&object_name, &id)))
                .await?;
            Ok(RecordId { id })
        }
        .await
        .map_err(|err| self.report("delete", options, err))
    }

    fn record_path(&self, object_name: &str, id: &str) -> String {
        self.data_path(&format!(
            "sobjects/{object_name}/{}",
            url_security::encode_param(id)
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::ScriptedConnection;
    use crate::{ErrorKind, PropertyMap, RecordId, SObjectStorage};
    use busbar_sf_client::RequestMethod;
    use serde_json::{json, Value};

    fn pets(connection: ScriptedConnection) -> SObjectStorage<ScriptedConnection> {
        SObjectStorage::builder(connection)
            .object_name("Pet__c")
            .property_map(
                PropertyMap::new()
                    .with("id", "Id")
                    .with("name", "Name")
                    .with("ownerName", "Owner.Name"),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_posts_remote_fields() {
        let storage = pets(ScriptedConnection::new().respond(json!({
            "id": "a00xx0000001",
            "success": true,
            "errors": []
        })));

        let created = storage
            .insert(&json!({"name": "Rex", "ownerName": "Ada", "color": "brown"}))
            .await
            .unwrap();
        assert_eq!(created, RecordId::new("a00xx0000001"));

        let requests = storage.connection().requests();
        assert_eq!(requests[0].method, RequestMethod::Post);
        assert_eq!(requests[0].url, "/services/data/v62.0/sobjects/Pet__c");
        assert_eq!(requests[0].json, Some(json!({"Name": "Rex"})));
    }

    #[tokio::test]
    async fn test_insert_rejected_by_remote() {
        let storage = pets(ScriptedConnection::new().respond(json!({
            "success": false,
            "errors": [{"statusCode": "REQUIRED_FIELD_MISSING", "message": "Name"}]
        })));

        let err = storage.insert(&json!({"name": "Rex"})).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedResponse(_)));
        assert!(err.to_string().contains("REQUIRED_FIELD_MISSING"));
    }

    #[tokio::test]
    async fn test_insert_requires_an_entity() {
        let storage = pets(ScriptedConnection::new());
        let err = storage.insert(&Value::Null).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation(_)));
        assert!(storage.connection().requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_patches_without_id() {
        let storage = pets(ScriptedConnection::new().respond(Value::Null));

        let updated = storage
            .update(&json!({"id": "a00/1", "name": "Rexy"}))
            .await
            .unwrap();
        assert_eq!(updated, RecordId::new("a00/1"));

        let requests = storage.connection().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, RequestMethod::Patch);
        assert_eq!(requests[0].url, "/services/data/v62.0/sobjects/Pet__c/a00%2F1");
        assert_eq!(requests[0].json, Some(json!({"Name": "Rexy"})));
    }

    #[tokio::test]
    async fn test_update_with_only_id_sends_nothing() {
        let storage = pets(ScriptedConnection::new());

        let updated = storage.update(&json!({"id": "a00"})).await.unwrap();
        assert_eq!(updated, RecordId::new("a00"));

        let updated = storage
            .update(&json!({"id": "a00", "color": "brown"}))
            .await
            .unwrap();
        assert_eq!(updated, RecordId::new("a00"));

        assert!(storage.connection().requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_require_id() {
        let storage = pets(ScriptedConnection::new());

        for invalid in [json!({"name": "Rex"}), json!({"id": ""}), json!({"id": 7}), Value::Null] {
            let err = storage.update(&invalid).await.unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Validation(_)));
            let err = storage.delete(&invalid).await.unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Validation(_)));
        }
        assert!(storage.connection().requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sends_delete() {
        let storage = pets(ScriptedConnection::new().respond(Value::Null));

        let deleted = storage.delete(&json!({"id": "a00"})).await.unwrap();
        assert_eq!(deleted, RecordId::new("a00"));

        let requests = storage.connection().requests();
        assert_eq!(requests[0].method, RequestMethod::Delete);
        assert_eq!(requests[0].url, "/services/data/v62.0/sobjects/Pet__c/a00");
        assert_eq!(requests[0].json, None);
    }

    #[tokio::test]
    async fn test_remote_not_found_surfaces_status() {
        let storage = pets(ScriptedConnection::new().fail(busbar_sf_client::Error::new(
            busbar_sf_client::ErrorKind::SalesforceApi {
                status: 404,
                error_code: "NOT_FOUND".to_string(),
                message: "The requested resource does not exist".to_string(),
                fields: vec![],
            },
        )));

        let err = storage.delete(&json!({"id": "a00"})).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
