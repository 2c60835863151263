use busbar_sf_mapper::sobject::{ErrorKind, RecordId};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, pets};

const BULK_PATH: &str = "/services/apexrest/bulk/Pet__c";

#[tokio::test]
async fn test_insert_many() {
    let server = common::mock_org("token").await;
    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .and(body_json(json!({"entities": [{"Name": "Rex"}, {"Name": "Fido"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [{"Id": "a01", "Name": "Rex"}, {"Id": "a02", "Name": "Fido"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = pets(&server)
        .insert_many(&[json!({"name": "Rex"}), json!({"name": "Fido"})])
        .await
        .unwrap();
    assert_eq!(ids, vec![RecordId::new("a01"), RecordId::new("a02")]);
}

#[tokio::test]
async fn test_update_many() {
    let server = common::mock_org("token").await;
    Mock::given(method("PATCH"))
        .and(path(BULK_PATH))
        .and(body_json(json!({"entities": [{"Name": "Rexy", "Id": "a01"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entities": [{"Id": "a01"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let ids = pets(&server)
        .update_many(&[json!({"id": "a01", "name": "Rexy"})])
        .await
        .unwrap();
    assert_eq!(ids, vec![RecordId::new("a01")]);
}

#[tokio::test]
async fn test_delete_many() {
    let server = common::mock_org("token").await;
    Mock::given(method("DELETE"))
        .and(path(BULK_PATH))
        .and(query_param("ids", "a01,a02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": ["a01", "a02"]})))
        .expect(1)
        .mount(&server)
        .await;

    let ids = pets(&server)
        .delete_many(&[json!({"id": "a01"}), json!({"id": "a02"})])
        .await
        .unwrap();
    assert_eq!(ids, vec![RecordId::new("a01"), RecordId::new("a02")]);
}

#[tokio::test]
async fn test_delete_many_rejects_entries_without_id() {
    let server = common::mock_org("token").await;
    let err = pets(&server)
        .delete_many(&[json!({"id": "a01"}), json!({"name": "Rex"})])
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Validation(_)));
    assert!(err.to_string().contains("positions 1"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
