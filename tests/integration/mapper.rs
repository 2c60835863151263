use busbar_sf_mapper::sobject::{ErrorKind, RecordId};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, page, pets, sf_error, QUERY_PATH};

fn options(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_statements_for_mapped_pets() {
    let server = common::mock_org("token").await;
    let pets = pets(&server);

    assert_eq!(
        pets.build_query_statement(None).await.unwrap(),
        "SELECT Id, Name, Owner.Name FROM Pet__c  ORDER BY CreatedDate DESC"
    );
    assert_eq!(
        pets.build_query_statement(Some(&options(json!({"name": 1234}))))
            .await
            .unwrap(),
        "SELECT Id, Name, Owner.Name FROM Pet__c WHERE Name = 1234 ORDER BY CreatedDate DESC"
    );
    assert_eq!(
        pets.build_query_statement(Some(&options(json!({"streetAddress": "7601 Interactive Way"}))))
            .await
            .unwrap(),
        "SELECT Id, Name, Owner.Name FROM Pet__c WHERE Owner__c IN \
         (SELECT Person__c FROM Address__c WHERE StreetAddress__c = '7601 Interactive Way') \
         ORDER BY CreatedDate DESC"
    );
}

#[tokio::test]
async fn test_query_by_relationship() {
    let server = common::mock_org("token").await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer token"))
        .and(query_param(
            "q",
            "SELECT Id, Name, Owner.Name FROM Pet__c WHERE Owner__c IN \
             (SELECT Person__c FROM Address__c WHERE StreetAddress__c = '7601 Interactive Way') \
             ORDER BY CreatedDate DESC",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{
                "attributes": {"type": "Pet__c"},
                "Id": "a00",
                "Name": "Rex",
                "Owner": {"attributes": {"type": "Contact"}, "Name": "Ada"}
            }]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let records = pets(&server)
        .query(Some(&options(json!({"streetAddress": "7601 Interactive Way"}))))
        .await
        .unwrap();

    assert_eq!(records, vec![json!({"id": "a00", "name": "Rex", "ownerName": "Ada"})]);
}

#[tokio::test]
async fn test_query_concatenates_pages() {
    let server = common::mock_org("token").await;
    let cursor = "/services/data/v62.0/query/01gD0000002HU6KIAW-2000";

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"Id": "a01", "Name": "Rex"}, {"Id": "a02", "Name": "Fido"}]),
            Some(cursor),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(cursor))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{"Id": "a03", "Name": "Spot"}]),
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let records = pets(&server).query(None).await.unwrap();
    let names: Vec<&str> = records
        .iter()
        .filter_map(|record| record["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Rex", "Fido", "Spot"]);
}

#[tokio::test]
async fn test_get_not_found_names_the_object() {
    let server = common::mock_org("token").await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param(
            "q",
            "SELECT Id, Name, Owner.Name FROM Pet__c WHERE Id = 'a09' ORDER BY CreatedDate DESC",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), None)))
        .mount(&server)
        .await;

    let err = pets(&server)
        .get(&options(json!({"id": "a09"})))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    assert!(err.to_string().contains("Pet__c"));
}

#[tokio::test]
async fn test_record_lifecycle() {
    let server = common::mock_org("token").await;
    let record_path = "/services/data/v62.0/sobjects/Pet__c/a00xx0000001";

    Mock::given(method("POST"))
        .and(path("/services/data/v62.0/sobjects/Pet__c"))
        .and(body_json(json!({"Name": "Rex"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "a00xx0000001",
            "success": true,
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record_path))
        .and(body_json(json!({"Name": "Rexy"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(record_path))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let pets = pets(&server);
    let created = pets
        .insert(&json!({"name": "Rex", "streetAddress": "ignored on write"}))
        .await
        .unwrap();
    assert_eq!(created, RecordId::new("a00xx0000001"));

    let updated = pets
        .update(&json!({"id": created.id, "name": "Rexy"}))
        .await
        .unwrap();
    assert_eq!(updated, created);

    let deleted = pets.delete(&json!({"id": created.id})).await.unwrap();
    assert_eq!(deleted, created);
}

#[tokio::test]
async fn test_row_lock_is_retried() {
    let server = common::mock_org("token").await;
    let record_path = "/services/data/v62.0/sobjects/Pet__c/a00";

    Mock::given(method("PATCH"))
        .and(path(record_path))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(sf_error("UNABLE_TO_LOCK_ROW", "unable to obtain exclusive access")),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record_path))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let updated = pets(&server)
        .update(&json!({"id": "a00", "name": "Rex"}))
        .await
        .unwrap();
    assert_eq!(updated, RecordId::new("a00"));
}

#[tokio::test]
async fn test_missing_record_is_not_retried() {
    let server = common::mock_org("token").await;
    Mock::given(method("DELETE"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(sf_error("NOT_FOUND", "The requested resource does not exist")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = pets(&server).delete(&json!({"id": "a00"})).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_validation_happens_before_any_request() {
    let server = common::mock_org("token").await;
    let pets = pets(&server);

    let err = pets.update(&json!({"name": "Rex"})).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation(_)));
    let err = pets.get(&options(json!({"color": "brown"}))).await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation(_)));

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "{requests:?}");
}
