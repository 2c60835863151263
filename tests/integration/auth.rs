use busbar_sf_mapper::client::ErrorKind as ClientErrorKind;
use busbar_sf_mapper::sobject::ErrorKind;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, page, pets, sf_error, QUERY_PATH};

#[tokio::test]
async fn test_expired_session_is_renewed_once() {
    common::init_tracing();
    let server = MockServer::start().await;
    common::mount_token(&server, "stale", Some(1)).await;
    common::mount_token(&server, "fresh", None).await;

    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(sf_error("INVALID_SESSION_ID", "Session expired or invalid")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"Id": "a00", "Name": "Rex"}]), None)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let pets = pets(&server);
    let first = pets.query(None).await.unwrap();
    assert_eq!(first, vec![json!({"id": "a00", "name": "Rex"})]);

    // The renewed credential is cached for later operations.
    pets.query(None).await.unwrap();
    assert_eq!(
        pets.connection().credentials().await.unwrap().access_token(),
        "fresh"
    );
}

#[tokio::test]
async fn test_rejected_credential_exhausts_renewals() {
    let server = common::mock_org("never-valid").await;
    Mock::given(method("DELETE"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(sf_error("INVALID_SESSION_ID", "Session expired or invalid")),
        )
        .mount(&server)
        .await;

    let err = pets(&server).delete(&json!({"id": "a00"})).await.unwrap_err();
    let remote = err.remote().expect("failure should come from the connection");
    assert!(matches!(
        remote.kind,
        ClientErrorKind::AuthenticationRetriesExhausted { attempts: 3 }
    ));
}

#[tokio::test]
async fn test_login_failure_surfaces_as_authentication_error() {
    common::init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .mount(&server)
        .await;

    let err = pets(&server).query(None).await.unwrap_err();
    match &err.kind {
        ErrorKind::Remote(remote) => {
            assert!(matches!(remote.kind, ClientErrorKind::Authentication(_)));
            assert!(remote.to_string().contains("invalid_grant"), "{remote}");
        }
        other => panic!("expected a remote failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_operations_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "shared", "instance_url": server.uri()}))
                .set_delay(std::time::Duration::from_millis(20)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(header("Authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), None)))
        .expect(4)
        .mount(&server)
        .await;

    let pets = std::sync::Arc::new(pets(&server));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pets = std::sync::Arc::clone(&pets);
            tokio::spawn(async move { pets.query(None).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_empty());
    }
}
