use std::time::Duration;

use busbar_sf_mapper::auth::{ConnectionConfig, OAuthConfig};
use busbar_sf_mapper::{AuthenticatedConnection, PasswordFlow, PropertyMap, SObjectStorage};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type Pets = SObjectStorage<AuthenticatedConnection<PasswordFlow>>;

pub const QUERY_PATH: &str = "/services/data/v62.0/query";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mock org whose token endpoint issues `access_token` for its own URI.
pub async fn mock_org(access_token: &str) -> MockServer {
    init_tracing();
    let server = MockServer::start().await;
    mount_token(&server, access_token, None).await;
    server
}

/// Answer the next `times` token requests (or all of them) with `access_token`.
pub async fn mount_token(server: &MockServer, access_token: &str, times: Option<u64>) {
    let mock = Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "instance_url": server.uri(),
            "token_type": "Bearer",
            "issued_at": "1700000000000"
        })));
    match times {
        Some(times) => mock.up_to_n_times(times).mount(server).await,
        None => mock.mount(server).await,
    }
}

pub fn connection(server: &MockServer) -> AuthenticatedConnection<PasswordFlow> {
    let flow = PasswordFlow::new(
        OAuthConfig::new("consumer-key").with_secret("consumer-secret"),
        "integration@example.com",
        "password",
    )
    .with_login_url(server.uri());

    AuthenticatedConnection::new(flow)
        .expect("HTTP client should build")
        .with_config(ConnectionConfig::default().with_backoff_factor(Duration::from_millis(1)))
}

pub fn pet_map() -> PropertyMap {
    serde_json::from_value(json!({
        "id": "Id",
        "name": "Name",
        "ownerName": "Owner.Name",
        "streetAddress": {
            "localProperty": "Owner__c",
            "relatedObject": {
                "name": "Address__c",
                "comparisonProperty": "Person__c",
                "queryValueProperty": "StreetAddress__c"
            }
        }
    }))
    .expect("property map should deserialize")
}

pub fn pets(server: &MockServer) -> Pets {
    SObjectStorage::builder(connection(server))
        .object_name("Pet__c")
        .property_map(pet_map())
        .build()
        .expect("storage should build")
}

/// Query response page; a `next` cursor marks it as not done.
pub fn page(records: Value, next: Option<&str>) -> Value {
    let size = records.as_array().map_or(0, Vec::len);
    match next {
        Some(next) => json!({
            "totalSize": size,
            "done": false,
            "nextRecordsUrl": next,
            "records": records
        }),
        None => json!({"totalSize": size, "done": true, "records": records}),
    }
}

pub fn sf_error(code: &str, message: &str) -> Value {
    json!([{ "errorCode": code, "message": message }])
}
