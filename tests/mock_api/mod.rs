//! Mock friend-service helpers shared by the integration tests.
//!
//! Wraps a `wiremock::MockServer` with the three endpoints the tracker
//! talks to, plus config tuned for millisecond retry delays.

#![allow(dead_code)]

use friend_tracker::client::ApiClient;
use friend_tracker::config::{ApiConfig, Config, EnrichConfig, FetchConfig};
use friend_tracker::credential::Credential;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Identifier of the authenticated test account.
pub const ME: u64 = 9;

/// Config pointing at `server` with tiny delays.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        api: ApiConfig {
            users_base_url: server.uri(),
            friends_base_url: server.uri(),
            ..ApiConfig::default()
        },
        fetch: FetchConfig {
            rate_limit_delay_ms: 1,
            max_rate_limit_waits: 5,
            ..FetchConfig::default()
        },
        enrich: EnrichConfig {
            retry_base_delay_ms: 1,
            connection_error_delay_ms: 1,
            ..EnrichConfig::default()
        },
        ..Config::default()
    }
}

/// Client authenticated with a dummy cookie.
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&config_for(server).api, &credential()).unwrap()
}

/// Dummy session cookie.
pub fn credential() -> Credential {
    Credential::new("_|WARNING:-test-cookie").unwrap()
}

/// Friend-list page body with bare identifiers.
pub fn page(ids: &[u64], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "PageItems": items, "NextCursor": next })
}

/// Detail record as the bulk lookup returns it.
pub fn detail(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("user{id}"),
        "displayName": format!("User {id}"),
        "hasVerifiedBadge": false,
    })
}

/// Identity endpoint answering for [`ME`].
pub async fn mount_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/users/authenticated"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": ME, "name": "me", "displayName": "Me" })),
        )
        .mount(server)
        .await;
}

/// Single-page friend list for [`ME`].
pub async fn mount_friends(server: &MockServer, ids: &[u64]) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{ME}/friends/find")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(ids, None)))
        .mount(server)
        .await;
}

/// Bulk lookup that resolves every identifier in `ids`.
pub async fn mount_details(server: &MockServer, ids: &[u64]) {
    let data: Vec<Value> = ids.iter().copied().map(detail).collect();
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

/// Sizes of the `userIds` arrays of every bulk lookup the server saw.
pub async fn detail_batch_sizes(server: &MockServer) -> Vec<usize> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["userIds"].as_array().unwrap().len()
        })
        .collect()
}
