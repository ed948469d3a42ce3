//! Authenticated HTTP client for the users and friends services.
//!
//! Every request carries the session cookie through default headers built
//! once at construction. Calls used inside retry loops return an [`Outcome`]
//! instead of an error so callers decide per status what to do.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::config::ApiConfig;
use crate::credential::Credential;
use crate::error::{Result, TrackerError};
use crate::model::{
    AuthenticatedUser, FriendsPage, UserDetail, UserDetailsRequest, UserDetailsResponse, UserId,
};

/// Name of the session cookie the API expects.
pub const SESSION_COOKIE_NAME: &str = ".ROBLOSECURITY";

/// Result of a single request, tagged by how the caller should react.
#[derive(Debug)]
pub enum Outcome<T> {
    /// 2xx with a body that parsed.
    Success(T),
    /// HTTP 429.
    RateLimited,
    /// Any other non-2xx status.
    Failed(StatusCode),
    /// 2xx whose body did not match the expected shape.
    Malformed(reqwest::Error),
    /// The request never produced a response.
    Connection(reqwest::Error),
}

impl<T> Outcome<T> {
    /// Short label for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Success(_) => "success".to_string(),
            Self::RateLimited => "rate limited (HTTP 429)".to_string(),
            Self::Failed(status) => format!("HTTP {}", status.as_u16()),
            Self::Malformed(e) => format!("malformed response: {e}"),
            Self::Connection(e) => format!("connection error: {e}"),
        }
    }
}

/// HTTP client bound to one session credential.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    users_base: Url,
    friends_base: Url,
}

impl ApiClient {
    /// Build a client whose every request carries `credential`.
    pub fn new(config: &ApiConfig, credential: &Credential) -> Result<Self> {
        let client = ReqwestClient::builder()
            .default_headers(session_headers(credential, &config.user_agent)?)
            .timeout(config.timeout())
            .build()
            .map_err(|e| TrackerError::connection("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            users_base: parse_base(&config.users_base_url, "api.users_base_url")?,
            friends_base: parse_base(&config.friends_base_url, "api.friends_base_url")?,
        })
    }

    /// Validate the credential and return the account it belongs to.
    pub async fn authenticate(&self) -> Result<AuthenticatedUser> {
        let url = join(&self.users_base, "/v1/users/authenticated")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TrackerError::connection("Identity check failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::AuthenticationFailed {
                status: status.as_u16(),
            });
        }

        let user: AuthenticatedUser = response
            .json()
            .await
            .map_err(|e| TrackerError::connection("Identity response was not understood", e))?;
        info!(user = %user.name, id = user.id, "Authenticated");
        Ok(user)
    }

    /// Request one page of `user_id`'s friend list.
    pub async fn friends_page(
        &self,
        user_id: UserId,
        limit: usize,
        cursor: Option<&str>,
    ) -> Outcome<FriendsPage> {
        let url = match join(&self.friends_base, &format!("/v1/users/{user_id}/friends/find")) {
            Ok(url) => url,
            Err(_) => return Outcome::Failed(StatusCode::BAD_REQUEST),
        };

        let mut request = self.client.get(url).query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        debug!(user_id, cursor = cursor.unwrap_or(""), "Requesting friends page");

        classify(request.send().await).await
    }

    /// Resolve a batch of identifiers to display metadata.
    pub async fn user_details(
        &self,
        ids: &[UserId],
        exclude_banned_users: bool,
    ) -> Outcome<Vec<UserDetail>> {
        let url = match join(&self.users_base, "/v1/users") {
            Ok(url) => url,
            Err(_) => return Outcome::Failed(StatusCode::BAD_REQUEST),
        };
        let body = UserDetailsRequest {
            user_ids: ids,
            exclude_banned_users,
        };

        match classify::<UserDetailsResponse>(self.client.post(url).json(&body).send().await).await
        {
            Outcome::Success(response) => Outcome::Success(response.data),
            Outcome::RateLimited => Outcome::RateLimited,
            Outcome::Failed(status) => Outcome::Failed(status),
            Outcome::Malformed(e) => Outcome::Malformed(e),
            Outcome::Connection(e) => Outcome::Connection(e),
        }
    }
}

/// Headers binding the session to every request.
fn session_headers(credential: &Credential, user_agent: &str) -> Result<HeaderMap> {
    let mut cookie = HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={}",
        credential.expose()
    ))
    .map_err(|_| TrackerError::InvalidArgument {
        name: "cookie".to_string(),
        reason: "contains characters not allowed in an HTTP header".to_string(),
    })?;
    cookie.set_sensitive(true);

    let user_agent = HeaderValue::from_str(user_agent).map_err(|_| TrackerError::InvalidConfig {
        message: "api.user_agent contains characters not allowed in an HTTP header".to_string(),
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, cookie);
    headers.insert(USER_AGENT, user_agent);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn parse_base(raw: &str, key: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| TrackerError::InvalidConfig {
        message: format!("{key} is not a valid URL: {e}"),
    })
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| TrackerError::InvalidConfig {
        message: format!("Cannot build URL from {base} and {path}: {e}"),
    })
}

async fn classify<T: DeserializeOwned>(result: reqwest::Result<Response>) -> Outcome<T> {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Outcome::Connection(e),
    };

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Outcome::RateLimited;
    }
    if !status.is_success() {
        return Outcome::Failed(status);
    }

    match response.json::<T>().await {
        Ok(body) => Outcome::Success(body),
        Err(e) if e.is_decode() => Outcome::Malformed(e),
        Err(e) => Outcome::Connection(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiConfig {
            users_base_url: server.uri(),
            friends_base_url: server.uri(),
            ..ApiConfig::default()
        };
        ApiClient::new(&config, &Credential::new("secret").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_sends_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/authenticated"))
            .and(header("cookie", ".ROBLOSECURITY=secret"))
            .and(header("user-agent", "Roblox/WinInet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "name": "builder",
                "displayName": "Builder"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server).authenticate().await.unwrap();

        assert_eq!(user.id, 12);
        assert_eq!(user.name, "builder");
        server.verify().await;
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/authenticated"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, TrackerError::AuthenticationFailed { status: 401 }));
    }

    #[tokio::test]
    async fn test_friends_page_passes_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/5/friends/find"))
            .and(query_param("limit", "50"))
            .and(query_param("cursor", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PageItems": [{"id": 1}],
                "NextCursor": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).friends_page(5, 50, Some("next")).await;

        match outcome {
            Outcome::Success(page) => {
                let (items, cursor) = page.into_parts();
                assert_eq!(items.len(), 1);
                assert!(cursor.is_none());
            }
            other => panic!("unexpected outcome: {}", other.describe()),
        }
    }

    #[tokio::test]
    async fn test_user_details_classifies_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .and(body_json(json!({"userIds": [1], "excludeBannedUsers": false})))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.user_details(&[1], false).await,
            Outcome::RateLimited
        ));
        assert!(matches!(
            client.user_details(&[1], false).await,
            Outcome::Failed(StatusCode::INTERNAL_SERVER_ERROR)
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let outcome = client_for(&server).user_details(&[1], false).await;
        assert!(matches!(outcome, Outcome::Malformed(_)));
    }

    #[test]
    fn test_header_rejects_control_characters() {
        let credential = Credential::new("bad\nvalue").unwrap();
        let err = ApiClient::new(&ApiConfig::default(), &credential).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidArgument { .. }));
    }
}
