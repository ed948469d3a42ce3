//! Cursor-based friend-list pagination.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::client::{ApiClient, Outcome};
use crate::config::FetchConfig;
use crate::model::{FriendRecord, UserId};

/// How pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Every page was read; the list may legitimately be empty.
    Complete(Vec<FriendRecord>),
    /// A page failed. `partial` holds what was read before it.
    Interrupted {
        /// Entries accumulated before the failure, in page order.
        partial: Vec<FriendRecord>,
        /// Why pagination stopped.
        reason: String,
    },
}

/// Walks the friend-list endpoint page by page.
#[derive(Debug, Clone)]
pub struct FriendIdFetcher<'a> {
    client: &'a ApiClient,
    page_size: usize,
    rate_limit_delay: Duration,
    max_rate_limit_waits: u32,
}

impl<'a> FriendIdFetcher<'a> {
    /// Create a fetcher using `client` and the pagination settings.
    #[must_use]
    pub fn new(client: &'a ApiClient, config: &FetchConfig) -> Self {
        Self {
            client,
            page_size: config.page_size,
            rate_limit_delay: config.rate_limit_delay(),
            max_rate_limit_waits: config.max_rate_limit_waits,
        }
    }

    /// Collect every friend of `user_id`.
    ///
    /// A 429 pauses and reissues the same request without advancing the
    /// cursor. Any other failure stops pagination and reports what was
    /// gathered so far as [`Pagination::Interrupted`].
    pub async fn fetch(&self, user_id: UserId) -> Pagination {
        info!(user_id, "Fetching friend list");

        let mut friends: Vec<FriendRecord> = Vec::new();
        let mut seen: HashSet<UserId> = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut waits = 0u32;
        let mut pages = 0usize;

        loop {
            match self
                .client
                .friends_page(user_id, self.page_size, cursor.as_deref())
                .await
            {
                Outcome::Success(page) => {
                    waits = 0;
                    pages += 1;
                    let (items, next) = page.into_parts();
                    debug!(page = pages, items = items.len(), "Received friends page");
                    for item in items {
                        if seen.insert(item.id) {
                            friends.push(item);
                        } else {
                            debug!(id = item.id, "Dropping duplicate friend entry");
                        }
                    }
                    match next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                Outcome::RateLimited => {
                    waits += 1;
                    if waits > self.max_rate_limit_waits {
                        error!(waits, "Still rate limited; giving up on friend list");
                        return interrupted(friends, "rate limited too many times");
                    }
                    warn!(
                        wait_ms = self.rate_limit_delay.as_millis() as u64,
                        "Rate limit (429) while fetching friends; retrying"
                    );
                    tokio::time::sleep(self.rate_limit_delay).await;
                }
                other => {
                    let reason = other.describe();
                    error!(%reason, "Error fetching friend list");
                    return interrupted(friends, reason);
                }
            }
        }

        info!(count = friends.len(), pages, "Found connections");
        Pagination::Complete(friends)
    }
}

fn interrupted(partial: Vec<FriendRecord>, reason: impl Into<String>) -> Pagination {
    Pagination::Interrupted {
        partial,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::credential::Credential;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> FetchConfig {
        FetchConfig {
            page_size: 50,
            rate_limit_delay_ms: 1,
            max_rate_limit_waits: 3,
        }
    }

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiConfig {
            users_base_url: server.uri(),
            friends_base_url: server.uri(),
            ..ApiConfig::default()
        };
        ApiClient::new(&config, &Credential::new("token").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_list_is_complete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"PageItems": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = FriendIdFetcher::new(&client, &fast_config()).fetch(1).await;

        assert_eq!(result, Pagination::Complete(vec![]));
    }

    #[tokio::test]
    async fn test_error_on_first_page_is_interrupted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = FriendIdFetcher::new(&client, &fast_config()).fetch(1).await;

        match result {
            Pagination::Interrupted { partial, reason } => {
                assert!(partial.is_empty());
                assert!(reason.contains("500"));
            }
            other => panic!("expected interruption, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_reissues_same_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .and(query_param_is_missing("cursor"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"PageItems": [{"id": 10}], "NextCursor": "B"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .and(query_param("cursor", "B"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .and(query_param("cursor", "B"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"PageItems": [{"id": 11}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = FriendIdFetcher::new(&client, &fast_config()).fetch(1).await;

        let ids: Vec<_> = match result {
            Pagination::Complete(items) => items.into_iter().map(|f| f.id).collect(),
            other => panic!("expected completion, got {other:?}"),
        };
        assert_eq!(ids, vec![10, 11]);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_endless_rate_limit_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = FriendIdFetcher::new(&client, &fast_config()).fetch(1).await;

        assert!(matches!(result, Pagination::Interrupted { .. }));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_duplicate_ids_across_pages_are_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .and(query_param_is_missing("cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"PageItems": [{"id": 1}, {"id": 2}], "NextCursor": "B"}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/users/1/friends/find"))
            .and(query_param("cursor", "B"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"PageItems": [{"id": 2}, {"id": 3}]})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = FriendIdFetcher::new(&client, &fast_config()).fetch(1).await;
        let result = match result {
            Pagination::Complete(items) => items,
            other => panic!("expected completion, got {other:?}"),
        };

        assert_eq!(result.len(), 3);
    }
}
