//! Batched detail lookup with local-history fallback.
//!
//! Identifiers are resolved in fixed-size batches. A batch that keeps
//! failing is abandoned rather than failing the run; its members then take
//! their names from the previous snapshot when it has them.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{ApiClient, Outcome};
use crate::config::EnrichConfig;
use crate::model::{FriendRecord, UserDetail, UserId};
use crate::retry::RetryPolicy;

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Zero-based batch number.
    pub index: usize,
    /// Identifiers in the batch.
    pub size: usize,
    /// Requests issued for the batch.
    pub attempts: u32,
    /// Pauses taken before each retry, in order.
    pub waits: Vec<Duration>,
    /// Whether the batch ended with a successful response.
    pub fetched: bool,
}

/// Output of an enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Input entries in their original order, with names filled where possible.
    pub friends: Vec<FriendRecord>,
    /// Entries whose names came from the previous snapshot.
    pub recovered: usize,
    /// Per-batch outcomes, in request order.
    pub batches: Vec<BatchReport>,
}

impl Enrichment {
    /// Number of batches that produced no fresh details.
    #[must_use]
    pub fn abandoned_batches(&self) -> usize {
        self.batches.iter().filter(|b| !b.fetched).count()
    }
}

/// Resolves friend identifiers to names via the bulk lookup endpoint.
#[derive(Debug, Clone)]
pub struct DetailEnricher<'a> {
    client: &'a ApiClient,
    batch_size: usize,
    exclude_banned_users: bool,
    policy: RetryPolicy,
}

impl<'a> DetailEnricher<'a> {
    /// Create an enricher from the batching settings.
    #[must_use]
    pub fn new(client: &'a ApiClient, config: &EnrichConfig) -> Self {
        Self {
            client,
            batch_size: config.batch_size.max(1),
            exclude_banned_users: config.exclude_banned_users,
            policy: RetryPolicy::from_config(config),
        }
    }

    /// Fill in names for `friends`, falling back to `previous` for entries
    /// the service did not return.
    pub async fn enrich(&self, friends: Vec<FriendRecord>, previous: &[FriendRecord]) -> Enrichment {
        if friends.is_empty() {
            return Enrichment {
                friends,
                recovered: 0,
                batches: Vec::new(),
            };
        }

        info!(count = friends.len(), "Fetching user details");

        let ids: Vec<UserId> = friends.iter().map(|f| f.id).collect();
        let mut fetched: HashMap<UserId, UserDetail> = HashMap::with_capacity(ids.len());
        let mut batches = Vec::new();

        for (index, batch) in ids.chunks(self.batch_size).enumerate() {
            let (report, details) = self.fetch_batch(index, batch).await;
            for detail in details {
                fetched.insert(detail.id, detail);
            }
            batches.push(report);
        }

        let (friends, recovered) = merge(friends, &fetched, previous);
        if recovered > 0 {
            warn!(recovered, "Recovered names from local history");
        }

        Enrichment {
            friends,
            recovered,
            batches,
        }
    }

    async fn fetch_batch(&self, index: usize, ids: &[UserId]) -> (BatchReport, Vec<UserDetail>) {
        let mut report = BatchReport {
            index,
            size: ids.len(),
            attempts: 0,
            waits: Vec::new(),
            fetched: false,
        };

        loop {
            report.attempts += 1;
            let outcome = self.client.user_details(ids, self.exclude_banned_users).await;

            let wait = match outcome {
                Outcome::Success(details) => {
                    debug!(batch = index, returned = details.len(), "Batch resolved");
                    report.fetched = true;
                    return (report, details);
                }
                Outcome::RateLimited => self.policy.rate_limit_delay(report.attempts),
                Outcome::Connection(ref e) => {
                    warn!(batch = index, error = %e, "Connection error on batch");
                    self.policy.connection_delay
                }
                Outcome::Failed(_) | Outcome::Malformed(_) => {
                    warn!(batch = index, reason = %outcome.describe(), "Abandoning batch");
                    return (report, Vec::new());
                }
            };

            if !self.policy.can_retry(report.attempts) {
                warn!(batch = index, attempts = report.attempts, "Retries exhausted; abandoning batch");
                return (report, Vec::new());
            }

            warn!(
                batch = index,
                attempt = report.attempts,
                wait_ms = wait.as_millis() as u64,
                "Retrying batch"
            );
            report.waits.push(wait);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Combine fresh details and the previous snapshot into the final list.
///
/// Fresh details always win. A previous record is used only when it has a
/// non-empty name; otherwise the entry is left as fetched. Returns the list
/// and how many entries were recovered from `previous`.
#[must_use]
pub fn merge(
    friends: Vec<FriendRecord>,
    fetched: &HashMap<UserId, UserDetail>,
    previous: &[FriendRecord],
) -> (Vec<FriendRecord>, usize) {
    let history: HashMap<UserId, &FriendRecord> = previous.iter().map(|r| (r.id, r)).collect();
    let mut recovered = 0;

    let merged = friends
        .into_iter()
        .map(|mut friend| {
            if let Some(detail) = fetched.get(&friend.id) {
                friend.apply_detail(detail);
            } else if let Some(old) = history.get(&friend.id).filter(|old| old.has_name()) {
                friend.apply_record(old);
                recovered += 1;
            }
            friend
        })
        .collect();

    (merged, recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detail(id: UserId, name: &str) -> UserDetail {
        UserDetail {
            id,
            name: Some(name.to_string()),
            display_name: Some(name.to_uppercase()),
            has_verified_badge: Some(false),
        }
    }

    #[test]
    fn test_fresh_detail_beats_history() {
        let fetched = HashMap::from([(1, detail(1, "fresh"))]);
        let previous = vec![FriendRecord::new(1).with_names("stale", "STALE")];

        let (merged, recovered) = merge(vec![FriendRecord::new(1)], &fetched, &previous);

        assert_eq!(merged[0].name.as_deref(), Some("fresh"));
        assert_eq!(recovered, 0);
    }

    #[test]
    fn test_history_fills_missing_detail() {
        let previous = vec![FriendRecord::new(2).with_names("old", "Old")];

        let (merged, recovered) = merge(vec![FriendRecord::new(2)], &HashMap::new(), &previous);

        assert_eq!(merged[0], FriendRecord::new(2).with_names("old", "Old"));
        assert_eq!(recovered, 1);
    }

    #[test]
    fn test_nameless_history_is_not_recovered() {
        let mut old = FriendRecord::new(3);
        old.display_name = Some("ghost".into());
        let previous = vec![old];

        let (merged, recovered) = merge(vec![FriendRecord::new(3)], &HashMap::new(), &previous);

        assert_eq!(merged[0], FriendRecord::new(3));
        assert_eq!(recovered, 0);
    }

    #[test]
    fn test_merge_preserves_order() {
        let fetched = HashMap::from([(3, detail(3, "c")), (1, detail(1, "a"))]);
        let friends = vec![FriendRecord::new(3), FriendRecord::new(2), FriendRecord::new(1)];

        let (merged, _) = merge(friends, &fetched, &[]);

        let ids: Vec<_> = merged.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(!merged[1].has_name());
    }
}
