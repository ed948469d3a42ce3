//! One sequential tracking run.
//!
//! Authenticate, paginate the friend list, enrich it, diff it against the
//! stored snapshot and save it. Only authentication and pagination failures
//! end the run early; later stages degrade and report what they skipped.

use chrono::Local;
use tracing::{error, info, warn};

use crate::analysis::{AnalysisOutcome, ChangeAnalyzer};
use crate::client::ApiClient;
use crate::config::Config;
use crate::credential::Credential;
use crate::enrich::DetailEnricher;
use crate::error::{Result, TrackerError};
use crate::fetch::{FriendIdFetcher, Pagination};
use crate::model::{AuthenticatedUser, FriendRecord};
use crate::store::{SaveOutcome, SnapshotStore};

/// Everything a run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Account the cookie belongs to.
    pub user: AuthenticatedUser,
    /// Final enriched list, in page order.
    pub friends: Vec<FriendRecord>,
    /// Entries whose names came from the previous snapshot.
    pub recovered: usize,
    /// Detail batches that returned nothing.
    pub abandoned_batches: usize,
    /// Result of the change analysis.
    pub analysis: AnalysisOutcome,
    /// Lines appended to the activity log.
    pub logged_changes: usize,
    /// Result of the snapshot save.
    pub save: SaveOutcome,
}

/// Runs the retrieval and reconciliation pipeline.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: Config,
    store: SnapshotStore,
}

impl Tracker {
    /// Tracker storing snapshots in the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let store = SnapshotStore::new(config.data_dir()?, config.guard.save_max_nameless);
        Ok(Self { config, store })
    }

    /// Tracker using an explicit store.
    #[must_use]
    pub fn with_store(config: Config, store: SnapshotStore) -> Self {
        Self { config, store }
    }

    /// Execute one run with `credential`.
    pub async fn run(&self, credential: &Credential) -> Result<RunSummary> {
        let client = ApiClient::new(&self.config.api, credential)?;
        let user = client.authenticate().await?;
        let account = user.name.clone();

        let friends = match FriendIdFetcher::new(&client, &self.config.fetch).fetch(user.id).await {
            Pagination::Complete(friends) => friends,
            Pagination::Interrupted { partial, reason } => {
                error!(fetched = partial.len(), %reason, "API error. Halting");
                return Err(TrackerError::FriendListUnavailable {
                    fetched: partial.len(),
                    reason,
                });
            }
        };

        let previous = match self.store.load(&account) {
            Ok(previous) => previous,
            Err(e) => {
                warn!(error = %e, "Previous snapshot unreadable; treating as first run");
                None
            }
        };

        let enrichment = DetailEnricher::new(&client, &self.config.enrich)
            .enrich(friends, previous.as_deref().unwrap_or_default())
            .await;
        let abandoned_batches = enrichment.abandoned_batches();
        if abandoned_batches > 0 {
            warn!(abandoned_batches, "Some detail batches returned nothing");
        }

        let analysis = ChangeAnalyzer::new(self.config.guard.analysis_max_nameless)
            .analyze(&enrichment.friends, previous.as_deref());

        let logged_changes = match &analysis {
            AnalysisOutcome::SkippedCorrupt { nameless_fraction } => {
                warn!(nameless_fraction, "Too many missing names. Skipping analysis");
                0
            }
            AnalysisOutcome::FirstRun => {
                info!("No previous snapshot; nothing to compare");
                0
            }
            AnalysisOutcome::NoChanges => {
                info!("No changes detected");
                0
            }
            AnalysisOutcome::Changes(changes) => {
                info!(
                    removed = changes.removed.len(),
                    added = changes.added.len(),
                    "Changes detected"
                );
                match self.store.activity_log(&account).record(changes, Local::now()) {
                    Ok(lines) => lines,
                    Err(e) => {
                        error!(error = %e, "Log write failed");
                        0
                    }
                }
            }
        };

        let save = self.store.save(&account, &enrichment.friends);

        Ok(RunSummary {
            user,
            friends: enrichment.friends,
            recovered: enrichment.recovered,
            abandoned_batches,
            analysis,
            logged_changes,
            save,
        })
    }
}
