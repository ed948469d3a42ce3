//! Data model for friend lists and the API payloads they are built from.
//!
//! [`FriendRecord`] is the unit persisted in a snapshot. The remaining types
//! mirror the remote endpoints and are parsed at the network boundary so the
//! rest of the crate only sees explicit optional fields.

use serde::{Deserialize, Serialize};

/// Numeric account identifier used by the remote API.
pub type UserId = u64;

/// One friend, optionally enriched with display metadata.
///
/// The identifier is the identity key; the name fields are absent when
/// enrichment failed and no prior snapshot could fill them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRecord {
    /// Account identifier, unique within a snapshot.
    pub id: UserId,
    /// Canonical (login) name.
    #[serde(default)]
    pub name: Option<String>,
    /// Display name shown on the profile.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether the account carries a verified badge.
    #[serde(default)]
    pub has_verified_badge: Option<bool>,
}

impl FriendRecord {
    /// Create a record carrying only an identifier.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            display_name: None,
            has_verified_badge: None,
        }
    }

    /// Builder: set the canonical and display names.
    #[must_use]
    pub fn with_names(mut self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.display_name = Some(display_name.into());
        self
    }

    /// Whether the record has a non-empty canonical name.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Copy the display metadata from a detail payload.
    pub fn apply_detail(&mut self, detail: &UserDetail) {
        self.name.clone_from(&detail.name);
        self.display_name.clone_from(&detail.display_name);
        self.has_verified_badge = detail.has_verified_badge;
    }

    /// Copy the display metadata from another record.
    pub fn apply_record(&mut self, other: &FriendRecord) {
        self.name.clone_from(&other.name);
        self.display_name.clone_from(&other.display_name);
        self.has_verified_badge = other.has_verified_badge;
    }

    /// Name for human output, `Unknown` when absent.
    #[must_use]
    pub fn name_or_unknown(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unknown")
    }

    /// Display name for human output, `-` when absent.
    #[must_use]
    pub fn display_name_or_dash(&self) -> &str {
        self.display_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("-")
    }
}

/// Fraction of records lacking a canonical name; `0.0` for an empty list.
#[must_use]
pub fn nameless_fraction(records: &[FriendRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let nameless = records.iter().filter(|r| !r.has_name()).count();
    nameless as f64 / records.len() as f64
}

/// The account the session cookie belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// Account identifier.
    pub id: UserId,
    /// Canonical name, used as the per-account storage key.
    pub name: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One page of the friend-list endpoint.
///
/// Items have appeared under both `PageItems` and `data`, and the cursor
/// under both `NextCursor` and `nextPageCursor`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendsPage {
    #[serde(rename = "PageItems", default)]
    page_items: Option<Vec<FriendRecord>>,
    #[serde(default)]
    data: Option<Vec<FriendRecord>>,
    #[serde(rename = "NextCursor", alias = "nextPageCursor", default)]
    next_cursor: Option<String>,
}

impl FriendsPage {
    /// Split the page into its items and the cursor for the next page.
    ///
    /// An empty cursor string counts as the last page.
    #[must_use]
    pub fn into_parts(self) -> (Vec<FriendRecord>, Option<String>) {
        let items = match self.page_items {
            Some(items) if !items.is_empty() => items,
            _ => self.data.unwrap_or_default(),
        };
        let cursor = self.next_cursor.filter(|c| !c.is_empty());
        (items, cursor)
    }
}

/// Detail payload returned by the bulk user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    /// Account identifier.
    pub id: UserId,
    /// Canonical name.
    #[serde(default)]
    pub name: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Verified badge flag.
    #[serde(default)]
    pub has_verified_badge: Option<bool>,
}

/// Request body for the bulk user lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsRequest<'a> {
    /// Identifiers to resolve.
    pub user_ids: &'a [UserId],
    /// Whether banned accounts should be omitted.
    pub exclude_banned_users: bool,
}

/// Response body of the bulk user lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDetailsResponse {
    /// Records the service recognised.
    #[serde(default)]
    pub data: Vec<UserDetail>,
}
