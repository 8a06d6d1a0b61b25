//! Resolving the working user profile from an explicit id or an account id.

use adflux_types::AdfluxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user profile visible to the authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Profile id.
    pub profile_id: String,
    /// Login name of the profile owner.
    #[serde(default)]
    pub user_name: String,
    /// Account the profile belongs to.
    pub account_id: String,
    /// Account display name.
    #[serde(default)]
    pub account_name: String,
}

/// Lists the caller's user profiles.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Fetch every user profile of the authenticated caller.
    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, AdfluxError>;
}

/// How to find the working profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSelector {
    /// The profile id is known.
    Profile(String),
    /// Look up the unique profile of this account.
    Account(String),
}

impl ProfileSelector {
    /// Choose a selector from optional ids; an explicit profile id wins.
    ///
    /// Empty strings count as absent.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when neither id is present.
    pub fn from_ids(profile_id: Option<&str>, account_id: Option<&str>) -> Result<Self, AdfluxError> {
        let non_empty = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);
        if let Some(p) = non_empty(profile_id) {
            return Ok(Self::Profile(p));
        }
        if let Some(a) = non_empty(account_id) {
            return Ok(Self::Account(a));
        }
        Err(AdfluxError::config(
            "there is no profileId or accountId in the configuration",
        ))
    }
}

/// Pick the single profile that belongs to `account_id`.
///
/// # Errors
/// `NotFound` when no profile matches, `AmbiguousProfile` when several do.
pub fn select_profile<'p>(
    account_id: &str,
    profiles: &'p [UserProfile],
) -> Result<&'p UserProfile, AdfluxError> {
    let mut matches = profiles.iter().filter(|p| p.account_id == account_id);
    match (matches.next(), matches.count()) {
        (None, _) => Err(AdfluxError::not_found(format!(
            "profile of current user for account {account_id}"
        ))),
        (Some(p), 0) => Ok(p),
        (Some(_), more) => Err(AdfluxError::AmbiguousProfile {
            account_id: account_id.to_string(),
            count: more + 1,
        }),
    }
}

/// Resolve a selector to a profile id, listing profiles only when needed.
///
/// # Errors
/// Propagates lookup failures and the errors of [`select_profile`].
pub async fn resolve_profile_id(
    selector: &ProfileSelector,
    lookup: &dyn ProfileLookup,
) -> Result<String, AdfluxError> {
    match selector {
        ProfileSelector::Profile(id) => Ok(id.clone()),
        ProfileSelector::Account(account_id) => {
            let profiles = lookup.list_user_profiles().await?;
            let p = select_profile(account_id, &profiles)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                profile_id = %p.profile_id,
                user = %p.user_name,
                account_id = %p.account_id,
                account = %p.account_name,
                "resolved user profile"
            );
            Ok(p.profile_id.clone())
        }
    }
}
