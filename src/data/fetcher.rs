//! Dashboard data fetcher
//!
//! One lookup per call: no retries, no caching.

use super::models::GithubUser;
use crate::backend::BackendClient;

/// Load and normalize the dashboard data for `username`
///
/// Returns `None` when the backend answers non-2xx, cannot be reached,
/// or sends an undecodable body. Absence is an expected outcome for
/// callers, not an error.
pub async fn fetch_github_user(
    backend: &BackendClient,
    username: &str,
    bearer: Option<&str>,
) -> Option<GithubUser> {
    match backend.lookup_user(username, bearer).await {
        Ok(payload) => Some(GithubUser::from_payload(&payload)),
        Err(error) => {
            tracing::info!(username, %error, "No dashboard data for user");
            None
        }
    }
}
