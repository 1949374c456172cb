//! Data layer module
//!
//! Fetches dashboard data from the backend and normalizes it:
//! - User profile
//! - Repository list
//! - Contribution history

mod fetcher;
mod models;

pub use fetcher::fetch_github_user;
pub use models::{Contribution, GithubUser, Repository};
