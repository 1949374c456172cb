//! Dashboard view models
//!
//! The backend's user document is loosely typed: ids arrive as strings
//! or numbers, collections may be `null` or missing, and field names mix
//! camelCase with snake_case. Everything is coerced here, field by field,
//! into a strict shape. Unknown fields are ignored.

use serde::Serialize;
use serde_json::Value;

// =============================================================================
// Models
// =============================================================================

/// Normalized user aggregate rendered by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub public_repos: i64,
    pub repositories: Vec<Repository>,
    pub contributions: Vec<Contribution>,
    /// Sum of all contribution counts
    pub total_contributions: i64,
}

/// Repository summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub url: Option<String>,
    pub stars: i64,
    pub forks: i64,
}

/// Contributions on one day
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contribution {
    pub date: Option<String>,
    pub count: i64,
}

// =============================================================================
// Normalization
// =============================================================================

impl GithubUser {
    /// Build a user from the backend's user document
    ///
    /// A `{ "user": { ... } }` envelope is unwrapped first.
    pub fn from_payload(payload: &Value) -> Self {
        let doc = match payload.get("user") {
            Some(inner @ Value::Object(_)) => inner,
            _ => payload,
        };

        let repositories: Vec<Repository> = list(doc, &["repositories", "repos"])
            .iter()
            .map(Repository::from_payload)
            .collect();
        let contributions: Vec<Contribution> = list(doc, &["contributions"])
            .iter()
            .map(Contribution::from_payload)
            .collect();
        let total_contributions = contributions
            .iter()
            .fold(0_i64, |total, c| total.saturating_add(c.count));

        Self {
            id: int(doc, &["id", "githubId", "github_id"]),
            login: text(doc, &["login", "username"]).unwrap_or_default(),
            name: text(doc, &["name"]),
            avatar_url: text(doc, &["avatarUrl", "avatar_url", "imageUrl"]),
            bio: text(doc, &["bio"]),
            email: text(doc, &["email"]),
            followers: int(doc, &["followers"]),
            following: int(doc, &["following"]),
            public_repos: int(doc, &["publicRepos", "public_repos"]),
            repositories,
            contributions,
            total_contributions,
        }
    }
}

impl Repository {
    fn from_payload(doc: &Value) -> Self {
        Self {
            id: int(doc, &["id"]),
            name: text(doc, &["name"]).unwrap_or_default(),
            full_name: text(doc, &["fullName", "full_name"]),
            description: text(doc, &["description"]),
            language: text(doc, &["language"]),
            url: text(doc, &["url", "htmlUrl", "html_url"]),
            stars: int(doc, &["stars", "stargazersCount", "stargazers_count"]),
            forks: int(doc, &["forks", "forksCount", "forks_count"]),
        }
    }
}

impl Contribution {
    fn from_payload(doc: &Value) -> Self {
        Self {
            date: text(doc, &["date"]),
            count: int(doc, &["count", "contributionCount"]),
        }
    }
}

/// First present, non-null field among `keys`
fn field<'a>(doc: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| doc.get(key))
        .find(|value| !value.is_null())
}

/// Integer coercion; anything unparseable becomes 0
fn int(doc: &Value, keys: &[&str]) -> i64 {
    field(doc, keys).map(coerce_int).unwrap_or(0)
}

fn coerce_int(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    };
    parsed.unwrap_or(0)
}

/// Fractional values truncate toward zero; NaN and infinities are unparseable
fn truncate(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

fn text(doc: &Value, keys: &[&str]) -> Option<String> {
    match field(doc, keys)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Array field; `null`, missing, or non-array values become empty
fn list<'a>(doc: &'a Value, keys: &[&str]) -> &'a [Value] {
    match field(doc, keys) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}
