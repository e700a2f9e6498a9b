//! Request-scoped resource ids derived from the URL path.
//!
//! Paths look like `/api/<version>/<collection>/<id>/...`. Each extractor
//! looks only at its own collection and yields `None` when the path does
//! not target it.

use super::Credential;

/// First path segment of every API route.
pub const API_NAMESPACE: &str = "api";

pub const COMMUNITIES: &str = "communities";
pub const PERSONAS: &str = "personas";
pub const USERS: &str = "users";

/// Resource ids a resource-scoped policy may check against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub community: Option<String>,
    pub persona: Option<String>,
    pub identity: Option<String>,
}

impl RequestState {
    /// Runs the three extractors against `path`.
    pub fn from_path(path: &str) -> Self {
        Self {
            community: community_from_path(path),
            persona: persona_from_path(path),
            identity: identity_from_path(path),
        }
    }
}

/// Everything the evaluator needs to know about one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub credential: Credential,
    pub state: RequestState,
}

impl RequestContext {
    pub fn new(credential: Credential, state: RequestState) -> Self {
        Self { credential, state }
    }

    pub fn anonymous(path: &str) -> Self {
        Self::new(Credential::Anonymous, RequestState::from_path(path))
    }
}

pub fn community_from_path(path: &str) -> Option<String> {
    scoped_id(path, COMMUNITIES)
}

pub fn persona_from_path(path: &str) -> Option<String> {
    scoped_id(path, PERSONAS)
}

pub fn identity_from_path(path: &str) -> Option<String> {
    scoped_id(path, USERS)
}

fn scoped_id(path: &str, collection: &str) -> Option<String> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    if segments.first() != Some(&API_NAMESPACE) || segments.get(2) != Some(&collection) {
        return None;
    }

    segments
        .get(3)
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
}
