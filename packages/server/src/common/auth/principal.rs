use serde::{Deserialize, Serialize};

/// The resolved identity making a request.
///
/// `id` is the internal account identifier; `orcid` is the identifier the
/// platform shows publicly. Either one may appear in a `/users/<id>` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub orcid: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, orcid: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            orcid: orcid.into(),
        }
    }

    /// True if `identifier` names this principal by internal or public id.
    pub fn is_identified_by(&self, identifier: &str) -> bool {
        self.id == identifier || self.orcid == identifier
    }
}

/// How the caller presented itself. Exactly one is active per request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credential {
    /// Session already authenticated upstream; trusted as-is.
    Session(Principal),
    /// `X-API-App` / `X-API-Key` header pair, not yet resolved.
    ApiKey { app: String, secret: String },
    #[default]
    Anonymous,
}

impl Credential {
    pub fn api_key(app: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::ApiKey {
            app: app.into(),
            secret: secret.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}
