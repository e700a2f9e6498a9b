// Lookup capabilities the evaluator depends on.
//
// Each trait exposes the single question the evaluator asks. "Not found" is
// Ok(false) / Ok(None); Err is reserved for infrastructure failures.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{Credential, Principal};

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the principal behind a credential, or `None` if there is none.
    async fn resolve(&self, credential: &Credential) -> Result<Option<Principal>>;
}

#[async_trait]
pub trait ApiKeyLookup: Send + Sync {
    /// Find the principal owning exactly this `(app, secret)` pair.
    async fn find_by_api_key(&self, app: &str, secret: &str) -> Result<Option<Principal>>;
}

#[async_trait]
pub trait GroupMembership: Send + Sync {
    async fn is_member_of_group(&self, group: &str, principal: &Principal) -> Result<bool>;
}

#[async_trait]
pub trait CommunityMembership: Send + Sync {
    async fn is_member_of_community(&self, community_id: &str, principal: &Principal)
        -> Result<bool>;

    async fn is_owner_of_community(&self, community_id: &str, principal: &Principal)
        -> Result<bool>;
}

#[async_trait]
pub trait PersonaIdentity: Send + Sync {
    /// True if `principal` is the controlling identity of the persona.
    async fn is_identity_of_persona(&self, persona_id: &str, principal: &Principal)
        -> Result<bool>;
}

#[async_trait]
impl<T: ApiKeyLookup + ?Sized> ApiKeyLookup for Arc<T> {
    async fn find_by_api_key(&self, app: &str, secret: &str) -> Result<Option<Principal>> {
        (**self).find_by_api_key(app, secret).await
    }
}

/// Default [`IdentityResolver`]: trusts sessions, looks API keys up.
pub struct CredentialResolver<U> {
    users: U,
}

impl<U> CredentialResolver<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U: ApiKeyLookup> IdentityResolver for CredentialResolver<U> {
    async fn resolve(&self, credential: &Credential) -> Result<Option<Principal>> {
        match credential {
            Credential::Session(principal) => Ok(Some(principal.clone())),
            Credential::ApiKey { app, secret } => self.users.find_by_api_key(app, secret).await,
            Credential::Anonymous => Ok(None),
        }
    }
}
