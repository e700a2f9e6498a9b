//! Postgres-backed lookups for the policy evaluator.
//!
//! Reads the tables created by `migrations/*_access_control.sql`. API
//! secrets are never stored in the clear: `api_keys.secret_digest` holds the
//! lowercase hex SHA-256 of the secret and lookups compare digests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::common::auth::{
    ApiKeyLookup, CommunityMembership, GroupMembership, PersonaIdentity, Principal,
};

/// Hex SHA-256 of an API secret, as stored in `api_keys.secret_digest`.
pub fn digest_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: String,
    orcid: String,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal::new(row.id, row.orcid)
    }
}

#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Store a new API key for `user_id`, replacing any key with the same app name.
    pub async fn issue_api_key(&self, user_id: &str, app: &str, secret: &str) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO api_keys (user_id, app, secret_digest)
               VALUES ($1, $2, $3)
               ON CONFLICT (user_id, app) DO UPDATE SET secret_digest = EXCLUDED.secret_digest"#,
        )
        .bind(user_id)
        .bind(app)
        .bind(digest_secret(secret))
        .execute(&self.pool)
        .await
        .context("Failed to store API key")?;

        debug!(user_id, app, "API key issued");
        Ok(())
    }

    async fn exists(
        &self,
        query: &'static str,
        first: &str,
        principal: &Principal,
    ) -> Result<bool> {
        let found: bool = sqlx::query_scalar(query)
            .bind(first)
            .bind(&principal.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl ApiKeyLookup for PgDirectory {
    async fn find_by_api_key(&self, app: &str, secret: &str) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"SELECT u.id, u.orcid
               FROM api_keys k
               JOIN users u ON u.id = k.user_id
               WHERE k.app = $1 AND k.secret_digest = $2"#,
        )
        .bind(app)
        .bind(digest_secret(secret))
        .fetch_optional(&self.pool)
        .await
        .context("API key lookup failed")?;

        Ok(row.map(Principal::from))
    }
}

#[async_trait]
impl GroupMembership for PgDirectory {
    async fn is_member_of_group(&self, group: &str, principal: &Principal) -> Result<bool> {
        self.exists(
            r#"SELECT EXISTS (
                   SELECT 1 FROM group_members gm
                   JOIN groups g ON g.id = gm.group_id
                   WHERE g.name = $1 AND gm.user_id = $2
               )"#,
            group,
            principal,
        )
        .await
        .context("Group membership lookup failed")
    }
}

#[async_trait]
impl CommunityMembership for PgDirectory {
    async fn is_member_of_community(
        &self,
        community_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.exists(
            r#"SELECT EXISTS (
                   SELECT 1 FROM community_members
                   WHERE community_id = $1 AND user_id = $2
               )"#,
            community_id,
            principal,
        )
        .await
        .context("Community membership lookup failed")
    }

    async fn is_owner_of_community(
        &self,
        community_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.exists(
            r#"SELECT EXISTS (
                   SELECT 1 FROM community_owners
                   WHERE community_id = $1 AND user_id = $2
               )"#,
            community_id,
            principal,
        )
        .await
        .context("Community ownership lookup failed")
    }
}

#[async_trait]
impl PersonaIdentity for PgDirectory {
    async fn is_identity_of_persona(
        &self,
        persona_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.exists(
            r#"SELECT EXISTS (
                   SELECT 1 FROM personas
                   WHERE id = $1 AND identity_id = $2
               )"#,
            persona_id,
            principal,
        )
        .await
        .context("Persona identity lookup failed")
    }
}
