// TestDependencies - in-memory directory for testing
//
// Implements every lookup capability over plain maps so the evaluator and
// the HTTP layer can be exercised without Postgres.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::common::auth::{
    ApiKeyLookup, CommunityMembership, GroupMembership, PersonaIdentity, Principal,
};

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    api_keys: HashMap<(String, String), Principal>,
    groups: HashMap<String, HashSet<String>>,
    community_members: HashMap<String, HashSet<String>>,
    community_owners: HashMap<String, HashSet<String>>,
    personas: HashMap<String, String>,
    failing: bool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, app: &str, secret: &str, principal: &Principal) -> Self {
        self.api_keys
            .insert((app.to_string(), secret.to_string()), principal.clone());
        self
    }

    pub fn with_group_member(mut self, group: &str, principal: &Principal) -> Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(principal.id.clone());
        self
    }

    pub fn with_community_member(mut self, community_id: &str, principal: &Principal) -> Self {
        self.community_members
            .entry(community_id.to_string())
            .or_default()
            .insert(principal.id.clone());
        self
    }

    /// Owners are recorded separately; they are not added as members.
    pub fn with_community_owner(mut self, community_id: &str, principal: &Principal) -> Self {
        self.community_owners
            .entry(community_id.to_string())
            .or_default()
            .insert(principal.id.clone());
        self
    }

    pub fn with_persona(mut self, persona_id: &str, identity: &Principal) -> Self {
        self.personas
            .insert(persona_id.to_string(), identity.id.clone());
        self
    }

    /// Make every lookup return an error, as an unreachable store would.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check_available(&self) -> Result<()> {
        if self.failing {
            bail!("directory unavailable");
        }
        Ok(())
    }
}

fn contains(index: &HashMap<String, HashSet<String>>, key: &str, principal: &Principal) -> bool {
    index
        .get(key)
        .is_some_and(|ids| ids.contains(&principal.id))
}

#[async_trait]
impl ApiKeyLookup for InMemoryDirectory {
    async fn find_by_api_key(&self, app: &str, secret: &str) -> Result<Option<Principal>> {
        self.check_available()?;
        Ok(self
            .api_keys
            .get(&(app.to_string(), secret.to_string()))
            .cloned())
    }
}

#[async_trait]
impl GroupMembership for InMemoryDirectory {
    async fn is_member_of_group(&self, group: &str, principal: &Principal) -> Result<bool> {
        self.check_available()?;
        Ok(contains(&self.groups, group, principal))
    }
}

#[async_trait]
impl CommunityMembership for InMemoryDirectory {
    async fn is_member_of_community(
        &self,
        community_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.check_available()?;
        Ok(contains(&self.community_members, community_id, principal))
    }

    async fn is_owner_of_community(
        &self,
        community_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.check_available()?;
        Ok(contains(&self.community_owners, community_id, principal))
    }
}

#[async_trait]
impl PersonaIdentity for InMemoryDirectory {
    async fn is_identity_of_persona(
        &self,
        persona_id: &str,
        principal: &Principal,
    ) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .personas
            .get(persona_id)
            .is_some_and(|identity| *identity == principal.id))
    }
}
