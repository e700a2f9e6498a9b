use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use super::{
    AuthError, CommunityMembership, GroupMembership, IdentityResolver, PersonaIdentity, Policy,
    Principal, RequestContext, RequestState,
};

pub const ADMINS: &str = "admins";
pub const MODERATORS: &str = "moderators";

/// Statically configured admin principals, matched by internal or public id.
///
/// Unioned with the dynamic `admins` group.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList(HashSet<String>);

impl AdminAllowList {
    pub fn contains(&self, principal: &Principal) -> bool {
        self.0.contains(&principal.id) || self.0.contains(&principal.orcid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for AdminAllowList {
    fn from(ids: Vec<String>) -> Self {
        Self(ids.into_iter().collect())
    }
}

impl<const N: usize> From<[&str; N]> for AdminAllowList {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.into_iter().map(str::to_string).collect())
    }
}

/// Decides whether a request may proceed under a named [`Policy`].
///
/// Stateless apart from its collaborators and the admin allow-list, so one
/// instance is shared (behind `Arc`) by every request task.
///
/// ```ignore
/// let evaluator = PolicyEvaluator::builder()
///     .identities(Arc::new(CredentialResolver::new(directory.clone())))
///     .groups(directory.clone())
///     .communities(directory.clone())
///     .personas(directory)
///     .admin_users(config.admin_users.clone())
///     .build();
/// ```
#[derive(TypedBuilder)]
pub struct PolicyEvaluator {
    identities: Arc<dyn IdentityResolver>,
    groups: Arc<dyn GroupMembership>,
    communities: Arc<dyn CommunityMembership>,
    personas: Arc<dyn PersonaIdentity>,
    #[builder(default, setter(into))]
    admin_users: AdminAllowList,
}

impl PolicyEvaluator {
    pub async fn evaluate(&self, policy: Policy, ctx: &RequestContext) -> bool {
        let Some(principal) = self.resolve(ctx).await else {
            debug!(policy = %policy, "No principal resolved, denying");
            return false;
        };

        let allowed = self.decide(policy, &ctx.state, &principal).await;
        debug!(policy = %policy, principal = %principal.id, allowed, "Policy evaluated");
        allowed
    }

    /// Like [`evaluate`](Self::evaluate) but takes the policy by name.
    ///
    /// An unknown name is an error rather than a denial.
    pub async fn evaluate_named(
        &self,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<bool, AuthError> {
        let policy: Policy = name.parse()?;
        Ok(self.evaluate(policy, ctx).await)
    }

    /// Evaluates every policy for one request, resolving the principal once.
    pub async fn evaluate_all(&self, ctx: &RequestContext) -> Vec<(Policy, bool)> {
        let principal = self.resolve(ctx).await;

        let mut decisions = Vec::with_capacity(Policy::ALL.len());
        for policy in Policy::ALL {
            let allowed = match &principal {
                Some(principal) => self.decide(policy, &ctx.state, principal).await,
                None => false,
            };
            decisions.push((policy, allowed));
        }
        decisions
    }

    pub fn admin_users(&self) -> &AdminAllowList {
        &self.admin_users
    }

    async fn resolve(&self, ctx: &RequestContext) -> Option<Principal> {
        if ctx.credential.is_anonymous() {
            return None;
        }

        match self.identities.resolve(&ctx.credential).await {
            Ok(principal) => principal,
            Err(e) => {
                warn!(error = %e, "Identity lookup failed, treating request as anonymous");
                None
            }
        }
    }

    async fn decide(&self, policy: Policy, state: &RequestState, principal: &Principal) -> bool {
        match policy {
            Policy::AccessPrivatePages => true,
            Policy::AccessModeratorPages => {
                self.in_group(MODERATORS, principal).await || self.is_admin(principal).await
            }
            Policy::AccessAdminPages => self.is_admin(principal).await,
            scoped => {
                if self.is_admin(principal).await {
                    return true;
                }
                self.holds_scope(scoped, state, principal).await
            }
        }
    }

    /// Resource-specific predicate of a scoped policy. A missing scope denies.
    async fn holds_scope(
        &self,
        policy: Policy,
        state: &RequestState,
        principal: &Principal,
    ) -> bool {
        match policy {
            // Owners always have member-level access, listed as members or not.
            Policy::AccessThisCommunity => match &state.community {
                Some(id) => {
                    fold_lookup(
                        "community membership",
                        self.communities.is_member_of_community(id, principal),
                    )
                    .await
                        || fold_lookup(
                            "community ownership",
                            self.communities.is_owner_of_community(id, principal),
                        )
                        .await
                }
                None => false,
            },
            Policy::EditThisCommunity => match &state.community {
                Some(id) => {
                    fold_lookup(
                        "community ownership",
                        self.communities.is_owner_of_community(id, principal),
                    )
                    .await
                }
                None => false,
            },
            Policy::EditThisPersona => match &state.persona {
                Some(id) => {
                    fold_lookup(
                        "persona identity",
                        self.personas.is_identity_of_persona(id, principal),
                    )
                    .await
                }
                None => false,
            },
            // Internal id or ORCID, either one suffices.
            Policy::EditThisUser => state
                .identity
                .as_deref()
                .is_some_and(|id| principal.is_identified_by(id)),
            Policy::AccessPrivatePages
            | Policy::AccessModeratorPages
            | Policy::AccessAdminPages => false,
        }
    }

    async fn is_admin(&self, principal: &Principal) -> bool {
        self.admin_users.contains(principal) || self.in_group(ADMINS, principal).await
    }

    async fn in_group(&self, group: &str, principal: &Principal) -> bool {
        fold_lookup("group membership", self.groups.is_member_of_group(group, principal)).await
    }
}

/// Lookup failures count as "no such membership".
async fn fold_lookup<F>(lookup: &'static str, fut: F) -> bool
where
    F: Future<Output = anyhow::Result<bool>>,
{
    match fut.await {
        Ok(found) => found,
        Err(e) => {
            warn!(lookup, error = %e, "Lookup failed, denying");
            false
        }
    }
}
