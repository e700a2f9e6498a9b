/// Policy-based access control for the PREreview API
///
/// Handlers and route layers ask a shared [`PolicyEvaluator`] whether the
/// caller may proceed under one of the fixed [`Policy`] rules:
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, Policy};
///
/// Actor::new(ctx)
///     .can(Policy::EditThisCommunity)
///     .check(&evaluator)
///     .await?;
/// ```
///
/// The evaluator never fails a request on its own: missing scope, unknown
/// credentials, and lookup errors all deny.

mod builder;
mod capability;
mod errors;
mod evaluator;
mod lookups;
mod principal;
mod request_state;

pub use builder::{Actor, PolicyCheck};
pub use capability::Policy;
pub use errors::AuthError;
pub use evaluator::{AdminAllowList, PolicyEvaluator, ADMINS, MODERATORS};
pub use lookups::{
    ApiKeyLookup, CommunityMembership, CredentialResolver, GroupMembership, IdentityResolver,
    PersonaIdentity,
};
pub use principal::{Credential, Principal};
pub use request_state::{
    community_from_path, identity_from_path, persona_from_path, RequestContext, RequestState,
    API_NAMESPACE,
};
