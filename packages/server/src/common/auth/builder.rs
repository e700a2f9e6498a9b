use super::{AuthError, Policy, PolicyEvaluator, RequestContext};

/// Entry point for inline authorization checks
///
/// Usage:
/// ```ignore
/// Actor::new(ctx)
///     .can(Policy::EditThisCommunity)
///     .check(&evaluator)
///     .await?;
/// ```
pub struct Actor {
    ctx: RequestContext,
}

impl Actor {
    /// Create a new actor for authorization checks
    ///
    /// # Arguments
    /// * `ctx` - Credential and path-derived scope of the incoming request
    pub fn new(ctx: RequestContext) -> Self {
        Self { ctx }
    }

    /// Specify which policy the actor must satisfy
    pub fn can(self, policy: Policy) -> PolicyCheck {
        PolicyCheck {
            ctx: self.ctx,
            policy,
        }
    }
}

/// Builder after specifying the policy
pub struct PolicyCheck {
    ctx: RequestContext,
    policy: Policy,
}

impl PolicyCheck {
    /// Perform the authorization check
    pub async fn check(self, evaluator: &PolicyEvaluator) -> Result<(), AuthError> {
        if evaluator.evaluate(self.policy, &self.ctx).await {
            Ok(())
        } else {
            Err(AuthError::denied(self.policy))
        }
    }
}
