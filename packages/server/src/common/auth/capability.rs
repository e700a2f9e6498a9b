use std::fmt;
use std::str::FromStr;

use super::AuthError;

/// Named authorization rules enforced by the PREreview API.
///
/// The set is fixed at compile time. Each variant maps to one rule in
/// [`PolicyEvaluator::evaluate`](super::PolicyEvaluator::evaluate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Any resolved principal (session or API key)
    AccessPrivatePages,

    /// Moderators and admins
    AccessModeratorPages,

    /// Admins only
    AccessAdminPages,

    /// Members of the community in the request path
    AccessThisCommunity,

    /// Owners of the community in the request path
    EditThisCommunity,

    /// Controlling identity of the persona in the request path
    EditThisPersona,

    /// The user in the request path, by internal or public id
    EditThisUser,
}

impl Policy {
    pub const ALL: [Policy; 7] = [
        Policy::AccessPrivatePages,
        Policy::AccessModeratorPages,
        Policy::AccessAdminPages,
        Policy::AccessThisCommunity,
        Policy::EditThisCommunity,
        Policy::EditThisPersona,
        Policy::EditThisUser,
    ];

    /// Human-readable name, as it appears in access-denied messages.
    pub fn name(&self) -> &'static str {
        match self {
            Policy::AccessPrivatePages => "access private pages",
            Policy::AccessModeratorPages => "access moderator pages",
            Policy::AccessAdminPages => "access admin pages",
            Policy::AccessThisCommunity => "access this community",
            Policy::EditThisCommunity => "edit this community",
            Policy::EditThisPersona => "edit this persona",
            Policy::EditThisUser => "edit this user",
        }
    }

    /// Whether admins bypass the resource-specific predicate.
    pub fn has_admin_override(&self) -> bool {
        !matches!(self, Policy::AccessPrivatePages)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = AuthError;

    /// Accepts both `edit this user` and `edit-this-user`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', " ");
        Policy::ALL
            .into_iter()
            .find(|policy| policy.name() == normalized)
            .ok_or_else(|| AuthError::UnknownPolicy(s.to_string()))
    }
}
