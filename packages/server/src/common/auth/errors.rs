use thiserror::Error;

use super::Policy;

/// Authorization errors for the PREreview API
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Access Denied - You don't have permission to: {policy}")]
    AccessDenied { policy: Policy },

    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),
}

impl AuthError {
    pub fn denied(policy: Policy) -> Self {
        Self::AccessDenied { policy }
    }
}
