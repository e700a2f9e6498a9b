//! Test harness wiring the real router to an in-memory directory.
//!
//! Every protected route below answers `"ok"` when its policy allows the
//! request, so tests only have to look at status and body.

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use prereview_core::common::auth::{Policy, PolicyEvaluator, Principal};
use prereview_core::domains::auth::JwtService;
use prereview_core::kernel::InMemoryDirectory;
use prereview_core::server::middleware::RequirePolicy;
use prereview_core::server::{build_app, build_evaluator, AppState};

use super::HttpClient;

pub const JWT_SECRET: &str = "test_secret_key";
pub const JWT_ISSUER: &str = "test_issuer";

pub struct TestHarness {
    pub state: AppState,
}

impl TestHarness {
    pub fn new(directory: InMemoryDirectory) -> Self {
        Self::with_admins(directory, Vec::new())
    }

    pub fn with_admins(directory: InMemoryDirectory, admin_users: Vec<String>) -> Self {
        let evaluator = build_evaluator(Arc::new(directory), admin_users);
        let state = AppState {
            evaluator: Arc::new(evaluator),
            jwt_service: Arc::new(JwtService::new(JWT_SECRET, JWT_ISSUER.to_string())),
            db_pool: None,
        };
        Self { state }
    }

    pub fn evaluator(&self) -> Arc<PolicyEvaluator> {
        self.state.evaluator.clone()
    }

    /// Session token for `principal`, as issued at login.
    pub fn session_token(&self, principal: &Principal) -> String {
        self.state
            .jwt_service
            .create_token(principal)
            .expect("Failed to create session token")
    }

    pub fn client(&self) -> HttpClient {
        HttpClient::new(build_app(
            self.state.clone(),
            protected_routes(self.evaluator()),
            &[],
        ))
    }
}

async fn ok() -> &'static str {
    "ok"
}

fn gated(
    evaluator: &Arc<PolicyEvaluator>,
    policy: Policy,
    router: Router<AppState>,
) -> Router<AppState> {
    router.route_layer(RequirePolicy::new(evaluator.clone(), policy))
}

/// One route per policy, shaped like the PREreview API.
pub fn protected_routes(evaluator: Arc<PolicyEvaluator>) -> Router<AppState> {
    Router::new()
        .merge(gated(
            &evaluator,
            Policy::AccessPrivatePages,
            Router::new().route("/api/v2/requests", get(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::AccessModeratorPages,
            Router::new().route("/api/v2/moderation/reports", get(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::AccessAdminPages,
            Router::new().route("/api/v2/admin/groups", get(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::AccessThisCommunity,
            Router::new().route("/api/v2/communities/:id/reviews", get(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::EditThisCommunity,
            Router::new().route("/api/v2/communities/:id/settings", put(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::EditThisPersona,
            Router::new().route("/api/v2/personas/:id", put(ok)),
        ))
        .merge(gated(
            &evaluator,
            Policy::EditThisUser,
            Router::new().route("/api/v2/users/:id", put(ok)),
        ))
}
