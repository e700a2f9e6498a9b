//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::common::auth::{
    AdminAllowList, ApiKeyLookup, CommunityMembership, CredentialResolver, GroupMembership,
    PersonaIdentity, PolicyEvaluator,
};
use crate::domains::auth::JwtService;
use crate::server::middleware::{jwt_auth_middleware, API_APP_HEADER, API_KEY_HEADER};
use crate::server::routes::{health_handler, permissions_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<PolicyEvaluator>,
    pub jwt_service: Arc<JwtService>,
    /// `None` when running without Postgres (tests, in-memory directory)
    pub db_pool: Option<PgPool>,
}

/// Wire one directory into every lookup the evaluator needs.
pub fn build_evaluator<D>(
    directory: Arc<D>,
    admin_users: impl Into<AdminAllowList>,
) -> PolicyEvaluator
where
    D: ApiKeyLookup + GroupMembership + CommunityMembership + PersonaIdentity + 'static,
{
    PolicyEvaluator::builder()
        .identities(Arc::new(CredentialResolver::new(directory.clone())))
        .groups(directory.clone())
        .communities(directory.clone())
        .personas(directory)
        .admin_users(admin_users)
        .build()
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(API_APP_HEADER),
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    if origins.is_empty() {
        // Development: allow any origin
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the Axum application router
///
/// `api` carries the protected routes (each with its own `RequirePolicy`
/// route layer); it is merged under the shared session, CORS and trace
/// layers.
pub fn build_app(state: AppState, api: Router<AppState>, allowed_origins: &[String]) -> Router {
    let jwt_service = state.jwt_service.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v2/permissions", get(permissions_handler))
        .route("/api/v2/communities/:id/permissions", get(permissions_handler))
        .route("/api/v2/personas/:id/permissions", get(permissions_handler))
        .route("/api/v2/users/:id/permissions", get(permissions_handler))
        .merge(api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
