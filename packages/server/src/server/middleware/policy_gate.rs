//! Route-level policy enforcement.
//!
//! [`RequirePolicy`] is a tower layer applied with `Router::route_layer`. It
//! builds a [`RequestContext`] from the request (session user from
//! [`jwt_auth_middleware`](super::jwt_auth_middleware), else the API-key
//! headers) and answers 403 when the policy denies.
//!
//! ```ignore
//! Router::new()
//!     .route("/api/v2/communities/:id", put(update_community))
//!     .route_layer(RequirePolicy::new(evaluator.clone(), Policy::EditThisCommunity));
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri, Request},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::debug;

use super::AuthUser;
use crate::common::auth::{
    Actor, AuthError, Credential, Policy, PolicyEvaluator, RequestContext, RequestState,
};

pub const API_APP_HEADER: &str = "x-api-app";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Build the evaluator's view of a request.
///
/// Uses the original URI so scoping still works inside nested routers.
pub fn request_context(parts: &Parts) -> RequestContext {
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path())
        .unwrap_or_else(|| parts.uri.path());

    RequestContext::new(credential(parts), RequestState::from_path(path))
}

/// A verified session wins over API-key headers.
fn credential(parts: &Parts) -> Credential {
    if let Some(user) = parts.extensions.get::<AuthUser>() {
        return Credential::Session(user.principal.clone());
    }

    match (
        header_value(&parts.headers, API_APP_HEADER),
        header_value(&parts.headers, API_KEY_HEADER),
    ) {
        (Some(app), Some(secret)) => Credential::api_key(app, secret),
        _ => Credential::Anonymous,
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(request_context(parts))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            AuthError::UnknownPolicy(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

/// Route layer that admits a request only if `policy` allows it.
#[derive(Clone)]
pub struct RequirePolicy {
    evaluator: Arc<PolicyEvaluator>,
    policy: Policy,
}

impl RequirePolicy {
    pub fn new(evaluator: Arc<PolicyEvaluator>, policy: Policy) -> Self {
        Self { evaluator, policy }
    }

    /// Look the policy up by name (`edit-this-user` or `edit this user`).
    pub fn named(evaluator: Arc<PolicyEvaluator>, name: &str) -> Result<Self, AuthError> {
        Ok(Self::new(evaluator, name.parse()?))
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

impl<S> Layer<S> for RequirePolicy {
    type Service = RequirePolicyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePolicyService {
            inner,
            evaluator: self.evaluator.clone(),
            policy: self.policy,
        }
    }
}

/// Service wrapper for [`RequirePolicy`].
#[derive(Clone)]
pub struct RequirePolicyService<S> {
    inner: S,
    evaluator: Arc<PolicyEvaluator>,
    policy: Policy,
}

impl<S> Service<Request> for RequirePolicyService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let evaluator = self.evaluator.clone();
        let policy = self.policy;

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let ctx = request_context(&parts);

            match Actor::new(ctx).can(policy).check(&evaluator).await {
                Ok(()) => inner.call(Request::from_parts(parts, body)).await,
                Err(e) => {
                    debug!(policy = %policy, path = %parts.uri.path(), "Access denied");
                    Ok(e.into_response())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::auth::Principal;

    fn parts(request: axum::http::Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_anonymous_without_headers() {
        let parts = parts(
            axum::http::Request::builder()
                .uri("/api/v2/communities/c1")
                .body(())
                .unwrap(),
        );
        let ctx = request_context(&parts);
        assert_eq!(ctx.credential, Credential::Anonymous);
        assert_eq!(ctx.state.community.as_deref(), Some("c1"));
    }

    #[test]
    fn test_api_key_needs_both_headers() {
        let only_app = parts(
            axum::http::Request::builder()
                .uri("/api/v2/users")
                .header(API_APP_HEADER, "bot")
                .body(())
                .unwrap(),
        );
        assert_eq!(request_context(&only_app).credential, Credential::Anonymous);

        let both = parts(
            axum::http::Request::builder()
                .uri("/api/v2/users")
                .header(API_APP_HEADER, "bot")
                .header(API_KEY_HEADER, "s3cr3t")
                .body(())
                .unwrap(),
        );
        assert_eq!(
            request_context(&both).credential,
            Credential::api_key("bot", "s3cr3t")
        );
    }

    #[test]
    fn test_session_wins_over_api_key() {
        let principal = Principal::new("42", "0000-0002-1825-0097");
        let mut parts = parts(
            axum::http::Request::builder()
                .uri("/api/v2/personas/p1")
                .header(API_APP_HEADER, "bot")
                .header(API_KEY_HEADER, "s3cr3t")
                .body(())
                .unwrap(),
        );
        parts.extensions.insert(AuthUser {
            principal: principal.clone(),
        });

        let ctx = request_context(&parts);
        assert_eq!(ctx.credential, Credential::Session(principal));
        assert_eq!(ctx.state.persona.as_deref(), Some("p1"));
    }

    #[test]
    fn test_original_uri_preferred() {
        let mut parts = parts(
            axum::http::Request::builder()
                .uri("/c2/members")
                .body(())
                .unwrap(),
        );
        parts.extensions.insert(OriginalUri(
            "/api/v2/communities/c2/members".parse().unwrap(),
        ));

        assert_eq!(
            request_context(&parts).state.community.as_deref(),
            Some("c2")
        );
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_denied_maps_to_forbidden() {
        let response = AuthError::denied(Policy::AccessAdminPages).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_text(response).await,
            "Access Denied - You don't have permission to: access admin pages"
        );

        let response = AuthError::UnknownPolicy("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Unknown policy: nope");
    }
}
