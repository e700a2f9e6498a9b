use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::common::auth::{Policy, RequestContext};
use crate::server::app::AppState;

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub authenticated: bool,
    pub community: Option<String>,
    pub persona: Option<String>,
    pub identity: Option<String>,
    pub policies: BTreeMap<&'static str, bool>,
}

/// Every policy decision for the caller, scoped by the request path.
///
/// Mounted at `/api/v2/permissions` and
/// `/api/v2/{communities,personas,users}/:id/permissions`.
pub async fn permissions_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Json<PermissionsResponse> {
    let decisions = state.evaluator.evaluate_all(&ctx).await;

    let authenticated = decisions
        .iter()
        .any(|(policy, allowed)| *policy == Policy::AccessPrivatePages && *allowed);

    Json(PermissionsResponse {
        authenticated,
        community: ctx.state.community,
        persona: ctx.state.persona,
        identity: ctx.state.identity,
        policies: decisions
            .into_iter()
            .map(|(policy, allowed)| (policy.name(), allowed))
            .collect(),
    })
}
