//! Per-request tenant resolution. Runs after authentication so the principal is available.

use crate::context::ResolvedTenantContext;
use crate::principal::Principal;
use crate::resolver::RequestAttrs;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Resolves the tenant once and stores it in the request extensions as `Arc<ResolvedTenantContext>`.
/// A context that is already present is kept; the carrier is write-once.
pub async fn resolve_tenant(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.extensions().get::<Arc<ResolvedTenantContext>>().is_some() {
        tracing::warn!(path = %req.uri().path(), "tenant context already set; keeping existing value");
        return next.run(req).await;
    }
    let (mut parts, body) = req.into_parts();
    let attrs = RequestAttrs::from_parts(&parts, state.resolver.config());
    let principal = parts.extensions.get::<Arc<Principal>>().cloned();
    let ctx = state.resolver.resolve(&attrs, principal.as_deref());
    parts.extensions.insert(Arc::new(ctx));
    next.run(Request::from_parts(parts, body)).await
}
