//! Router assembly.

pub mod common;
pub mod resource;
pub mod tenant;

pub use common::common_routes;
pub use resource::resource_routes;
pub use tenant::tenant_routes;

use crate::middleware::resolve_tenant;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body (tenant registration payloads are small).
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Every route with tenant resolution installed. Authentication layers that insert an
/// `Arc<Principal>` must be added on top of this router so they run first.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(tenant_routes(state.clone()))
        .merge(resource_routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(state, resolve_tenant))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
}
