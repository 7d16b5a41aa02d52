//! Protected-resource routes. The kind is a path segment: databases, datasets, dashboards, charts, saved_queries.

use crate::handlers::resource::{list, read};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/resources/:kind", get(list))
        .route("/resources/:kind/:id", get(read))
        .with_state(state)
}
