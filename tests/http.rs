use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tenant_scope::authz::ResourceRow;
use tenant_scope::{
    app_router, AllowAll, AppState, MemoryCacheBackend, MemoryCatalog, MemoryTenantDirectory, NewTenant, Principal,
    ResourceKind, TenancyConfig, TenantDirectory,
};
use tower::ServiceExt;

/// Test stand-in for authentication: `X-User` plus `X-Role: admin|standard`.
async fn identity(mut req: Request<Body>, next: Next) -> Response {
    let user = req
        .headers()
        .get("X-User")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let admin = req
        .headers()
        .get("X-Role")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|r| r == "admin");
    if let Some(user) = user {
        let principal = if admin { Principal::admin(user) } else { Principal::standard(user) };
        req.extensions_mut().insert(Arc::new(principal));
    }
    next.run(req).await
}

struct Harness {
    app: Router,
    directory: Arc<MemoryTenantDirectory>,
}

fn harness(config: TenancyConfig) -> Harness {
    let catalog = MemoryCatalog::new();
    for (id, tenant) in [("1", Some("acme")), ("2", Some("globex")), ("3", None)] {
        catalog
            .insert(ResourceRow::labeled(
                ResourceKind::Dashboard,
                id,
                tenant,
                json!({"id": id, "dashboard_title": format!("Dashboard {}", id)}),
            ))
            .unwrap();
    }
    let directory = Arc::new(MemoryTenantDirectory::new());
    let state = AppState::new(
        config,
        Arc::new(AllowAll),
        Arc::new(catalog),
        directory.clone(),
        Arc::new(MemoryCacheBackend::default()),
    );
    Harness {
        app: app_router(state).layer(axum::middleware::from_fn(identity)),
        directory,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

#[tokio::test]
async fn health_is_ok() {
    let h = harness(TenancyConfig::default());
    let (status, body) = send(&h.app, get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, _) = send(&h.app, get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn same_tenant_dashboard_is_returned() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards/1")
        .header("X-Tenant-ID", "acme")
        .header("X-User", "alice")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["tenant_id"], "acme");
}

#[tokio::test]
async fn other_tenant_dashboard_is_denied_by_name() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards/1")
        .header("X-Tenant-ID", "other")
        .header("X-User", "alice")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "tenant_access_denied");
    assert_eq!(body["error"]["details"]["resource_id"], "1");
    assert_eq!(body["error"]["details"]["resource_kind"], "Dashboard");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Dashboard 1"));
    assert!(!message.contains("acme"));
    assert!(!message.contains("other"));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards/42").header("X-Tenant-ID", "acme").body(Body::empty()).unwrap();
    let (status, _) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let req = get("/resources/widgets").body(Body::empty()).unwrap();
    let (status, _) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_scoped_to_tenant() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards")
        .header("X-Tenant-ID", "acme")
        .header("X-User", "alice")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"][0]["id"], "1");
}

#[tokio::test]
async fn listing_without_tenant_is_unfiltered() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&h.app, req).await;
    assert_eq!(body["meta"]["count"], 3);
}

#[tokio::test]
async fn strict_mode_empties_listing_for_unscoped_user() {
    let config = TenancyConfig {
        strict_mode: true,
        ..TenancyConfig::default()
    };
    let h = harness(config);
    let req = get("/resources/dashboards").header("X-User", "bob").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 0);
}

#[tokio::test]
async fn admin_impersonation_scopes_listing() {
    let h = harness(TenancyConfig::default());
    let req = get("/resources/dashboards")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .header("X-Impersonate-Tenant", "globex")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&h.app, req).await;
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"][0]["id"], "2");
}

#[tokio::test]
async fn current_tenant_reports_source() {
    let h = harness(TenancyConfig::default());
    let req = get("/tenant/current").header("X-Tenant-ID", " acme ").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenant_id"], "acme");
    assert_eq!(body["data"]["source"], "header");

    let (_, body) = send(&h.app, get("/tenant/current").body(Body::empty()).unwrap()).await;
    assert_eq!(body["data"]["tenant_id"], Value::Null);
    assert_eq!(body["data"]["source"], "none");
}

#[tokio::test]
async fn configured_default_applies_without_signals() {
    let config = TenancyConfig {
        default_tenant_id: Some("fallback".into()),
        ..TenancyConfig::default()
    };
    let h = harness(config);
    let (_, body) = send(&h.app, get("/tenant/current").body(Body::empty()).unwrap()).await;
    assert_eq!(body["data"]["tenant_id"], "fallback");
    assert_eq!(body["data"]["source"], "configured_default");
}

#[tokio::test]
async fn subdomain_resolves_when_enabled() {
    let config = TenancyConfig {
        enable_subdomain_routing: true,
        ..TenancyConfig::default()
    };
    let h = harness(config);
    let req = get("/tenant/current").header("Host", "acme.example.com").body(Body::empty()).unwrap();
    let (_, body) = send(&h.app, req).await;
    assert_eq!(body["data"]["tenant_id"], "acme");
    assert_eq!(body["data"]["source"], "subdomain");
}

#[tokio::test]
async fn registry_routes_require_admin() {
    let h = harness(TenancyConfig::default());
    let req = get("/tenants").header("X-User", "bob").body(Body::empty()).unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn admin_manages_registry() {
    let h = harness(TenancyConfig::default());
    let create = Request::builder()
        .method("POST")
        .uri("/tenants")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .header("content-type", "application/json")
        .body(Body::from(json!({"tenant_id": "acme", "tenant_name": "Acme Corp"}).to_string()))
        .unwrap();
    let (status, body) = send(&h.app, create).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tenant_id"], "acme");
    assert_eq!(body["data"]["is_active"], true);

    let dup = Request::builder()
        .method("POST")
        .uri("/tenants")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .header("content-type", "application/json")
        .body(Body::from(json!({"tenant_id": "acme", "tenant_name": "Again"}).to_string()))
        .unwrap();
    let (status, _) = send(&h.app, dup).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let deactivate = Request::builder()
        .method("DELETE")
        .uri("/tenants/acme")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, deactivate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
    assert!(!h.directory.is_active("acme").await.unwrap());

    let list = get("/tenants?active_only=true")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&h.app, list).await;
    assert_eq!(body["meta"]["count"], 0);
}

#[tokio::test]
async fn unknown_tenant_record_is_not_found() {
    let h = harness(TenancyConfig::default());
    h.directory.create(NewTenant::named("globex", "Globex"), None).await.unwrap();
    let req = get("/tenants/initech")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let req = get("/tenants/globex")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenant_name"], "Globex");
}

#[tokio::test]
async fn cache_invalidation_reports_removed_entries() {
    let h = harness(TenancyConfig::default());
    let req = Request::builder()
        .method("DELETE")
        .uri("/tenants/acme/cache")
        .header("X-User", "root")
        .header("X-Role", "admin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tenant_id"], "acme");
    assert_eq!(body["data"]["removed"], 0);
}
