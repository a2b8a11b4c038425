use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::campaign::CampaignData;
use service::rpc::MacroRegistry;

pub mod campaign;
pub mod rpc;

/// Shared handler state: the macro registry and the campaign facade over one store.
#[derive(Clone)]
pub struct AppState {
    pub registry: MacroRegistry,
    pub campaign: CampaignData,
}

impl AppState {
    pub fn new(registry: MacroRegistry) -> Self {
        let campaign = CampaignData::new(registry.store().clone());
        Self { registry, campaign }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    match service::metrics::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Request bodies may be up to twice the catalog bound, so a payload that
/// only grows past the bound through JSON framing or whitespace still reaches
/// the store and gets a soft `false` instead of a transport 413.
pub fn request_body_limit(max_catalog_bytes: usize) -> usize {
    max_catalog_bytes.saturating_mul(2).max(64 * 1024)
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let body_limit = DefaultBodyLimit::max(request_body_limit(state.registry.store().max_catalog_bytes()));

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let rpc_routes = Router::new()
        .route("/rpc", get(rpc::list_operations))
        .route("/rpc/:name", post(rpc::call_operation))
        .layer(body_limit.clone());

    let campaign_routes = Router::new()
        .route("/api/campaign", get(campaign::load_all).put(campaign::save_all))
        .route("/api/campaign/:section", get(campaign::load_section).put(campaign::save_section))
        .layer(body_limit);

    public
        .merge(rpc_routes)
        .merge(campaign_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use service::rpc::FunctionTable;
    use service::storage::backend::MemoryBackend;
    use service::storage::{CatalogStore, FixedNamespace};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = CatalogStore::new(Arc::new(MemoryBackend::new()), Arc::new(FixedNamespace::new("routes")));
        let registry = MacroRegistry::new(Arc::new(store), FunctionTable::with_builtins());
        build_router(AppState::new(registry), CorsLayer::permissive())
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let res = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn rpc_call_wraps_result() {
        let req = Request::builder()
            .method("POST")
            .uri("/rpc/db.getObject")
            .body(Body::from(r#"["party", "1", "fallback"]"#))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"result": "fallback"}));
    }

    #[test]
    fn body_limit_leaves_room_above_the_catalog_bound() {
        assert_eq!(request_body_limit(10 * 1024 * 1024), 20 * 1024 * 1024);
        assert_eq!(request_body_limit(16), 64 * 1024);
        assert_eq!(request_body_limit(usize::MAX), usize::MAX);
    }

    #[tokio::test]
    async fn large_catalog_below_the_bound_is_accepted() {
        let blob = "x".repeat(3 * 1024 * 1024);
        let body = serde_json::to_vec(&json!(["big", {"blob": blob}])).unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/rpc/db.setCatalog")
            .body(Body::from(body))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"result": true}));
    }

    #[tokio::test]
    async fn unknown_section_is_not_found() {
        let res = app()
            .oneshot(Request::builder().uri("/api/campaign/tavern").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
