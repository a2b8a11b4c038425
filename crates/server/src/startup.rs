use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::campaign;
use service::rpc::{FunctionTable, MacroRegistry};
use service::{runtime, storage};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Function table exposed to remote callers: built-ins plus campaign helpers.
pub fn default_functions() -> FunctionTable {
    let mut functions = FunctionTable::with_builtins();
    campaign::register_functions(&mut functions);
    functions
}

/// Construct the store described by `cfg` and wire the handler state around it.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    runtime::ensure_env(&cfg.storage).await?;
    let store = storage::build_store(&cfg.storage).await?;
    let registry = MacroRegistry::new(store, default_functions());
    info!(operations = registry.operations().len(), "macro registry ready");
    Ok(AppState::new(registry))
}

/// Build the router for an already-constructed state.
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Any(anyhow::anyhow!("cannot bind {addr}: {e}")))?;
    info!(%addr, namespace = %cfg.storage.namespace, backend = ?cfg.storage.backend, "catalog server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!("catalog server drained");
    Ok(())
}

/// Serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    run_until(cfg, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "127.0.0.1".into();
        cfg.server.port = 9090;
        assert_eq!(bind_addr(&cfg).unwrap().port(), 9090);

        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn default_functions_include_campaign_helpers() {
        let functions = default_functions();
        assert!(functions.predicate("always").is_ok());
        assert!(functions.predicate("campaign.wounded").is_ok());
        assert!(functions.transformer("campaign.longRest").is_ok());
    }
}
