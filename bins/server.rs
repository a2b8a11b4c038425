use std::process::ExitCode;

use common::{init_logging, LogFormat};
use configs::AppConfig;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Config file if it validates, otherwise defaults plus `STORAGE_*` overrides.
fn load_config() -> Result<(AppConfig, Option<String>), String> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok((cfg, None)),
        Err(first) => AppConfig::load_or_default()
            .map(|cfg| (cfg, Some(first.to_string())))
            .map_err(|e| e.to_string()),
    }
}

fn main() -> ExitCode {
    // RUST_LOG, CONFIG_PATH and STORAGE_* may come from .env
    dotenv().ok();

    let (cfg, fallback_reason) = match load_config() {
        Ok(loaded) => loaded,
        Err(reason) => {
            eprintln!("invalid configuration: {reason}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(LogFormat::from_json_flag(cfg.logging.json));
    if let Some(reason) = fallback_reason {
        warn!(%reason, "config file unusable, continuing with defaults");
    }

    let instance = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |panic| {
        error!(%instance, message = %panic, "panic");
    }));

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(threads) = cfg.server.worker_threads {
        runtime.worker_threads(threads);
    }
    let runtime = match runtime.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "cannot build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        %instance,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %cfg.storage.data_dir,
        "starting"
    );

    match runtime.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(%instance, "stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%instance, error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}
