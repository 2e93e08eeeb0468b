use hapag_farm::classifier::load_classifier_from_path;
use hapag_farm::config::{self, Config};
use hapag_farm::error::AppError;
use hapag_farm::provider::firebase::FirebaseProvider;
use hapag_farm::provider::spawn_refresh_thread;
use hapag_farm::recommend::RecommendationEngine;
use hapag_farm::recommend::model::ModelRecommender;
use hapag_farm::{api, state};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

fn init_tracing(level: &str) -> Result<(), AppError> {
    let level =
        tracing::Level::from_str(level.trim()).map_err(|_| AppError::LogLevel(level.to_string()))?;
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default().map_err(AppError::from)?;
    init_tracing(&config.logging.level)?;
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        app = %config.app.name,
        "hapag-farm starting"
    );

    let state = Arc::new(RwLock::new(state::AppState::new()));
    let engine = build_engine(&config);
    let provider = build_provider(&config);
    let has_provider = provider.is_some();

    match state.write() {
        Ok(mut guard) => {
            guard.set_engine(engine);
            if let Some(provider) = provider {
                guard.set_provider(provider);
            }
            guard.set_forecast_horizons(config.forecast_horizons());
        }
        Err(_) => return Err(AppError::StateLock.into()),
    }

    // Poll the datastore: latest snapshot and history into shared state
    let stop_flag = Arc::new(AtomicBool::new(false));
    let _refresh_handle = if has_provider {
        Some(spawn_refresh_thread(
            Arc::clone(&state),
            config.refresh_interval(),
            Arc::clone(&stop_flag),
        ))
    } else {
        tracing::warn!("Refresh thread not started - no datastore configured");
        None
    };

    let app = api::router(Arc::clone(&state));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    stop_flag.store(true, Ordering::Relaxed);

    Ok(())
}

/// Model-backed engine when the classifier artifact loads, expert rules otherwise.
fn build_engine(config: &Config) -> RecommendationEngine {
    let Some(path) = config.classifier_path() else {
        tracing::info!("No classifier path configured, using expert rules only");
        return RecommendationEngine::expert_only();
    };
    match load_classifier_from_path(path) {
        Ok(classifier) => {
            tracing::info!(path = %path.display(), "Crop classifier loaded");
            let model = ModelRecommender::new(Arc::from(classifier))
                .with_default_confidence(config.default_confidence());
            RecommendationEngine::new(model)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to load classifier, using expert rules only");
            RecommendationEngine::expert_only()
        }
    }
}

fn build_provider(config: &Config) -> Option<Arc<FirebaseProvider>> {
    let url = config.datastore_url()?;
    match FirebaseProvider::new(
        url,
        config.datastore_node(),
        config.datastore_timeout(),
        config.history_timeout(),
    ) {
        Ok(provider) => {
            tracing::info!(url = %provider.url(), "Datastore provider configured");
            Some(Arc::new(provider))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid datastore configuration");
            None
        }
    }
}
