use std::sync::Arc;

use anyhow::Context as _;
use axum::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    access_log,
    app_state::AppState,
    config::Settings,
    generate::{Generator, OllamaGenerator},
    router::build_router,
};

/// Build shared state for the configured Ollama backend.
pub(crate) fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let generator = OllamaGenerator::new(&settings.ollama_url)
        .context("failed to build HTTP client for the generation backend")?;
    info!(
        endpoint = generator.endpoint(),
        model = %settings.default_model,
        persona = %settings.persona,
        timeout_secs = settings.generation_timeout.map(|d| d.as_secs()),
        "generation backend configured"
    );
    let generator: Arc<dyn Generator> = Arc::new(generator);
    Ok(AppState::builder(generator)
        .with_persona(settings.persona)
        .with_generation_timeout(settings.generation_timeout)
        .with_default_model(settings.default_model.clone())
        .build())
}

/// Routes with state attached, before transport layers.
pub(crate) fn app(state: AppState) -> axum::Router<()> {
    let (router, endpoints) = build_router();
    info!(
        persona = %state.inversion().persona(),
        timeout_secs = state.inversion().timeout().map(|d| d.as_secs()),
        endpoints = ?endpoints,
        "routes registered"
    );
    router.with_state::<()>(state)
}

pub(crate) fn attach_http_layers(
    router: axum::Router<()>,
    concurrency_limit: usize,
) -> axum::Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::trace::TraceLayer;

    router
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
        .layer(axum::middleware::from_fn(access_log::access_log_mw))
}

/// Any origin, method and header; browser clients are served from other ports.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("content-type")])
}

pub(crate) fn ensure_openapi_export() -> Result<Option<String>, std::io::Error> {
    if let Ok(path) = std::env::var("OPENAPI_OUT") {
        export_openapi(&path)?;
        return Ok(Some(path));
    }
    Ok(None)
}

fn export_openapi(path: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let yaml = crate::openapi::ApiDoc::openapi()
        .to_yaml()
        .map_err(std::io::Error::other)?;
    std::fs::write(path, yaml)
}
