use std::net::SocketAddr;

use tracing::{error, info, warn};

mod access_log;
mod api;
mod app_state;
mod bootstrap;
mod chat;
mod config;
mod generate;
mod http_client;
mod inversion;
mod openapi;
mod responses;
mod router;
mod sessions;
#[cfg(test)]
mod test_support;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() {
    match bootstrap::ensure_openapi_export() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(err) => {
            eprintln!("error: failed to write generated OPENAPI_OUT: {err}");
            std::process::exit(2);
        }
    }

    opg_otel::init();

    let settings = match config::load() {
        Ok(settings) => settings,
        Err(err) => {
            error!("invalid configuration: {err}");
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    let state = match bootstrap::build_state(&settings) {
        Ok(state) => state,
        Err(err) => {
            error!("failed to initialise service: {err:#}");
            std::process::exit(2);
        }
    };

    let app = bootstrap::attach_http_layers(bootstrap::app(state), settings.concurrency_limit);

    let listener = match tokio::net::TcpListener::bind(settings.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %settings.addr, "failed to bind server socket: {err}");
            std::process::exit(1);
        }
    };
    info!(
        addr = %settings.addr,
        config = settings.config_source.as_deref().unwrap_or("defaults"),
        "OppositeGPT listening"
    );

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!("http server exited with error: {err}");
    }
    info!("server stopped");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
