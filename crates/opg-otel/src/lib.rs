use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used by the HTTP access-log middleware.
pub const ACCESS_TARGET: &str = "http.access";

static ACCESS_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install_console(filter);
}

fn install_console(filter: EnvFilter) {
    let fmt_layer = fmt::layer();
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    match access_log_settings() {
        Some(settings) => {
            if std::fs::create_dir_all(&settings.dir).is_err() {
                tracing::warn!(directory = %settings.dir, "failed to create access log directory");
            }
            let writer = match settings.rotation {
                Rotation::Hourly => tracing_appender::rolling::hourly(&settings.dir, &settings.prefix),
                Rotation::Minutely => {
                    tracing_appender::rolling::minutely(&settings.dir, &settings.prefix)
                }
                Rotation::Daily => tracing_appender::rolling::daily(&settings.dir, &settings.prefix),
            };
            let (nb, guard) = tracing_appender::non_blocking(writer);
            let _ = ACCESS_GUARD.set(guard);
            let targets = Targets::new().with_target(ACCESS_TARGET, tracing::Level::INFO);
            let access_layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(nb)
                .with_filter(targets);
            let _ = registry.with(access_layer).try_init();
        }
        None => {
            let _ = registry.try_init();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Hourly,
    Minutely,
    Daily,
}

impl Rotation {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AccessLogSettings {
    dir: String,
    prefix: String,
    rotation: Rotation,
}

fn access_log_settings() -> Option<AccessLogSettings> {
    if std::env::var("OPG_ACCESS_LOG_ROLL").ok().as_deref() != Some("1") {
        return None;
    }
    let dir = std::env::var("OPG_ACCESS_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let prefix = std::env::var("OPG_ACCESS_LOG_PREFIX").unwrap_or_else(|_| "http-access".into());
    let rotation = std::env::var("OPG_ACCESS_LOG_ROTATION")
        .map(|v| Rotation::parse(&v))
        .unwrap_or(Rotation::Daily);
    Some(AccessLogSettings {
        dir,
        prefix,
        rotation,
    })
}
