use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;

#[derive(Clone, Debug)]
struct Cfg {
    enabled: bool,
    sample_n: u64,
    trust_forward: bool,
}

static CFG: Lazy<Cfg> = Lazy::new(|| Cfg {
    enabled: std::env::var("OPG_ACCESS_LOG").ok().as_deref() == Some("1"),
    sample_n: std::env::var("OPG_ACCESS_SAMPLE_N")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
        .max(1),
    trust_forward: std::env::var("OPG_TRUST_FORWARD_HEADERS").ok().as_deref() == Some("1"),
});

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn first_forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let ip = raw.split(',').next().unwrap_or("").trim();
    (!ip.is_empty()).then(|| ip.to_string())
}

pub async fn access_log_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    if !CFG.enabled {
        return next.run(req).await;
    }
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    if n % CFG.sample_n != 0 {
        return next.run(req).await;
    }
    let started = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let forwarded = if CFG.trust_forward {
        first_forwarded_ip(req.headers())
    } else {
        None
    };
    let remote = forwarded.or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
    });

    let resp = next.run(req).await;
    let status = resp.status().as_u16();
    let dt_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        target: opg_otel::ACCESS_TARGET,
        method = %method,
        path = %path,
        status,
        dt_ms,
        remote = remote.as_deref().unwrap_or("-"),
        "request served"
    );
    resp
}
