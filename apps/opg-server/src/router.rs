use std::mem;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};

use crate::{api, AppState};

pub(crate) mod paths {
    pub const HEALTH: &str = "/health";
    pub const INVERT: &str = "/invert";
    pub const INVERT_LEGACY: &str = "/api/invert";
    pub const CHAT_WS: &str = "/ws/chat";
    pub const SESSION: &str = "/sessions/{session_id}";
}

pub(crate) struct RouterBuilder {
    router: Router<AppState>,
    endpoints: Vec<String>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    fn record(&mut self, method: &str, path: &'static str) {
        self.endpoints.push(format!("{} {}", method, path));
    }

    pub fn route_get<H, T>(&mut self, path: &'static str, handler: H) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: 'static,
    {
        self.record("GET", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, get(handler));
        self
    }

    pub fn route_post<H, T>(&mut self, path: &'static str, handler: H) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: 'static,
    {
        self.record("POST", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, post(handler));
        self
    }

    pub fn build(self) -> (Router<AppState>, Vec<String>) {
        (self.router, self.endpoints)
    }
}

/// Routes plus the `METHOD path` index used for startup logging.
pub(crate) fn build_router() -> (Router<AppState>, Vec<String>) {
    let mut builder = RouterBuilder::new();
    builder
        .route_get(paths::HEALTH, api::meta::health)
        .route_post(paths::INVERT, api::invert::invert)
        .route_post(paths::INVERT_LEGACY, api::invert::invert_legacy)
        .route_get(paths::CHAT_WS, api::chat::chat_ws)
        .route_get(paths::SESSION, api::sessions::session_history);
    builder.build()
}
