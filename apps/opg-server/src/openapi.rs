use utoipa::{OpenApi, ToSchema};

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct HealthOk {
    #[schema(example = "ok")]
    pub status: String,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ProblemDetails {
    #[schema(example = "about:blank")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "OppositeGPT", description = "Semantic inversion service"),
    paths(
        crate::api::meta::health,
        crate::api::invert::invert,
        crate::api::invert::invert_legacy,
        crate::api::sessions::session_history,
        crate::api::chat::chat_ws,
    ),
    components(schemas(
        HealthOk,
        ProblemDetails,
        crate::api::invert::InvertReq,
        crate::api::invert::InvertResp,
        crate::api::invert::LegacyInvertResp,
        crate::sessions::Role,
        crate::sessions::TurnRecord,
        crate::sessions::SessionSnapshot,
    )),
    tags(
        (name = "Meta", description = "Service probes"),
        (name = "Inversion", description = "One-shot inversion"),
        (name = "Chat", description = "Persistent chat channel and history"),
    )
)]
pub struct ApiDoc;
