use axum::extract::{rejection::JsonRejection, State};
use axum::response::Response;
use axum::Json;
use opg_core::PROMPT_MAX_CHARS;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::inversion::MutationOptions;
use crate::{responses, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvertReq {
    /// Text to invert (1..=5000 characters).
    pub prompt: String,
    /// Per-word probability of reversing its characters.
    #[serde(default)]
    pub random_word_reversal: f64,
    /// Per-word probability of wrapping it in a language marker.
    #[serde(default)]
    pub random_language_swap: f64,
    /// Language codes to draw markers from.
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    /// Model identifier; defaults to the configured model.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt is {chars} characters; the limit is {limit}")]
    PromptTooLong { chars: usize, limit: usize },
    #[error("{field} must be between 0 and 1, got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
}

impl InvertReq {
    pub fn validate(&self) -> Result<(), RequestError> {
        let chars = self.prompt.chars().count();
        if chars == 0 {
            return Err(RequestError::EmptyPrompt);
        }
        if chars > PROMPT_MAX_CHARS {
            return Err(RequestError::PromptTooLong {
                chars,
                limit: PROMPT_MAX_CHARS,
            });
        }
        for (field, value) in [
            ("random_word_reversal", self.random_word_reversal),
            ("random_language_swap", self.random_language_swap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RequestError::ProbabilityOutOfRange { field, value });
            }
        }
        Ok(())
    }

    fn mutation_options(&self) -> MutationOptions {
        MutationOptions {
            word_reversal: self.random_word_reversal,
            language_swap: self.random_language_swap,
            languages: self.languages.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvertResp {
    pub original: String,
    pub inverted: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegacyInvertResp {
    pub original: String,
    pub inverted: String,
    /// Same as `inverted`.
    pub result: String,
}

async fn run_invert(
    state: &AppState,
    payload: Result<Json<InvertReq>, JsonRejection>,
) -> Result<InvertResp, Response> {
    let Json(req) = payload.map_err(responses::json_rejection)?;
    req.validate()
        .map_err(|err| responses::unprocessable(err.to_string()))?;
    let model = req
        .model
        .clone()
        .unwrap_or_else(|| state.default_model().to_string());
    let inverted = state
        .inversion()
        .invert(&req.prompt, &model, &req.mutation_options())
        .await
        .map_err(|err| responses::internal(format!("LLM error: {err}")))?;
    info!(
        target: "opg::invert",
        model = %model,
        chars_in = req.prompt.chars().count(),
        chars_out = inverted.chars().count(),
        "prompt inverted"
    );
    Ok(InvertResp {
        original: req.prompt,
        inverted,
    })
}

/// Invert a prompt in one request/response exchange.
#[utoipa::path(
    post,
    path = "/invert",
    tag = "Inversion",
    request_body = InvertReq,
    responses(
        (status = 200, description = "Inverted text", body = InvertResp),
        (status = 422, description = "Validation failed", body = crate::openapi::ProblemDetails),
        (status = 500, description = "Generation failed", body = crate::openapi::ProblemDetails)
    )
)]
pub async fn invert(
    State(state): State<AppState>,
    payload: Result<Json<InvertReq>, JsonRejection>,
) -> Response {
    match run_invert(&state, payload).await {
        Ok(resp) => responses::json_ok(resp),
        Err(resp) => resp,
    }
}

/// Browser-client alias of `/invert` that also reports the text as `result`.
#[utoipa::path(
    post,
    path = "/api/invert",
    tag = "Inversion",
    request_body = InvertReq,
    responses(
        (status = 200, description = "Inverted text", body = LegacyInvertResp),
        (status = 422, description = "Validation failed", body = crate::openapi::ProblemDetails),
        (status = 500, description = "Generation failed", body = crate::openapi::ProblemDetails)
    )
)]
pub async fn invert_legacy(
    State(state): State<AppState>,
    payload: Result<Json<InvertReq>, JsonRejection>,
) -> Response {
    match run_invert(&state, payload).await {
        Ok(resp) => responses::json_ok(LegacyInvertResp {
            result: resp.inverted.clone(),
            original: resp.original,
            inverted: resp.inverted,
        }),
        Err(resp) => resp,
    }
}
