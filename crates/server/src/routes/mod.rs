use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use modelsnip_engine::{build_glb, ModelSession};
use serde_json::{json, Value};
use shared::{CompileRequest, CompileResponse, Diagnostic, EXAMPLE_SNIPPET, PROMPT_TEMPLATE};
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ModelSession>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/prompt", get(prompt))
        .route("/api/example", get(example))
        .route("/api/compile", post(compile))
        .route("/api/model", get(model))
        .route("/api/model.glb", get(model_glb))
        .route("/api/stats", get(stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Prompt template for an external code generator
pub async fn prompt() -> Json<Value> {
    Json(json!({ "prompt": PROMPT_TEMPLATE }))
}

pub async fn example() -> Json<Value> {
    Json(json!({ "snippet": EXAMPLE_SNIPPET }))
}

/// Snippet → replace the current model
pub async fn compile(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> (StatusCode, Json<CompileResponse>) {
    let session = Arc::clone(&state.session);
    let outcome =
        tokio::task::spawn_blocking(move || session.replace_summary(&request.snippet)).await;

    match outcome {
        Ok(Ok(model)) => (StatusCode::OK, Json(CompileResponse::Ok { model })),
        Ok(Err(diagnostic)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(CompileResponse::Error { diagnostic }),
        ),
        Err(e) => {
            tracing::error!("Compile task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CompileResponse::Error {
                    diagnostic: Diagnostic::execute("internal error", None),
                }),
            )
        }
    }
}

/// Summary of the current model
pub async fn model(State(state): State<AppState>) -> Response {
    match state.session.summary() {
        Some(summary) => Json(summary).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "no model" }))).into_response(),
    }
}

/// Current model → GLB binary
pub async fn model_glb(State(state): State<AppState>) -> Response {
    let Some(glb_bytes) = state.session.with_model(build_glb) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "no model" }))).into_response();
    };

    (
        [
            (header::CONTENT_TYPE, "model/gltf-binary"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"model.glb\""),
        ],
        Body::from(glb_bytes),
    )
        .into_response()
}

pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.session.stats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use modelsnip_engine::{fixtures, EngineConfig};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState {
            session: Arc::new(ModelSession::new(EngineConfig::default())),
        })
    }

    fn post_snippet(snippet: &str) -> Request<Body> {
        let body = serde_json::to_vec(&CompileRequest {
            snippet: snippet.to_string(),
        })
        .unwrap();
        Request::post("/api/compile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_compile_ok_then_fetch_model() {
        let app = app();
        let response = app.clone().oneshot(post_snippet(fixtures::COLORED_BOX)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"]["part_count"], 1);

        let response = app
            .clone()
            .oneshot(Request::get("/api/model.glb").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
    }

    #[tokio::test]
    async fn test_compile_error_is_unprocessable() {
        let app = app();
        let response = app.clone().oneshot(post_snippet(fixtures::UNBALANCED)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["diagnostic"]["stage"], "compile");

        let response = app
            .oneshot(Request::get("/api/model").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_compiles_get_their_own_summary() {
        let app = app();
        let spheres = fixtures::stacked_spheres(3, 8);
        let requests: Vec<_> = (0..16)
            .map(|i| {
                let app = app.clone();
                let snippet = match i % 3 {
                    0 => fixtures::COLORED_BOX.to_string(),
                    1 => spheres.clone(),
                    _ => fixtures::NEGATIVE_SIZE.to_string(),
                };
                tokio::spawn(async move {
                    let response = app.oneshot(post_snippet(&snippet)).await.unwrap();
                    (i % 3, response.status(), json_body(response).await)
                })
            })
            .collect();

        for request in requests {
            let (kind, status, body) = request.await.unwrap();
            match kind {
                0 => {
                    assert_eq!(status, StatusCode::OK);
                    assert_eq!(body["model"]["part_count"], 1);
                }
                1 => {
                    assert_eq!(status, StatusCode::OK);
                    assert_eq!(body["model"]["part_count"], 3);
                }
                _ => {
                    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                    assert_eq!(body["diagnostic"]["stage"], "execute");
                }
            }
        }
    }
}
