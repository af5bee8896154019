use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use bliss_responder::Responder;

/// Shared application state for API handlers.
pub struct AppState {
    pub responder: Arc<Responder>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/greeting", get(greeting))
        .route("/api/farewell", get(farewell))
        .route("/api/personas", get(personas))
        .route("/api/persona/{name}", get(persona_info))
        .route("/api/session/{id}/count", get(session_count))
        .route("/api/session/{id}/clear", post(clear_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn default_name() -> String {
    "default".to_string()
}

fn default_context_limit() -> usize {
    5
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bliss",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Deserialize)]
struct ChatBody {
    message: String,
    #[serde(default = "default_name")]
    persona: String,
    #[serde(default = "default_name")]
    session: String,
    #[serde(default = "default_context_limit")]
    context_limit: usize,
}

/// Generate a reply and store the turn.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> Result<Json<Value>, StatusCode> {
    match state
        .responder
        .generate(&body.message, &body.persona, &body.session, body.context_limit)
        .await
    {
        Ok(reply) => Ok(Json(json!({ "reply": reply, "session": body.session }))),
        Err(e) => {
            tracing::error!(error = %e, "failed to generate reply");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize)]
struct PersonaQuery {
    #[serde(default = "default_name")]
    persona: String,
}

async fn greeting(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonaQuery>,
) -> Json<Value> {
    Json(json!({ "greeting": state.responder.greeting(&query.persona) }))
}

async fn farewell(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PersonaQuery>,
) -> Json<Value> {
    Json(json!({ "farewell": state.responder.farewell(&query.persona) }))
}

/// List available persona names.
async fn personas(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "personas": state.responder.list_personas() }))
}

/// Summary of the named persona (after fallback resolution).
async fn persona_info(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let info = state.responder.persona_info(&name);
    serde_json::to_value(info)
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn session_count(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.responder.conversation_count(&id).await {
        Ok(count) => Ok(Json(json!({ "session": id, "count": count }))),
        Err(e) => {
            tracing::error!(error = %e, "failed to count session turns");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.responder.clear_session(&id).await {
        Ok(removed) => Ok(Json(json!({ "session": id, "cleared": removed }))),
        Err(e) => {
            tracing::error!(error = %e, "failed to clear session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
