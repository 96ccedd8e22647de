use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use clarity_core::auth::{AuthError, IdentityGateway, SessionConfig};
use clarity_core::generate::{ChecklistGenerator, GenerationError, InferenceClient};
use clarity_core::store::{ChecklistStore, StoreError, toggle_item};
use clarity_db::models::{ChecklistItem, User};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
            details: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
            details: None,
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
            details: None,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
            details: None,
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
            details: Some(format!("{err:#}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = match self.details {
            Some(details) => {
                serde_json::json!({ "error": self.message, "details": details })
            }
            None => serde_json::json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyInUse => Self::conflict("email-already-in-use"),
            AuthError::InvalidCredential => Self::unauthorized("invalid-credential"),
            AuthError::InvalidEmail => Self::unprocessable("email address is not valid"),
            AuthError::WeakPassword => Self::unprocessable(err.to_string()),
            AuthError::Other(inner) => Self::internal(inner),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::EmptyInput => Self::unprocessable("rawInput must not be empty"),
            // All inference-side failures are server errors from the
            // client's point of view; the caller may resubmit.
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "inference failed".to_string(),
                details: Some(other.to_string()),
            },
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let StoreError::Unavailable(inner) = err;
        Self::internal(inner)
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub gateway: IdentityGateway,
    pub store: ChecklistStore,
    pub generator: Arc<ChecklistGenerator<Arc<dyn InferenceClient>>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        sessions: SessionConfig,
        inference: Arc<dyn InferenceClient>,
    ) -> Self {
        Self {
            gateway: IdentityGateway::new(pool.clone(), sessions),
            store: ChecklistStore::new(pool),
            generator: Arc::new(ChecklistGenerator::new(inference)),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// The authenticated user behind a `Bearer` token. Rejects with 401 when the
/// header is missing, malformed, or the token does not validate.
pub struct AuthSession(pub User);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("expected a bearer token"))?;

        let user = state.gateway.authenticate(token).await?;
        Ok(AuthSession(user))
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ClarityRequest {
    #[serde(rename = "rawInput")]
    pub raw_input: String,
}

#[derive(Debug, Serialize)]
pub struct ClarityResponse {
    pub output: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChecklistResponse {
    pub checklist: Vec<ChecklistItem>,
    /// Unix millis of the last write.
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct SaveChecklistRequest {
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/clarity", post(clarity))
        .route("/api/checklist", get(get_checklist))
        .route("/api/checklist", put(save_checklist))
        .route("/api/checklist", delete(clear_checklist))
        .route("/api/checklist/toggle", post(toggle_checklist_item))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("clarity serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("clarity serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\
<html><head><title>clarity</title></head><body>\
<h1>clarity</h1>\
<p>Turns messy thoughts into a checklist.</p>\
<ul>\
<li>POST /api/auth/signup</li>\
<li>POST /api/auth/login</li>\
<li>POST /api/auth/logout</li>\
<li>POST /api/clarity</li>\
<li>GET/PUT/DELETE /api/checklist</li>\
<li>POST /api/checklist/toggle</li>\
</ul>\
</body></html>",
    )
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<axum::response::Response, AppError> {
    let session = state.gateway.signup(&req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: session.user,
            token: session.token,
        }),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<axum::response::Response, AppError> {
    let session = state.gateway.login(&req.email, &req.password).await?;
    Ok(Json(SessionResponse {
        user: session.user,
        token: session.token,
    })
    .into_response())
}

async fn logout(State(state): State<AppState>, _session: AuthSession) -> StatusCode {
    // The shared gateway's auth channel is process-wide here; access control
    // rests on per-request token validation, not on this publish.
    state.gateway.logout();
    StatusCode::NO_CONTENT
}

async fn clarity(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(req): Json<ClarityRequest>,
) -> Result<axum::response::Response, AppError> {
    let output = state.generator.generate(&req.raw_input).await?;
    Ok(Json(ClarityResponse { output }).into_response())
}

async fn get_checklist(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
) -> Result<axum::response::Response, AppError> {
    let doc = state
        .store
        .load(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("no checklist for this user"))?;

    Ok(Json(ChecklistResponse {
        timestamp: doc.updated_at.timestamp_millis(),
        checklist: doc.into_items(),
    })
    .into_response())
}

async fn save_checklist(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(req): Json<SaveChecklistRequest>,
) -> Result<axum::response::Response, AppError> {
    let doc = state.store.save(user.id, &req.checklist).await?;
    Ok(Json(ChecklistResponse {
        timestamp: doc.updated_at.timestamp_millis(),
        checklist: doc.into_items(),
    })
    .into_response())
}

async fn toggle_checklist_item(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(req): Json<ToggleRequest>,
) -> Result<axum::response::Response, AppError> {
    let doc = state
        .store
        .load(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("no checklist for this user"))?;

    let mut items = doc.into_items();
    if !toggle_item(&mut items, req.index) {
        return Err(AppError::unprocessable(format!(
            "index {} is out of bounds for a checklist of {} items",
            req.index,
            items.len()
        )));
    }

    let doc = state.store.save(user.id, &items).await?;
    Ok(Json(ChecklistResponse {
        timestamp: doc.updated_at.timestamp_millis(),
        checklist: doc.into_items(),
    })
    .into_response())
}

async fn clear_checklist(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
) -> Result<StatusCode, AppError> {
    // Deleting an absent checklist is still a success: the end state is the
    // same either way.
    state.store.clear(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
