use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::error::AppError;
use crate::pdf;
use crate::qr;
use crate::registry::Registry;
use crate::session::{self, AttemptOutcome, SESSION_COOKIE};
use crate::verify::{self, VerificationResult, VerifiedCertificate};

/// Shared state handed to every request handler
pub struct AppState {
    /// Read-only view of the certificate table
    pub registry: Registry,

    /// Runtime configuration
    pub config: Config,
}

#[derive(Deserialize)]
struct VerifyQuery {
    id: String,
}

/// Start the verification web server
///
/// Builds the application state from the configuration, wires up the router
/// and serves it until the process is stopped.
///
/// # Arguments
/// * `config` - Runtime configuration (bind address, record table, budgets)
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Only returns on bind/serve
///   failure
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new(&config.records_path, config.refresh_interval);
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState { registry, config });
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/verify", get(verify_certificate))
        .route("/api/qr/:id", get(qr_code))
        .route("/api/pdf/:id", get(pdf_confirmation))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

/// `GET /api/verify?id=…` — the verification form's lookup endpoint
///
/// Charges one attempt against the visitor's session budget (every lookup
/// counts, found or not), then runs the matcher against the current record
/// snapshot. An unknown id is a normal `found: false` answer; only invalid
/// input, an exhausted budget and data/upstream problems become errors.
async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<VerifyQuery>,
) -> Result<(CookieJar, Json<VerificationResult>), AppError> {
    let (jar, session_id) = ensure_session(jar);

    match session::register_attempt(
        &session_id,
        state.config.max_attempts,
        state.config.attempt_window,
    ) {
        AttemptOutcome::Exhausted { retry_after_secs } => {
            log::warn!(
                "session {} exhausted its attempt budget, retry in {}s",
                session_id,
                retry_after_secs
            );
            return Err(AppError::TooManyAttempts);
        }
        AttemptOutcome::Allowed { remaining } => {
            log::debug!("session {} has {} attempts left", session_id, remaining);
        }
    }

    let records = state.registry.records()?;
    let today = Local::now().date_naive();
    let result = verify::verify(&query.id, records.iter(), today)?;

    if !result.found {
        log::info!("no record for query \"{}\"", query.id);
    }

    Ok((jar, Json(result)))
}

/// `GET /api/qr/{id}` — scannable code for a verified certificate
async fn qr_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cert = lookup_certificate(&state, &id)?;
    let png = qr::png(&qr::payload(&cert))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// `GET /api/pdf/{id}` — downloadable confirmation sheet
async fn pdf_confirmation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cert = lookup_certificate(&state, &id)?;
    let bytes = pdf::create_confirmation(&cert)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    pdf::confirmation_filename(&cert.id)
                ),
            ),
        ],
        bytes,
    ))
}

// Shared lookup for the QR/PDF endpoints; these require an id that already
// verified, so "not found" is a 404 here rather than a form answer.
fn lookup_certificate(state: &AppState, id: &str) -> Result<VerifiedCertificate, AppError> {
    let records = state.registry.records()?;
    let today = Local::now().date_naive();
    let result = verify::verify(id, records.iter(), today)?;

    result.certificate.ok_or(AppError::NotFound)
}

// Reuse the visitor's session cookie or mint a new one.
fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }

    let id = session::new_session_id();
    let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
        .path("/")
        .http_only(true)
        .build();

    (jar.add(cookie), id)
}
