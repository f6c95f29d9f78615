use crate::verify::VerifyError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors a request handler can surface to the client
///
/// The verification core distinguishes invalid input, not-found and data
/// errors; this type adds the conditions only the web layer knows about
/// (attempt budget, upstream fetch failure) and maps everything onto HTTP.
#[derive(Error, Debug)]
pub enum AppError {
    /// Query rejected before lookup
    #[error("certificate number must contain 1 to 20 letters or digits")]
    InvalidInput,

    /// Attempt budget for this session is spent
    #[error("too many verification attempts, please try again later")]
    TooManyAttempts,

    /// A matched record holds data the application cannot interpret
    #[error("certificate data could not be read, please contact the issuer")]
    DataIntegrity,

    /// PDF/QR requested for an id no record matches
    #[error("certificate not found")]
    NotFound,

    /// Record table unreachable, rendering failed, and similar
    #[error("verification is temporarily unavailable")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::InvalidInput => AppError::InvalidInput,
            VerifyError::DataIntegrity { id, reason } => {
                log::error!("data integrity problem in record \"{}\": {}", id, reason);
                AppError::DataIntegrity
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::DataIntegrity | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Internal(ref source) = self {
            log::error!("internal error: {}", source);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
