use thiserror::Error;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] praetor_service::error::ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] praetor_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] praetor_core::error::CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Writes a status code and a JSON error body.
pub fn render_error(res: &mut salvo::Response, status: salvo::http::StatusCode, message: &str) {
    res.status_code(status);
    res.render(salvo::writing::Json(ErrorResponse {
        error: message.to_string(),
    }));
}
