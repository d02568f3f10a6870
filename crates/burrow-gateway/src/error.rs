use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burrow_shortener::ShortenerError;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Shortener(ShortenerError),
    /// The request body could not be decoded.
    Body(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Body(_) => StatusCode::BAD_REQUEST,
            AppError::Shortener(err) => match err {
                ShortenerError::NotFound(_)
                | ShortenerError::InvalidUrl(_)
                | ShortenerError::BadRequest(_) => StatusCode::BAD_REQUEST,
                ShortenerError::Deleted(_) => StatusCode::GONE,
                ShortenerError::Unauthorized => StatusCode::UNAUTHORIZED,
                ShortenerError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
                ShortenerError::Storage(_) | ShortenerError::Identity(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Body(msg) => msg.clone(),
            AppError::Shortener(err) => err.to_string(),
        }
    }
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        AppError::Shortener(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Body(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %message, "request rejected");
        }

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_core::StorageError;

    #[test]
    fn maps_shortener_errors_to_status() {
        let cases = [
            (ShortenerError::NotFound("x".into()), StatusCode::BAD_REQUEST),
            (ShortenerError::Deleted("x".into()), StatusCode::GONE),
            (ShortenerError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ShortenerError::InvalidUrl("x".into()), StatusCode::BAD_REQUEST),
            (
                ShortenerError::Storage(StorageError::Io("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
