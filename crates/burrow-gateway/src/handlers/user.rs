use crate::cookie::{attach_token, read_token};
use crate::error::Result;
use crate::model::UserUrlResponse;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    let listed = state
        .shortener()
        .list_user_urls(read_token(&headers))
        .await?;

    let response = if listed.value.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let body: Vec<UserUrlResponse> = listed.value.into_iter().map(Into::into).collect();
        Json(body).into_response()
    };
    Ok(attach_token(response, listed.issued_token.as_deref()))
}

/// Accepts a JSON array of short codes and queues their deletion.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Vec<String>>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(codes) = payload?;
    state
        .shortener()
        .delete_user_urls(read_token(&headers), codes)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
