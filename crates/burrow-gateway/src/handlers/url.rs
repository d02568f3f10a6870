use crate::cookie::{attach_token, read_token};
use crate::error::Result;
use crate::model::{BatchRequestItem, BatchResponseItem, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use burrow_shortener::ShortenOutcome;

fn status_for(outcome: ShortenOutcome) -> StatusCode {
    match outcome {
        ShortenOutcome::Created => StatusCode::CREATED,
        ShortenOutcome::Existing => StatusCode::CONFLICT,
    }
}

/// `POST /` with the URL as a plain text body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response> {
    let shortened = state
        .shortener()
        .shorten(body.trim(), read_token(&headers))
        .await?;

    let response = (
        status_for(shortened.value.outcome),
        shortened.value.short_url,
    )
        .into_response();
    Ok(attach_token(response, shortened.issued_token.as_deref()))
}

pub async fn shorten_json_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;
    let shortened = state
        .shortener()
        .shorten(&request.url, read_token(&headers))
        .await?;

    let response = (
        status_for(shortened.value.outcome),
        Json(ShortenResponse {
            result: shortened.value.short_url,
        }),
    )
        .into_response();
    Ok(attach_token(response, shortened.issued_token.as_deref()))
}

pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<Vec<BatchRequestItem>>, JsonRejection>,
) -> Result<Response> {
    let Json(items) = payload?;
    let shortened = state
        .shortener()
        .shorten_batch(
            items.into_iter().map(Into::into).collect(),
            read_token(&headers),
        )
        .await?;

    let status = if shortened
        .value
        .iter()
        .any(|item| item.outcome == ShortenOutcome::Existing)
    {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };
    let body: Vec<BatchResponseItem> = shortened.value.into_iter().map(Into::into).collect();

    let response = (status, Json(body)).into_response();
    Ok(attach_token(response, shortened.issued_token.as_deref()))
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Redirect> {
    let original_url = state.shortener().resolve(&code).await?;
    Ok(Redirect::temporary(&original_url))
}
