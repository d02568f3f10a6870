use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use tracing::warn;

/// Name of the cookie carrying the identity token.
pub const TOKEN_COOKIE: &str = "token";

/// Returns the identity token sent by the client, if any.
pub fn read_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Attaches a `Set-Cookie` for a freshly minted token.
pub fn attach_token(mut response: Response, token: Option<&str>) -> Response {
    let Some(token) = token else {
        return response;
    };

    match HeaderValue::from_str(&format!("{TOKEN_COOKIE}={token}; Path=/; HttpOnly")) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "minted token is not a valid cookie value"),
    }
    response
}
