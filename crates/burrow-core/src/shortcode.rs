use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Path segment that identifies a stored URL.
///
/// Anything built through [`ShortCode::new`] is between [`ShortCode::MIN_LEN`]
/// and [`ShortCode::MAX_LEN`] bytes of `[a-zA-Z0-9_-]`, so it is always safe
/// to splice into a URL path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 32;

    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        check(&code)?;
        Ok(Self(code))
    }

    /// Wraps `code` as is. Generators call this for output they already
    /// know to be well formed.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parses the last path segment of a short URL.
    pub fn from_url(short_url: &str) -> Result<Self, CoreError> {
        let segment = short_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        Self::new(segment)
    }

    /// Joins the code onto `base_url`, tolerating a trailing slash.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check(code: &str) -> Result<(), CoreError> {
    let len = code.len();
    if !(ShortCode::MIN_LEN..=ShortCode::MAX_LEN).contains(&len) {
        return Err(CoreError::InvalidShortCode(format!(
            "{code:?} is {len} bytes, expected {}..={}",
            ShortCode::MIN_LEN,
            ShortCode::MAX_LEN
        )));
    }

    if let Some(bad) = code
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_'))
    {
        return Err(CoreError::InvalidShortCode(format!(
            "{code:?} contains {bad:?}"
        )));
    }

    Ok(())
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_codes_at_both_length_bounds() {
        assert!(ShortCode::new("a".repeat(ShortCode::MIN_LEN)).is_ok());
        assert!(ShortCode::new("z".repeat(ShortCode::MAX_LEN)).is_ok());
        assert!(ShortCode::new("Mixed-Case_09").is_ok());
    }

    #[test]
    fn rejects_codes_outside_length_bounds() {
        for code in [String::new(), "xy".to_string(), "q".repeat(ShortCode::MAX_LEN + 1)] {
            assert!(ShortCode::new(code.clone()).is_err(), "{code:?} was accepted");
        }
    }

    #[test]
    fn rejects_path_and_query_characters() {
        for code in ["ab/cd", "ab?cd", "ab#cd", "ab cd", "ab%20", "caf\u{e9}"] {
            let err = ShortCode::new(code).unwrap_err();
            assert!(matches!(err, CoreError::InvalidShortCode(_)));
        }
    }

    #[test]
    fn joins_onto_base_with_or_without_slash() {
        let code = ShortCode::new("EwHXdJfB").unwrap();
        for base in ["https://sho.rt", "https://sho.rt/"] {
            assert_eq!(code.to_url(base), "https://sho.rt/EwHXdJfB");
        }
    }

    #[test]
    fn short_url_round_trips_to_its_code() {
        let code = ShortCode::new("EwHXdJfB").unwrap();
        let parsed = ShortCode::from_url(&code.to_url("http://localhost:8080")).unwrap();
        assert_eq!(parsed, code);

        assert!(ShortCode::from_url("http://localhost:8080/").is_err());
    }
}
