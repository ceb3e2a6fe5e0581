/// API route handlers, one module per resource
///
/// - `health`: liveness and database check
/// - `auth`: register, login, refresh, current user
/// - `profiles`, `follows`: public profiles and the follow graph
/// - `categories`, `courses`, `interactions`: course catalogue and engagement
/// - `forum`, `trails`: community features
/// - `moderation`, `admin`: guarded staff areas

pub mod admin;
pub mod auth;
pub mod categories;
pub mod courses;
pub mod follows;
pub mod forum;
pub mod health;
pub mod interactions;
pub mod moderation;
pub mod profiles;
pub mod trails;

use crate::error::{ApiError, ApiResult};
use serde::{de::DeserializeOwned, Deserialize};
use std::borrow::Cow;
use validator::ValidationError;

/// `?limit=&offset=` query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamped to the model layer's page bounds
    pub fn bounds(&self) -> (i64, i64) {
        coursehub_shared::models::course::clamp_page(self.limit, self.offset)
    }
}

/// Parses a JSON body that callers may leave out
///
/// An empty (or all-whitespace) body yields `T::default()`; anything else
/// must be valid JSON for `T`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Rejects text that is only whitespace
pub(crate) fn non_blank(value: &str) -> Result<(), ValidationError> {
    if !value.trim().is_empty() {
        return Ok(());
    }
    let mut error = ValidationError::new("blank");
    error.message = Some(Cow::Borrowed("Must not be blank"));
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamp() {
        let page: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(page.bounds(), (20, 0));

        let page = Pagination { limit: 0, offset: -5 };
        assert_eq!(page.bounds(), (1, 0));
    }

    #[test]
    fn test_non_blank() {
        assert!(non_blank("hello").is_ok());
        assert_eq!(non_blank(" \t\n").unwrap_err().code, "blank");
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Note {
        reason: Option<String>,
    }

    #[test]
    fn test_optional_json() {
        assert_eq!(optional_json::<Note>(b"").unwrap(), Note::default());
        assert_eq!(optional_json::<Note>(b" \n").unwrap(), Note::default());
        assert_eq!(
            optional_json::<Note>(br#"{"reason": "dup"}"#).unwrap().reason.as_deref(),
            Some("dup")
        );
        assert!(matches!(
            optional_json::<Note>(br#"{"reason": "#),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            optional_json::<Note>(br#"{"reason": 42}"#),
            Err(ApiError::BadRequest(_))
        ));
    }
}
