use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result as StoreResult;

pub const DEFAULT_PAGE_SIZE: i32 = 50;
pub const DEFAULT_OFFSET_LIMIT: i64 = 20;
pub const MAX_OFFSET_LIMIT: i64 = 100;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// Cursor-paginated response for admin list endpoints
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            data,
            next_cursor,
            has_more,
        }
    }
}

/// Offset-paginated response for space and codebase listings
#[derive(Debug, Serialize)]
pub struct OffsetPage<T: Serialize> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub offset: i64,
    pub limit: i64,
    pub has_more: bool,
}

impl<T: Serialize> OffsetPage<T> {
    #[must_use]
    pub fn new(data: Vec<T>, total_count: i64, window: PageWindow) -> Self {
        let has_more = window.offset.saturating_add(data.len() as i64) < total_count;
        Self {
            data,
            total_count,
            offset: window.offset,
            limit: window.limit,
            has_more,
        }
    }
}

/// Raw `offset`/`limit` query parameters, kept as strings so malformed
/// values surface as validation errors rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct OffsetParams {
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl OffsetParams {
    /// Offset defaults to 0; limit defaults to 20 and is capped at 100.
    pub fn window(&self) -> Result<PageWindow, ApiError> {
        let offset = match self.offset.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => n,
                _ => {
                    return Err(ApiError::bad_request(
                        "offset must be a non-negative integer",
                    ));
                }
            },
        };

        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_OFFSET_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => n.min(MAX_OFFSET_LIMIT),
                _ => return Err(ApiError::bad_request("limit must be a positive integer")),
            },
        };

        Ok(PageWindow { offset, limit })
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Helper to paginate a slice and determine if there are more results
pub fn paginate<T, F>(items: Vec<T>, limit: usize, get_cursor: F) -> (Vec<T>, Option<String>, bool)
where
    F: Fn(&T) -> String,
{
    let has_more = items.len() > limit;
    let items: Vec<T> = items.into_iter().take(limit).collect();
    let next_cursor = if has_more {
        items.last().map(&get_cursor)
    } else {
        None
    };
    (items, next_cursor, has_more)
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e}");
            ApiError::internal(message)
        })
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(offset: Option<&str>, limit: Option<&str>) -> OffsetParams {
        OffsetParams {
            offset: offset.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_window_defaults() {
        let window = params(None, None).window().unwrap();
        assert_eq!(window, PageWindow { offset: 0, limit: 20 });
    }

    #[test]
    fn test_window_caps_limit() {
        let window = params(Some("5"), Some("1000")).window().unwrap();
        assert_eq!(window, PageWindow { offset: 5, limit: 100 });
    }

    #[test]
    fn test_window_accepts_large_offset() {
        let window = params(Some("4294967296"), None).window().unwrap();
        assert_eq!(window.offset, 4_294_967_296);

        let window = params(Some(i64::MAX.to_string().as_str()), None).window().unwrap();
        let page = OffsetPage::new(Vec::<u8>::new(), 3, window);
        assert!(!page.has_more);
    }

    #[test]
    fn test_window_rejects_bad_values() {
        for (offset, limit) in [
            (Some("-1"), None),
            (Some("abc"), None),
            (None, Some("0")),
            (None, Some("-3")),
            (None, Some("ten")),
        ] {
            let err = params(offset, limit).window().unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_offset_page_has_more() {
        let window = PageWindow { offset: 0, limit: 2 };
        let page = OffsetPage::new(vec![1, 2], 3, window);
        assert!(page.has_more);

        let window = PageWindow { offset: 2, limit: 2 };
        let page = OffsetPage::new(vec![3], 3, window);
        assert!(!page.has_more);
    }

    #[test]
    fn test_paginate_cursor() {
        let (items, cursor, has_more) = paginate(vec!["a", "b", "c"], 2, |s| s.to_string());
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(cursor.as_deref(), Some("b"));
        assert!(has_more);
    }
}
