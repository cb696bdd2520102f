//! API response envelope.
//!
//! Every endpoint returns `{ success, message?, data? }`; list endpoints
//! wrap their payload in [`Paginated`] so clients always see the same
//! `{ items, pagination }` shape. Errors are rendered by the
//! `IntoResponse` impl on `AppError` in hearth-common.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hearth_core::services::MAX_PAGE_SIZE;
use serde::Serialize;

/// Successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response carrying data.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// 201 response carrying data.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// 200 response with only a message, no data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Pagination echo attached to every list payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// A page of items plus its pagination echo.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> Paginated<T> {
    /// Build a page. `page` and `limit` are the raw query values; they
    /// are clamped here the same way the services clamp them, so the
    /// echo matches what was actually queried.
    #[must_use]
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let total_pages = total.div_ceil(limit);

        Self {
            items,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}
