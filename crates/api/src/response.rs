//! Shared response envelope types.
//!
//! Every API response uses the `{success, message, data}` envelope, with
//! an `errors` object added on validation failures. Use these types
//! instead of ad-hoc `serde_json::json!` blocks so payload shapes are
//! checked at compile time.

use serde::Serialize;

/// Standard `{success, message, data}` response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful envelope wrapping `data`.
    pub fn ok(message: impl Into<String>, data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

/// A page of items plus pagination metadata.
#[derive(Debug, Serialize)]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata block for list endpoints.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
    /// 1-based index of the first item on this page; `null` when empty.
    pub from: Option<i64>,
    /// 1-based index of the last item on this page; `null` when empty.
    pub to: Option<i64>,
}

impl PageMeta {
    pub fn new(page: i64, per_page: i64, total: i64, page_len: usize) -> Self {
        let last_page = (total + per_page - 1) / per_page;
        let offset = (page - 1) * per_page;
        let (from, to) = if page_len == 0 {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + page_len as i64))
        };
        Self {
            current_page: page,
            per_page,
            total,
            last_page: last_page.max(1),
            from,
            to,
        }
    }
}
