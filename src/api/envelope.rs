//! JSON response envelopes

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

use crate::pagination::Page;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, message: None, data: Some(data) } }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: Some(message.into()), data: Some(data) }
    }

    /// 201 with this envelope as body.
    pub fn created(self) -> Response { (StatusCode::CREATED, Json(self)).into_response() }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self { Self { success: true, message: Some(message.into()), data: None } }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response { Json(self).into_response() }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub success: bool,
    pub count: usize,
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub data: Vec<T>,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            count: page.count(),
            total_count: page.total_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
            has_next: page.has_next,
            has_prev: page.has_prev,
            data: page.items,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response { Json(self).into_response() }
}
