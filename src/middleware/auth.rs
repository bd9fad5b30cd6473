// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication middleware.
//!
//! Devices authenticate with their project's API key in
//! `X-Project-Api-Key`. The administrative API takes a static bearer token.

use crate::error::AppError;
use crate::models::Project;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying a project API key.
pub const API_KEY_HEADER: &str = "x-project-api-key";

/// Project resolved from the request's API key.
#[derive(Debug, Clone)]
pub struct DeviceProject(pub Project);

/// Middleware that requires a valid project API key.
pub async fn require_project_key(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)?;

    let project = state
        .db
        .get_project_by_api_key(&api_key)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Rejected request with unknown project API key");
            AppError::Unauthorized
        })?;

    request.extensions_mut().insert(DeviceProject(project));
    Ok(next.run(request).await)
}

/// Middleware that requires the admin bearer token.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !tokens_match(token, &state.config.admin_token) {
        tracing::warn!("Rejected admin request with invalid token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

/// Compare secrets without leaking where they differ.
fn tokens_match(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

/// Generate a new project API key (128 random bits, hex encoded).
pub fn generate_api_key() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
