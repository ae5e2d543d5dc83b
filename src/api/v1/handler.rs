use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Refresh tokens travel base64-wrapped over HTTP; the service only ever sees
/// the plain token string.
fn wrap_refresh(token: &RefreshToken) -> String {
    STANDARD.encode(token.0.as_bytes())
}

fn unwrap_refresh(wrapped: &str) -> Result<String, ApiErrorCode> {
    let bytes = STANDARD
        .decode(wrapped.trim())
        .map_err(|_| ApiErrorCode::InvalidToken)?;
    String::from_utf8(bytes).map_err(|_| ApiErrorCode::InvalidToken)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        TokenPairResponse {
            refresh_token: wrap_refresh(&pair.refresh_token),
            access_token: pair.access_token.0,
            access_token_expires_at: pair.access_token_expires_at,
            refresh_token_expires_at: pair.refresh_token_expires_at,
        }
    }
}

pub async fn issue_token(
    principal_id: String,
    ctx: CallContext,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = credential_service
        .issue(&ctx, &principal_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(pair))))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn refresh_token(
    body: RefreshRequest,
    ctx: CallContext,
    credential_service: Arc<dyn CredentialService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let refresh_token = unwrap_refresh(&body.refresh_token).map_err(reject::custom)?;

    let pair = credential_service
        .refresh(&ctx, &refresh_token, &body.access_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenPairResponse::from(pair))))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub principal_id: PrincipalId,
}

pub async fn whoami(principal_id: PrincipalId) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(WhoAmIResponse { principal_id })))
}
