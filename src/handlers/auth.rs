use axum::{response::Json, Extension};
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::IdentityClient;

/// POST /api/auth/login - forwarded to the identity service; the upstream
/// response body (token payload) is returned as-is
pub async fn login(Json(credentials): Json<Value>) -> Result<Json<Value>, ApiError> {
    let data = IdentityClient::new().login(credentials).await?;
    Ok(Json(data))
}

/// POST /api/auth/register - forwarded to the identity service
pub async fn register(Json(payload): Json<Value>) -> Result<Json<Value>, ApiError> {
    let data = IdentityClient::new().register(payload).await?;
    Ok(Json(data))
}

/// GET /api/auth/profile - the profile the auth middleware already resolved
/// for this request's token
pub async fn profile(Extension(auth_user): Extension<AuthUser>) -> Json<Value> {
    Json(auth_user.profile)
}
