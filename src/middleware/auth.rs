//! Device authentication middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Sha256, Digest};
use uuid::Uuid;

use crate::{AppState, AppError};
use crate::models::Cradle;

/// Device context resolved from the device key
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub cradle_id: Uuid,
    pub user_id: Uuid,
}

/// Middleware: Require a registered device key
///
/// Devices identify with an `x-device-key` header; only its hash is stored.
pub async fn require_device_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let device_key = req.headers()
        .get("x-device-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let key_hash = hash_device_key(device_key);

    // Find cradle by key hash
    let cradle = Cradle::find_by_device_hash(&state.pool, &key_hash)
        .await
        .map_err(|_| AppError::InternalError("Database error".to_string()))?
        .ok_or(AppError::Unauthorized)?;

    // Create device context
    let device_ctx = DeviceContext {
        cradle_id: cradle.id,
        user_id: cradle.user_id,
    };

    // Insert into request extensions
    req.extensions_mut().insert(device_ctx);

    Ok(next.run(req).await)
}

pub fn hash_device_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

// Implement FromRequestParts for DeviceContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for DeviceContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<DeviceContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_key_hash_is_stable_hex() {
        let h = hash_device_key("cradle-key-1");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_device_key("cradle-key-1"));
        assert_ne!(h, hash_device_key("cradle-key-2"));
    }
}
