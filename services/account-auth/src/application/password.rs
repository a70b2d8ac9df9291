//! 在阻塞线程池上执行 Argon2

use std::sync::Arc;

use sentinel_auth_core::CredentialHasher;
use sentinel_errors::{AppError, AppResult};

pub async fn hash_password(hasher: Arc<CredentialHasher>, plain_password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&plain_password))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
}

pub async fn verify_password(
    hasher: Arc<CredentialHasher>,
    plain_password: String,
    digest: String,
) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&plain_password, &digest))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))
}
