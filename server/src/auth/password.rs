use tokio::task;

use crate::utils::error::AppError;

/// bcrypt work factor used when none is configured.
pub const DEFAULT_COST: u32 = 10;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("failed to hash password: {e}")))
}

/// A stored hash that bcrypt cannot parse counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let outcome = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("verification task failed: {e}")))?;

    match outcome {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            Ok(false)
        }
    }
}
