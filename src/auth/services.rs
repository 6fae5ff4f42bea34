use tracing::{info, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserRepo,
        repo_types::User,
    },
    config::SeedUser,
    error::{AppError, AppResult},
};

/// Verifies credentials and mints an access token.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> AppResult<String> {
    let email = email.trim();

    let user = users
        .find_by_email(email)
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            AppError::NotFound("User not found".into())
        })?;

    let (plain, hash) = (password.to_owned(), user.password_hash.clone());
    let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::Internal)?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id).map_err(AppError::Internal)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Creates the seed account unless the email is already taken.
pub async fn ensure_user(users: &dyn UserRepo, seed: &SeedUser) -> anyhow::Result<User> {
    let email = seed.email.trim();
    if let Some(existing) = users.find_by_email(email).await? {
        return Ok(existing);
    }
    let hash = hash_password(&seed.password)?;
    let user = users.create(email, &hash).await?;
    info!(user_id = %user.id, email = %user.email, "seed user created");
    Ok(user)
}
