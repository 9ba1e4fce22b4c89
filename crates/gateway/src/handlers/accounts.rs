//! Account handlers: signup and login

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ApiJson;
use crate::AppState;
use papersmith_common::{
    db::{models::UserAccount, UserStore},
    errors::{AppError, Result},
};

/// Email and password pair submitted to both endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

impl CredentialsRequest {
    fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
}

impl From<UserAccount> for AccountResponse {
    fn from(user: UserAccount) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized {
        message: "invalid email or password".to_string(),
    }
}

/// Register a new account
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let email = request.normalized_email();
    let credential_hash = state.credentials.hash(&request.password)?;
    let user = state.repo.create_user(&email, &credential_hash).await?;

    tracing::info!(user_id = %user.id, "Account created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Check credentials for an existing account
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CredentialsRequest>,
) -> Result<Json<AccountResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let user = state
        .repo
        .find_user_by_email(&request.normalized_email())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !state.credentials.verify(&request.password, &user.credential_hash) {
        tracing::warn!(user_id = %user.id, "Login rejected");
        return Err(invalid_credentials());
    }

    tracing::info!(user_id = %user.id, "Login succeeded");

    Ok(Json(user.into()))
}
