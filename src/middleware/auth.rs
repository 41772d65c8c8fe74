use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use sea_orm::EntityTrait;

use crate::{
    entity::Users, error::AppError, models::User, state::AppState, tokens::decode_session_token,
};

/// The caller of the current request, resolved once from the bearer token and
/// a fresh read of the account row.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    User(AuthUser),
    Admin(AuthUser),
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub email_confirmed: bool,
}

/// Only an admin gets through; everyone else gets the plain-text denial.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl Principal {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Anonymous => None,
            Principal::User(user) | Principal::Admin(user) => Some(user),
        }
    }

    fn from_account(user: User) -> Self {
        let auth = AuthUser {
            user_id: user.id,
            email: user.email,
            email_confirmed: user.email_confirmed,
        };
        if user.admin {
            Principal::Admin(auth)
        } else {
            Principal::User(auth)
        }
    }
}

pub fn ensure_login(principal: &Principal) -> Result<AuthUser, AppError> {
    principal.user().cloned().ok_or(AppError::LoginRequired)
}

pub fn ensure_admin(principal: &Principal) -> Result<AuthUser, AppError> {
    match principal {
        Principal::Admin(user) => Ok(user.clone()),
        _ => Err(AppError::Forbidden),
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Principal::Anonymous);
        };
        // An invalid or expired token is treated like no session at all.
        let Some(user_id) = decode_session_token(&state.config.secret_key, token) else {
            return Ok(Principal::Anonymous);
        };

        let principal = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .map(|model| Principal::from_account(model.into()))
            .unwrap_or(Principal::Anonymous);
        Ok(principal)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        ensure_login(&principal)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        ensure_admin(&principal).map(AdminUser)
    }
}
