use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DbErr, EntityTrait, Set, SqlErr};
use validator::Validate;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::{Users, users::ActiveModel as UserActive},
    error::{AppError, AppResult},
    mail::confirmation_email,
    middleware::auth::AuthUser,
    models::User,
    repo,
    response::{ApiResponse, Meta},
    state::AppState,
    tokens,
};

/// Result of following an email confirmation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
    Invalid,
}

impl ConfirmOutcome {
    pub fn message(self) -> &'static str {
        match self {
            ConfirmOutcome::Confirmed => "Email address successfully confirmed!",
            ConfirmOutcome::AlreadyConfirmed => "Account already confirmed. Please login.",
            ConfirmOutcome::Invalid => "The confirmation link is invalid or has expired.",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            ConfirmOutcome::Invalid => "error",
            _ => "success",
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// A concurrent registration can pass the lookup and still lose on the
/// unique email index.
fn duplicate_email(err: DbErr, email: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest(format!("User with email {email} already exists!!"))
        }
        _ => err.into(),
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let RegisterRequest {
        name,
        phone,
        email,
        password,
        ..
    } = payload;

    if let Some(existing) = repo::user_by_email(&state.orm, &email).await? {
        return Err(AppError::BadRequest(format!(
            "User with email {} already exists!!",
            existing.email
        )));
    }

    let user = UserActive {
        id: NotSet,
        name: Set(name),
        email: Set(email.clone()),
        phone: Set(phone),
        password_hash: Set(hash_password(&password)?),
        admin: Set(false),
        email_confirmed: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| duplicate_email(err, &email))?;

    tracing::info!(user_id = user.id, "user registered");
    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    // The account exists either way; the user can ask for another link.
    if let Err(err) = send_confirmation(state, &user.email).await {
        tracing::warn!(error = %err, user_id = user.id, "confirmation email failed");
    }

    Ok(ApiResponse::success(
        "Thanks for registering! Please check your email to confirm your email address.",
        user.into(),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = match repo::user_by_email(&state.orm, &email).await? {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(format!(
                "User with email {email} doesn't exist!"
            )));
        }
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Email and password incorrect!!".into()));
    }

    let token = tokens::issue_session_token(&state.config.secret_key, user.id)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", account.into(), Some(Meta::empty())))
}

pub async fn resend_confirmation(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    send_confirmation(state, &user.email).await?;
    Ok(ApiResponse::success(
        "Confirmation email sent successfully.",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn confirm_email(state: &AppState, token: &str) -> AppResult<ConfirmOutcome> {
    let Some(email) = tokens::verify_confirmation_token(&state.config.secret_key, token) else {
        return Ok(ConfirmOutcome::Invalid);
    };
    let Some(user) = repo::user_by_email(&state.orm, &email).await? else {
        return Ok(ConfirmOutcome::Invalid);
    };
    if user.email_confirmed {
        return Ok(ConfirmOutcome::AlreadyConfirmed);
    }

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.email_confirmed = Set(true);
    active.update(&state.orm).await?;
    tracing::info!(user_id, "email confirmed");

    Ok(ConfirmOutcome::Confirmed)
}

async fn send_confirmation(state: &AppState, email: &str) -> AppResult<()> {
    let token = tokens::issue_confirmation_token(&state.config.secret_key, email, Utc::now())?;
    let confirm_url = state.config.url(&format!("/api/auth/confirm/{token}"));
    state
        .mailer
        .send(confirmation_email(email, &confirm_url))
        .await?;
    Ok(())
}
