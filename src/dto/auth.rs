use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Debug, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 30))]
    pub phone: String,
    #[validate(email, length(max = 50))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords must match"))]
    pub confirm: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub purpose: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ConfirmationClaims {
    /// The email being confirmed.
    pub sub: String,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}
