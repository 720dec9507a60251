mod login;
mod logout;
mod password;
mod profile;
mod signup;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

const MAX_FIELD_LENGTH: usize = 255;

/// Signup and login, open to everyone.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/signup", get(signup::signup_page).post(signup::signup))
        .route("/users/login", get(login::login_page).post(login::login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/users/logout", post(logout::logout))
        .route("/users/profile", get(profile::profile))
        .route("/users/change-password", get(password::change_password_page).post(password::change_password))
}
