pub mod config;
pub mod data;
pub mod db;
pub mod forms;
pub mod mid;
pub mod res;
pub mod router;
pub mod schema;
pub mod session;
pub mod templates;

mod debug;
mod index;
mod maybes;
mod tags;
mod users;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use sqlx::SqlitePool;

use data::{MaybeRepo, MaybeStore, UserRepo, UserStore};
use templates::Templates;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub maybes: Arc<dyn MaybeStore>,
    pub users: Arc<dyn UserStore>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, hash_cost: u32) -> Result<Self, tera::Error> {
        Ok(Self {
            maybes: Arc::new(MaybeRepo::new(db_pool.clone())),
            users: Arc::new(UserRepo::new(db_pool.clone(), hash_cost)),
            templates: Arc::new(Templates::new()?),
            db_pool,
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self { status, error: error.into() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = ?self.error, "request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.error, "request rejected");
        }

        let reason = self.status.canonical_reason().unwrap_or("Error");
        (self.status, reason).into_response()
    }
}

impl From<data::Error> for AppError {
    fn from(err: data::Error) -> Self {
        let status = match &err {
            data::Error::InvalidId => StatusCode::BAD_REQUEST,
            data::Error::Forbidden => StatusCode::FORBIDDEN,
            data::Error::NotFound => StatusCode::NOT_FOUND,
            data::Error::DuplicateEmail
            | data::Error::InvalidTag(_)
            | data::Error::AuthenticationFailure => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(tera::Error);
apperr_impl!(axum::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_map_to_statuses() {
        let cases = [
            (data::Error::InvalidId, StatusCode::BAD_REQUEST),
            (data::Error::Forbidden, StatusCode::FORBIDDEN),
            (data::Error::NotFound, StatusCode::NOT_FOUND),
            (data::Error::DuplicateEmail, StatusCode::UNPROCESSABLE_ENTITY),
            (data::Error::InvalidTag(String::new()), StatusCode::UNPROCESSABLE_ENTITY),
            (data::Error::AuthenticationFailure, StatusCode::UNPROCESSABLE_ENTITY),
            (data::Error::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn into_response_keeps_status() {
        let res = AppError::from(data::Error::Forbidden).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
