pub mod maybe;
pub mod user;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

pub use maybe::{Maybe, MaybeRepo, MaybeStore, NewMaybe, TagCount, UpdateMaybe};
pub use user::{NewUser, User, UserRepo, UserStore};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("ID is not in its proper form")]
    InvalidId,
    #[error("not found")]
    NotFound,
    #[error("attempted action is not allowed")]
    Forbidden,
    #[error("email already in use")]
    DuplicateEmail,
    #[error("tag {0:?} is invalid")]
    InvalidTag(String),
    #[error("authentication failed")]
    AuthenticationFailure,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("hashing password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("formatting timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

pub(crate) fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::InvalidId)
}

pub(crate) fn timestamp() -> Result<String> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}
