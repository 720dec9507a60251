use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::{Error, Result, parse_id, timestamp};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn query_by_id(&self, user_id: &str) -> Result<User>;
    async fn create(&self, nu: NewUser) -> Result<User>;
    /// Returns the user id. Unknown email, inactive account and wrong password
    /// are all the same `AuthenticationFailure`.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String>;
    async fn change_password(&self, user_id: &str, current: &str, new: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct UserRepo {
    db_pool: SqlitePool,
    hash_cost: u32,
}

impl UserRepo {
    pub fn new(db_pool: SqlitePool, hash_cost: u32) -> Self {
        Self { db_pool, hash_cost }
    }
}

#[async_trait]
impl UserStore for UserRepo {
    async fn query_by_id(&self, user_id: &str) -> Result<User> {
        parse_id(user_id)?;

        sqlx::query_as::<_, User>("SELECT user_id,name,email,password_hash,active,created_at,updated_at FROM users WHERE user_id=?")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(Error::NotFound)
    }

    async fn create(&self, nu: NewUser) -> Result<User> {
        let now = timestamp()?;
        let user = User {
            id: Uuid::now_v7().to_string(),
            name: nu.name,
            email: nu.email,
            password_hash: bcrypt::hash(&nu.password, self.hash_cost)?,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };

        let inserted = sqlx::query("INSERT INTO users (user_id,name,email,password_hash,active,created_at,updated_at) VALUES (?,?,?,?,?,?,?)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.active)
            .bind(&user.created_at)
            .bind(&user.updated_at)
            .execute(&self.db_pool)
            .await;

        match inserted {
            Ok(_) => {
                tracing::info!(user_id = %user.id, "created user");
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<String> {
        let Some((user_id, hash)): Option<(String, String)> =
            sqlx::query_as("SELECT user_id,password_hash FROM users WHERE email=? AND active=TRUE")
                .bind(email)
                .fetch_optional(&self.db_pool)
                .await?
        else {
            return Err(Error::AuthenticationFailure);
        };

        if !bcrypt::verify(password, &hash)? {
            return Err(Error::AuthenticationFailure);
        }
        Ok(user_id)
    }

    async fn change_password(&self, user_id: &str, current: &str, new: &str) -> Result<()> {
        parse_id(user_id)?;

        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE user_id=?")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(Error::NotFound)?;

        if !bcrypt::verify(current, &hash)? {
            return Err(Error::AuthenticationFailure);
        }

        sqlx::query("UPDATE users SET password_hash=?, updated_at=? WHERE user_id=?")
            .bind(bcrypt::hash(new, self.hash_cost)?)
            .bind(timestamp()?)
            .bind(user_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}
