use rand::distr::{Alphanumeric, SampleString};
use tower_sessions::{Session, cookie::Key};

pub const USER_ID: &str = "authenticatedUserID";
pub const FLASH: &str = "flash";
pub const RETURN_URL: &str = "redirectPathAfterLogin";
pub const CSRF_TOKEN: &str = "csrfToken";

const CSRF_TOKEN_LEN: usize = 32;

/// Cookie signing key. The secret needs at least 64 bytes.
pub fn signing_key(secret: &str) -> anyhow::Result<Key> {
    Key::try_from(secret.as_bytes()).map_err(|e| anyhow::anyhow!("session secret: {e:?}"))
}

pub async fn put_flash(session: &Session, message: &str) -> Result<(), tower_sessions::session::Error> {
    session.insert(FLASH, message).await
}

/// Takes the flash message out of the session, so it shows once.
pub async fn pop_flash(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.remove::<String>(FLASH).await
}

pub async fn user_id(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.get::<String>(USER_ID).await
}

/// The session's CSRF token, created on first use.
pub async fn csrf_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN).await? {
        return Ok(token);
    }

    let token = Alphanumeric.sample_string(&mut rand::rng(), CSRF_TOKEN_LEN);
    session.insert(CSRF_TOKEN, &token).await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn short_secrets_are_rejected() {
        assert!(signing_key("too short").is_err());
        assert!(signing_key(&"k".repeat(64)).is_ok());
    }

    #[tokio::test]
    async fn flash_shows_once() {
        let session = session();
        put_flash(&session, "Maybe successfully created!").await.unwrap();

        assert_eq!(pop_flash(&session).await.unwrap().as_deref(), Some("Maybe successfully created!"));
        assert_eq!(pop_flash(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn csrf_token_is_stable() {
        let session = session();
        let first = csrf_token(&session).await.unwrap();

        assert_eq!(first.len(), CSRF_TOKEN_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(csrf_token(&session).await.unwrap(), first);
    }
}
