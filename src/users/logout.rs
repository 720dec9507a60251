use axum::{debug_handler, response::Redirect};
use tower_sessions::Session;

use crate::{AppResult, session::{self, USER_ID}};

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    session.remove::<String>(USER_ID).await?;
    session.cycle_id().await?;
    session::put_flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/"))
}
