use std::sync::Arc;

use axum::{
    Extension, debug_handler,
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;

use crate::{AppResult, AppState, data::MaybeStore, mid::AuthenticatedUser, session};

#[debug_handler(state = AppState)]
pub(crate) async fn delete(
    Path(maybe_id): Path<String>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Redirect> {
    maybes.delete(&maybe_id, &user.id).await?;
    session::put_flash(&session, "Maybe successfully deleted!").await?;
    Ok(Redirect::to("/maybes"))
}
