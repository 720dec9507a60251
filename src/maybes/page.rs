use std::sync::Arc;

use axum::{
    Extension, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::MaybeStore,
    mid::AuthenticatedUser,
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn maybe(
    Path(maybe_id): Path<String>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let maybe = maybes.query_by_id(&maybe_id, &user.id).await?;

    let data = TemplateData {
        maybe: Some(maybe),
        ..Default::default()
    };
    templates::render(&templates, &session, "maybe.html", StatusCode::OK, data).await
}
