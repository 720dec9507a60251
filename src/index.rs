use std::sync::Arc;

use axum::{debug_handler, extract::State, http::StatusCode, response::Response};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::MaybeStore,
    session,
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn index(
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    session: Session,
) -> AppResult<Response> {
    let mut data = TemplateData::default();
    if let Some(user_id) = session::user_id(&session).await? {
        data.maybes = maybes.query(&user_id).await?;
    }

    templates::render(&templates, &session, "home.html", StatusCode::OK, data).await
}
