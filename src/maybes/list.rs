use std::sync::Arc;

use axum::{
    Extension, debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::MaybeStore,
    mid::AuthenticatedUser,
    templates::{self, TemplateData, Templates},
};

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) title: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    Query(ListQuery { title }): Query<ListQuery>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let query = title.map(|t| t.trim().to_owned()).unwrap_or_default();
    let found = if query.is_empty() {
        maybes.query(&user.id).await?
    } else {
        maybes.query_by_title(&query, &user.id).await?
    };

    let data = TemplateData {
        maybes: found,
        query,
        ..Default::default()
    };
    templates::render(&templates, &session, "maybes.html", StatusCode::OK, data).await
}
