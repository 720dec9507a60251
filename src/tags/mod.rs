use std::sync::Arc;

use axum::{
    Extension, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::MaybeStore,
    mid::AuthenticatedUser,
    templates::{self, TemplateData, Templates},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(tags))
        .route("/tags/{name}", get(tagged))
}

#[debug_handler(state = AppState)]
async fn tags(
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let data = TemplateData {
        tags: maybes.tags(&user.id).await?,
        ..Default::default()
    };
    templates::render(&templates, &session, "tags.html", StatusCode::OK, data).await
}

#[debug_handler(state = AppState)]
async fn tagged(
    Path(name): Path<String>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let data = TemplateData {
        maybes: maybes.query_by_tag(&name, &user.id).await?,
        tag: name,
        ..Default::default()
    };
    templates::render(&templates, &session, "maybes.html", StatusCode::OK, data).await
}
