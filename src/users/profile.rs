use std::sync::Arc;

use axum::{Extension, debug_handler, extract::State, http::StatusCode, response::Response};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::UserStore,
    mid::AuthenticatedUser,
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    State(users): State<Arc<dyn UserStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let data = TemplateData {
        user: Some(users.query_by_id(&user.id).await?),
        ..Default::default()
    };
    templates::render(&templates, &session, "profile.html", StatusCode::OK, data).await
}
