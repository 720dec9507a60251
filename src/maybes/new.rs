use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension, Form, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::{MaybeStore, NewMaybe},
    forms::{self, parse_tags},
    mid::AuthenticatedUser,
    session,
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn create_page(
    State(templates): State<Arc<Templates>>,
    session: Session,
) -> AppResult<Response> {
    templates::render(&templates, &session, "create.html", StatusCode::OK, TemplateData::default()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
    Form(values): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let mut form = forms::Form::new(values);
    form.required(&["title", "url", "description"]);
    super::check_fields(&mut form);

    if form.valid() {
        let nm = NewMaybe {
            title: form.get("title").trim().to_owned(),
            url: form.get("url").trim().to_owned(),
            description: form.get("description").trim().to_owned(),
            tags: parse_tags(form.get("tags")),
        };
        match maybes.create(nm, &user.id).await {
            Ok(maybe) => {
                session::put_flash(&session, "Maybe successfully created!").await?;
                return Ok(Redirect::to(&format!("/maybes/{}", maybe.id)).into_response());
            }
            Err(err) => super::reject_tags(&mut form, err)?,
        }
    }

    let data = TemplateData {
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "create.html", StatusCode::UNPROCESSABLE_ENTITY, data).await
}
