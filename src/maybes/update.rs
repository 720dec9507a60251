use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension, Form, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::{MaybeStore, UpdateMaybe},
    forms::{self, parse_tags},
    mid::AuthenticatedUser,
    session,
    templates::{self, TemplateData, Templates},
};

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_page(
    Path(maybe_id): Path<String>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
) -> AppResult<Response> {
    let maybe = maybes.query_by_id(&maybe_id, &user.id).await?;

    let mut form = forms::Form::default();
    form.set("title", &maybe.title);
    form.set("url", &maybe.url);
    form.set("description", &maybe.description);
    form.set("tags", maybe.tags.join(", "));

    let data = TemplateData {
        maybe: Some(maybe),
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "update.html", StatusCode::OK, data).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn update(
    Path(maybe_id): Path<String>,
    State(maybes): State<Arc<dyn MaybeStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
    Form(values): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let maybe = maybes.query_by_id(&maybe_id, &user.id).await?;

    let mut form = forms::Form::new(values);
    super::check_fields(&mut form);

    if form.valid() {
        let um = UpdateMaybe {
            title: non_empty(form.get("title")),
            url: non_empty(form.get("url")),
            description: non_empty(form.get("description")),
            tags: parse_tags(form.get("tags")),
        };
        match maybes.update(um, &maybe.id, &user.id).await {
            Ok(updated) => {
                session::put_flash(&session, "Maybe successfully updated!").await?;
                return Ok(Redirect::to(&format!("/maybes/{}", updated.id)).into_response());
            }
            Err(err) => super::reject_tags(&mut form, err)?,
        }
    }

    let data = TemplateData {
        maybe: Some(maybe),
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "update.html", StatusCode::UNPROCESSABLE_ENTITY, data).await
}
