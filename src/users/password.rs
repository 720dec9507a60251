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
    data::{self, UserStore},
    forms,
    mid::AuthenticatedUser,
    session,
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn change_password_page(
    State(templates): State<Arc<Templates>>,
    session: Session,
) -> AppResult<Response> {
    templates::render(&templates, &session, "change_password.html", StatusCode::OK, TemplateData::default()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn change_password(
    State(users): State<Arc<dyn UserStore>>,
    State(templates): State<Arc<Templates>>,
    Extension(user): Extension<AuthenticatedUser>,
    session: Session,
    Form(values): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let mut form = forms::Form::new(values);
    form.required(&["current_password", "new_password", "new_password_confirm"]);
    form.secure_password("new_password");
    form.is_equal("new_password", "new_password_confirm");

    if form.valid() {
        match users
            .change_password(&user.id, form.get("current_password"), form.get("new_password"))
            .await
        {
            Ok(()) => {
                session::put_flash(&session, "Your password has been updated!").await?;
                return Ok(Redirect::to("/users/profile").into_response());
            }
            Err(data::Error::AuthenticationFailure) => {
                form.errors.add("current_password", "Current password is incorrect");
            }
            Err(err) => return Err(err.into()),
        }
    }

    form.values.clear();
    let data = TemplateData {
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "change_password.html", StatusCode::UNPROCESSABLE_ENTITY, data).await
}
