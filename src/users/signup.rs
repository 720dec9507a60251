use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, debug_handler,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppResult, AppState,
    data::{self, NewUser, UserStore},
    forms::{self, EMAIL_RX},
    session,
    templates::{self, TemplateData, Templates},
};

use super::MAX_FIELD_LENGTH;

#[debug_handler(state = AppState)]
pub(crate) async fn signup_page(
    State(templates): State<Arc<Templates>>,
    session: Session,
) -> AppResult<Response> {
    templates::render(&templates, &session, "signup.html", StatusCode::OK, TemplateData::default()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(users): State<Arc<dyn UserStore>>,
    State(templates): State<Arc<Templates>>,
    session: Session,
    Form(values): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let mut form = forms::Form::new(values);
    form.required(&["name", "email", "password"]);
    form.max_length("name", MAX_FIELD_LENGTH);
    form.max_length("email", MAX_FIELD_LENGTH);
    form.matches_pattern("email", &EMAIL_RX);
    form.secure_password("password");
    form.is_equal("password", "password_confirm");

    if form.valid() {
        let nu = NewUser {
            name: form.get("name").trim().to_owned(),
            email: form.get("email").trim().to_owned(),
            password: form.get("password").to_owned(),
        };
        match users.create(nu).await {
            Ok(_) => {
                session::put_flash(&session, "Your signup was successful. Please log in.").await?;
                return Ok(Redirect::to("/users/login").into_response());
            }
            Err(data::Error::DuplicateEmail) => {
                form.errors.add("email", "Invalid email or email already in use");
            }
            Err(err) => return Err(err.into()),
        }
    }

    form.values.remove("password");
    form.values.remove("password_confirm");
    let data = TemplateData {
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "signup.html", StatusCode::UNPROCESSABLE_ENTITY, data).await
}
