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
    data::{self, UserStore},
    forms,
    session::{RETURN_URL, USER_ID},
    templates::{self, TemplateData, Templates},
};

#[debug_handler(state = AppState)]
pub(crate) async fn login_page(
    State(templates): State<Arc<Templates>>,
    session: Session,
) -> AppResult<Response> {
    templates::render(&templates, &session, "login.html", StatusCode::OK, TemplateData::default()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(users): State<Arc<dyn UserStore>>,
    State(templates): State<Arc<Templates>>,
    session: Session,
    Form(values): Form<HashMap<String, String>>,
) -> AppResult<Response> {
    let mut form = forms::Form::new(values);

    match users.authenticate(form.get("email").trim(), form.get("password")).await {
        Ok(user_id) => {
            session.cycle_id().await?;
            session.insert(USER_ID, &user_id).await?;
            tracing::info!(%user_id, "logged in");

            let return_url = session
                .remove::<String>(RETURN_URL)
                .await?
                .unwrap_or_else(|| "/maybes".to_owned());
            return Ok(Redirect::to(&return_url).into_response());
        }
        Err(data::Error::AuthenticationFailure) => {
            form.errors.add("generic", "Email or Password is incorrect");
        }
        Err(err) => return Err(err.into()),
    }

    form.values.remove("password");
    let data = TemplateData {
        form,
        ..Default::default()
    };
    templates::render(&templates, &session, "login.html", StatusCode::UNPROCESSABLE_ENTITY, data).await
}
