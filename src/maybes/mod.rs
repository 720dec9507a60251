mod delete;
mod list;
mod new;
mod page;
mod update;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppResult, AppState, data, forms::Form};

const MAX_FIELD_LENGTH: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/maybes", get(list::list))
        .route("/maybes/new", get(new::create_page).post(new::create))
        .route("/maybes/{id}", get(page::maybe))
        .route("/maybes/{id}/update", get(update::update_page).post(update::update))
        .route("/maybes/{id}/delete", post(delete::delete))
}

/// Length and URL rules shared by the create and update forms. Empty
/// fields are left to `Form::required`.
fn check_fields(form: &mut Form) {
    form.max_length("title", MAX_FIELD_LENGTH);
    form.max_length("description", MAX_FIELD_LENGTH);
    if !form.get("url").trim().is_empty() {
        form.valid_url("url");
    }
}

/// A rejected tag becomes a field error, anything else propagates.
fn reject_tags(form: &mut Form, err: data::Error) -> AppResult<()> {
    match err {
        data::Error::InvalidTag(name) if name.is_empty() => {
            form.errors.add("tags", "Tags cannot be empty");
            Ok(())
        }
        data::Error::InvalidTag(name) => {
            form.errors.add("tags", format!("Tag \"{name}\" is invalid"));
            Ok(())
        }
        err => Err(err.into()),
    }
}
