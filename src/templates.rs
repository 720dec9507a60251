use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::{Context, Tera, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};
use tower_sessions::Session;

use crate::{
    AppResult,
    data::{Maybe, TagCount, User},
    forms::Form,
    include_res, session,
};

const TEMPLATES: [(&str, &str); 11] = [
    ("base.html", include_res!(str, "/templates/base.html")),
    ("home.html", include_res!(str, "/templates/home.html")),
    ("maybes.html", include_res!(str, "/templates/maybes.html")),
    ("maybe.html", include_res!(str, "/templates/maybe.html")),
    ("create.html", include_res!(str, "/templates/create.html")),
    ("update.html", include_res!(str, "/templates/update.html")),
    ("tags.html", include_res!(str, "/templates/tags.html")),
    ("signup.html", include_res!(str, "/templates/signup.html")),
    ("login.html", include_res!(str, "/templates/login.html")),
    ("profile.html", include_res!(str, "/templates/profile.html")),
    ("change_password.html", include_res!(str, "/templates/change_password.html")),
];

/// Everything a page may show. Handlers fill what they need and `render`
/// adds the per-request defaults.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub maybe: Option<Maybe>,
    pub maybes: Vec<Maybe>,
    pub tags: Vec<TagCount>,
    pub user: Option<User>,
    pub form: Form,
    pub query: String,
    pub tag: String,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub current_year: i32,
}

/// The parsed template set. Built once at startup.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        tera.register_filter("human_date", human_date);
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, data: &TemplateData) -> tera::Result<String> {
        self.tera.render(name, &Context::from_serialize(data)?)
    }
}

/// `2021-02-24T13:35:50.0286Z` becomes `2021-02-24 at 13:35:50`.
fn human_date(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = tera::try_get_value!("human_date", "value", String, value);
    if raw.is_empty() {
        return Ok(Value::String(raw));
    }

    let when = OffsetDateTime::parse(&raw, &Rfc3339)
        .map_err(|e| tera::Error::msg(format!("human_date: {raw}: {e}")))?;
    let formatted = when
        .format(format_description!("[year]-[month]-[day] at [hour]:[minute]:[second]"))
        .map_err(|e| tera::Error::msg(format!("human_date: {e}")))?;
    Ok(Value::String(formatted))
}

/// Adds the per-request defaults to `data` and renders the named page.
pub(crate) async fn render(
    templates: &Templates,
    session: &Session,
    name: &str,
    status: StatusCode,
    mut data: TemplateData,
) -> AppResult<Response> {
    data.current_year = OffsetDateTime::now_utc().year();
    data.flash = session::pop_flash(session).await?;
    data.is_authenticated = session::user_id(session).await?.is_some();
    data.csrf_token = session::csrf_token(session).await?;

    let body = templates.render(name, &data)?;
    Ok((status, Html(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> tera::Result<Value> {
        human_date(&Value::String(raw.to_owned()), &HashMap::new())
    }

    #[test]
    fn human_dates() {
        assert_eq!(date("2021-02-24T13:35:50.0286Z").unwrap(), "2021-02-24 at 13:35:50");
        assert_eq!(date("2021-02-24T13:35:50+02:00").unwrap(), "2021-02-24 at 13:35:50");
        assert_eq!(date("").unwrap(), "");
        assert!(date("yesterday").is_err());
    }

    #[test]
    fn every_page_renders_with_defaults() {
        let templates = Templates::new().unwrap();
        for (name, _) in TEMPLATES.iter().filter(|(name, _)| *name != "base.html") {
            templates
                .render(name, &TemplateData::default())
                .unwrap_or_else(|e| panic!("{name}: {e:?}"));
        }
    }

    #[test]
    fn values_are_escaped() {
        let templates = Templates::new().unwrap();
        let mut data = TemplateData {
            is_authenticated: true,
            ..Default::default()
        };
        data.form.set("title", "<script>");
        data.form.errors.add("title", "This field is required");

        let body = templates.render("create.html", &data).unwrap();
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("This field is required"));
    }
}
