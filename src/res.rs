use axum::{
    debug_handler,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{AppError, AppResult};

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn static_file(Path(file): Path<String>) -> AppResult<Response> {
    let (content_type, body): (&str, &'static [u8]) = match file.as_str() {
        "main.css" => ("text/css; charset=utf-8", &include_res!(bytes, "/static/main.css")[..]),
        _ => {
            return Err(AppError::new(
                StatusCode::NOT_FOUND,
                anyhow::anyhow!("no static file {file:?}"),
            ));
        }
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
