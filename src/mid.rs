use std::{any::Any, sync::Arc};

use axum::{
    Form,
    body::Body,
    extract::{FromRequest, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    AppError, AppResult,
    data::{self, UserStore},
    session::{self, CSRF_TOKEN, RETURN_URL, USER_ID},
};

const MAX_FORM_BYTES: usize = 64 * 1024;

/// Attached to requests whose session belongs to an active user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
}

pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    res
}

/// Turns a handler panic into a 500 and closes the connection.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = detail, "handler panicked");

    let mut res = (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    res.headers_mut().insert(header::CONNECTION, HeaderValue::from_static("close"));
    res
}

/// Loads the session user. A user that no longer exists or was deactivated
/// is dropped from the session.
pub async fn authenticate(
    State(users): State<Arc<dyn UserStore>>,
    session: Session,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    if let Some(user_id) = session::user_id(&session).await? {
        match users.query_by_id(&user_id).await {
            Ok(user) if user.active => {
                req.extensions_mut().insert(AuthenticatedUser { id: user.id });
            }
            Ok(_) | Err(data::Error::NotFound | data::Error::InvalidId) => {
                tracing::info!(%user_id, "dropping stale session user");
                session.remove::<String>(USER_ID).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(next.run(req).await)
}

pub async fn require_authentication(session: Session, req: Request, next: Next) -> AppResult<Response> {
    if req.extensions().get::<AuthenticatedUser>().is_none() {
        if req.method() == Method::GET {
            let path = req.uri().path_and_query().map_or("/", |p| p.as_str());
            session.insert(RETURN_URL, path).await?;
        }
        return Ok(Redirect::to("/users/login").into_response());
    }

    let mut res = next.run(req).await;
    res.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(res)
}

#[derive(Deserialize)]
struct CsrfField {
    csrf_token: Option<String>,
}

/// Unsafe methods must post a `csrf_token` equal to the session's token.
pub async fn verify_csrf(session: Session, req: Request, next: Next) -> AppResult<Response> {
    if matches!(*req.method(), Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE) {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::new(StatusCode::PAYLOAD_TOO_LARGE, e))?;

    let mut form_req = Request::new(Body::from(bytes.clone()));
    *form_req.method_mut() = parts.method.clone();
    *form_req.headers_mut() = parts.headers.clone();
    let submitted = match Form::<CsrfField>::from_request(form_req, &()).await {
        Ok(Form(field)) => field.csrf_token,
        Err(_) => None,
    };
    let expected = session.get::<String>(CSRF_TOKEN).await?;

    match (submitted, expected) {
        (Some(submitted), Some(expected)) if submitted == expected => {}
        _ => {
            return Err(AppError::new(
                StatusCode::BAD_REQUEST,
                anyhow::anyhow!("csrf token mismatch on {} {}", parts.method, parts.uri),
            ));
        }
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    fn request(uri: &str) -> Request {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn secure_headers_are_set() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(secure_headers));

        let res = app.oneshot(request("/")).await.unwrap();

        assert_eq!(res.headers()["x-xss-protection"], "1; mode=block");
        assert_eq!(res.headers()["x-frame-options"], "deny");
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn panics_become_500_and_close() {
        async fn boom() -> &'static str {
            panic!("boom")
        }
        let app = Router::new()
            .route("/", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let res = app.oneshot(request("/")).await.unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[header::CONNECTION], "close");
    }
}
