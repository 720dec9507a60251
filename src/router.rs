use axum::{Router, middleware, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer,
    cookie::{Key, SameSite},
};

use crate::{AppState, debug, index, maybes, mid, res, tags, users};

pub struct SessionSettings {
    pub key: Key,
    pub secure: bool,
    pub lifetime: time::Duration,
}

/// Routes that need the session run inside session, CSRF and
/// authentication layers; health and static files skip them.
pub fn router(state: AppState, settings: SessionSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(settings.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(settings.lifetime))
        .with_signed(settings.key);

    let protected = Router::new()
        .merge(maybes::router())
        .merge(tags::router())
        .merge(users::protected_router())
        .route_layer(middleware::from_fn(mid::require_authentication));

    let dynamic = Router::new()
        .route("/", get(index::index))
        .merge(users::router())
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), mid::authenticate))
        .layer(middleware::from_fn(mid::verify_csrf))
        .layer(session_layer);

    Router::new()
        .merge(dynamic)
        .route("/debug/health", get(debug::health))
        .route("/static/{file}", get(res::static_file))
        .layer(CatchPanicLayer::custom(mid::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(mid::secure_headers))
        .with_state(state)
}
