use anyhow::Context;
use clap::Parser;
use maybelist::{
    AppState,
    config::{self, Config},
    db,
    router::{self, SessionSettings},
    schema, session,
};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    config::init_tracing();
    let config = Config::parse();

    let db_pool = db::connect(&config.db)
        .await
        .with_context(|| format!("opening {}", config.db.display()))?;
    schema::migrate(&db_pool).await.context("migrating database")?;

    let app_state = AppState::new(db_pool.clone(), config.bcrypt_cost)?;
    let settings = SessionSettings {
        key: session::signing_key(&config.secret)?,
        secure: config.secure_cookies,
        lifetime: time::Duration::hours(config.session_hours),
    };
    let app = router::router(app_state, settings);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("received ctrl-c, shutting down"),
            Err(e) => tracing::error!(error = %e, "listening for ctrl-c"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received terminate, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "listening for terminate");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
