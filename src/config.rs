use std::{net::SocketAddr, path::PathBuf};

use clap::{ArgAction, Parser};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,tower_http=info";

/// Web server settings. Every flag falls back to an environment variable,
/// and a `.env` file is loaded first.
#[derive(Clone, Parser)]
#[command(version, about = "Maybe List web server")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "MAYBE_ADDR", default_value = "0.0.0.0:4000")]
    pub addr: SocketAddr,

    /// Session cookie signing secret, at least 64 bytes
    #[arg(long, env = "MAYBE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "database.sqlite")]
    pub db: PathBuf,

    /// Mark the session cookie Secure
    #[arg(long, env = "MAYBE_SECURE_COOKIES", default_value_t = true, action = ArgAction::Set)]
    pub secure_cookies: bool,

    /// Hours of inactivity before a session expires
    #[arg(long, env = "MAYBE_SESSION_HOURS", default_value_t = 12)]
    pub session_hours: i64,

    #[arg(long, env = "MAYBE_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}
