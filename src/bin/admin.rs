use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use maybelist::{config, db, schema};

#[derive(Parser)]
#[command(version, about = "Maybe List database administration")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "database.sqlite", global = true)]
    db: PathBuf,

    #[arg(long, env = "MAYBE_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST, global = true)]
    bcrypt_cost: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bring the schema up to date
    Migrate,
    /// Insert demonstration users, tags and maybes
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    config::init_tracing();
    let cli = Cli::parse();

    let db_pool = db::connect(&cli.db)
        .await
        .with_context(|| format!("opening {}", cli.db.display()))?;

    match cli.command {
        Command::Migrate => {
            schema::migrate(&db_pool).await.context("migrating database")?;
            tracing::info!("migrations complete");
        }
        Command::Seed => {
            schema::migrate(&db_pool).await.context("migrating database")?;
            schema::seed(&db_pool, cli.bcrypt_cost).await.context("seeding database")?;
            tracing::info!("seed data complete");
        }
    }

    db_pool.close().await;
    Ok(())
}
