use sqlx::SqlitePool;

/// Password of the seeded demonstration users.
pub const SEED_PASSWORD: &str = "Gophers4Rust!";

const SEED_TIME: &str = "2019-01-01T00:00:03.000001Z";

const SEED_USERS: [(&str, &str, &str); 2] = [
    ("bbc79841-7feb-4944-9971-07404558dfdd", "user1", "user1@example.com"),
    ("6ae4a9bf-0bff-40d5-9dbc-ce93819f4208", "user2", "user2@example.com"),
];

const SEEDS: &str = r#"
INSERT INTO tags (tag_id, name) VALUES
    ('c4c0b2e4-71a2-4676-bf04-d59667209923', 'books'),
    ('ab6f8437-ef58-4cde-9438-9fa6a9608764', 'watchlist')
    ON CONFLICT DO NOTHING;

INSERT INTO maybes (maybe_id, user_id, title, url, description, created_at, updated_at) VALUES
    ('5cf37266-3473-4006-984f-9325122678b7', 'bbc79841-7feb-4944-9971-07404558dfdd', 'Zero To Production In Rust', 'https://www.zero2prod.com', 'building backend applications with Rust', '2019-01-01T00:00:03.000001Z', '2019-01-01T00:00:03.000001Z'),
    ('45b5fbd3-755f-4379-8f07-a58d4a30fa2f', '6ae4a9bf-0bff-40d5-9dbc-ce93819f4208', 'video placeholder', 'https://www.youtube.com/watch?v=NpEaa2P7qZI', 'a video placeholder on youtube', '2019-01-01T00:00:03.000001Z', '2019-01-01T00:00:03.000001Z')
    ON CONFLICT DO NOTHING;

INSERT INTO maybetags (tag_id, maybe_id, user_id) VALUES
    ('c4c0b2e4-71a2-4676-bf04-d59667209923', '5cf37266-3473-4006-984f-9325122678b7', 'bbc79841-7feb-4944-9971-07404558dfdd'),
    ('ab6f8437-ef58-4cde-9438-9fa6a9608764', '45b5fbd3-755f-4379-8f07-a58d4a30fa2f', '6ae4a9bf-0bff-40d5-9dbc-ce93819f4208')
    ON CONFLICT DO NOTHING;
"#;

const DELETE_ALL: &str = r#"
DELETE FROM maybetags;
DELETE FROM maybes;
DELETE FROM tags;
DELETE FROM users;
"#;

/// Brings the schema up to date. Applied versions are recorded, so running
/// this again is a no-op.
pub async fn migrate(db_pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(db_pool).await
}

/// Inserts demonstration rows in one transaction.
pub async fn seed(db_pool: &SqlitePool, hash_cost: u32) -> anyhow::Result<()> {
    let password_hash = bcrypt::hash(SEED_PASSWORD, hash_cost)?;

    let mut tx = db_pool.begin().await?;
    for (user_id, name, email) in SEED_USERS {
        sqlx::query("INSERT INTO users (user_id,name,email,password_hash,active,created_at,updated_at) VALUES (?,?,?,?,TRUE,?,?) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .bind(SEED_TIME)
            .bind(SEED_TIME)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::raw_sql(SEEDS).execute(&mut *tx).await?;
    tx.commit().await?;

    Ok(())
}

/// Empties every table.
pub async fn delete_all(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = db_pool.begin().await?;
    sqlx::raw_sql(DELETE_ALL).execute(&mut *tx).await?;
    tx.commit().await
}
