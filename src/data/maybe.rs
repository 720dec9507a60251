use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{Error, Result, parse_id, timestamp};

const MAX_TAG_LENGTH: usize = 50;

const SELECT_MAYBES: &str =
    "SELECT maybe_id,user_id,title,url,description,created_at,updated_at FROM maybes";

/// A saved bookmark and the names of its tags.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Maybe {
    #[sqlx(rename = "maybe_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    #[sqlx(skip)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

/// Data for creating a maybe. Tags are optional.
#[derive(Debug, Clone, Default)]
pub struct NewMaybe {
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Overrides for an existing maybe. Empty fields keep the stored value, an
/// empty tag list removes every tag.
#[derive(Debug, Clone, Default)]
pub struct UpdateMaybe {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait MaybeStore: Send + Sync {
    async fn query(&self, user_id: &str) -> Result<Vec<Maybe>>;
    async fn query_by_id(&self, maybe_id: &str, user_id: &str) -> Result<Maybe>;
    async fn query_by_tag(&self, tag: &str, user_id: &str) -> Result<Vec<Maybe>>;
    async fn query_by_title(&self, title: &str, user_id: &str) -> Result<Vec<Maybe>>;
    async fn create(&self, nm: NewMaybe, user_id: &str) -> Result<Maybe>;
    async fn update(&self, um: UpdateMaybe, maybe_id: &str, user_id: &str) -> Result<Maybe>;
    async fn delete(&self, maybe_id: &str, user_id: &str) -> Result<()>;
    async fn tags(&self, user_id: &str) -> Result<Vec<TagCount>>;
}

/// The single ownership check shared by every maybe operation.
pub fn authorize(owner_id: &str, user_id: &str) -> Result<()> {
    if owner_id == user_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// Trims and validates tag names, dropping repeats.
fn tag_names(tags: &[String]) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = tag.trim();
        if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH {
            return Err(Error::InvalidTag(name.to_owned()));
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    Ok(names)
}

async fn find_or_create_tag(conn: &mut SqliteConnection, name: &str) -> Result<String> {
    sqlx::query("INSERT INTO tags (tag_id,name) VALUES (?,?) ON CONFLICT(name) DO NOTHING")
        .bind(Uuid::now_v7().to_string())
        .bind(name)
        .execute(&mut *conn)
        .await?;

    sqlx::query_scalar::<_, String>("SELECT tag_id FROM tags WHERE name=?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::InvalidTag(name.to_owned()))
}

async fn link_tag(conn: &mut SqliteConnection, tag_id: &str, maybe_id: &str, user_id: &str) -> Result<()> {
    sqlx::query("INSERT INTO maybetags (tag_id,maybe_id,user_id) VALUES (?,?,?) ON CONFLICT(tag_id,maybe_id) DO NOTHING")
        .bind(tag_id)
        .bind(maybe_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn unlink_tag(conn: &mut SqliteConnection, name: &str, maybe_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM maybetags WHERE maybe_id=? AND tag_id=(SELECT tag_id FROM tags WHERE name=?)")
        .bind(maybe_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn prune_orphan_tags(conn: &mut SqliteConnection) -> Result<u64> {
    let pruned = sqlx::query("DELETE FROM tags WHERE tag_id NOT IN (SELECT tag_id FROM maybetags)")
        .execute(&mut *conn)
        .await?
        .rows_affected();
    Ok(pruned)
}

/// Writes the edited fields and reconciles tag links. `maybe.tags` holds the
/// links as they were read.
async fn write_update(conn: &mut SqliteConnection, maybe: &Maybe, tags: &[String], user_id: &str) -> Result<()> {
    let updated = sqlx::query("UPDATE maybes SET title=?, url=?, description=?, updated_at=? WHERE maybe_id=?")
        .bind(&maybe.title)
        .bind(&maybe.url)
        .bind(&maybe.description)
        .bind(&maybe.updated_at)
        .bind(&maybe.id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    // Deleted since it was read.
    if updated == 0 {
        return Err(Error::NotFound);
    }

    if tags.is_empty() {
        sqlx::query("DELETE FROM maybetags WHERE maybe_id=?")
            .bind(&maybe.id)
            .execute(&mut *conn)
            .await?;
        return Ok(());
    }
    for name in tags {
        let tag_id = find_or_create_tag(conn, name).await?;
        link_tag(conn, &tag_id, &maybe.id, user_id).await?;
    }
    for stale in maybe.tags.iter().filter(|t| !tags.contains(*t)) {
        unlink_tag(conn, stale, &maybe.id).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct MaybeRepo {
    db_pool: SqlitePool,
}

impl MaybeRepo {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    async fn tags_of(&self, maybe_id: &str) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar("SELECT t.name FROM tags t JOIN maybetags mt ON mt.tag_id=t.tag_id WHERE mt.maybe_id=? ORDER BY t.name")
            .bind(maybe_id)
            .fetch_all(&self.db_pool)
            .await?;
        Ok(tags)
    }

    async fn with_tags(&self, mut maybes: Vec<Maybe>) -> Result<Vec<Maybe>> {
        for maybe in maybes.iter_mut() {
            maybe.tags = self.tags_of(&maybe.id).await?;
        }
        Ok(maybes)
    }
}

#[async_trait]
impl MaybeStore for MaybeRepo {
    async fn query(&self, user_id: &str) -> Result<Vec<Maybe>> {
        let maybes = sqlx::query_as::<_, Maybe>(&format!(
            "{SELECT_MAYBES} WHERE user_id=? ORDER BY created_at DESC, maybe_id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        self.with_tags(maybes).await
    }

    async fn query_by_id(&self, maybe_id: &str, user_id: &str) -> Result<Maybe> {
        parse_id(maybe_id)?;

        let Some(mut maybe) = sqlx::query_as::<_, Maybe>(&format!("{SELECT_MAYBES} WHERE maybe_id=?"))
            .bind(maybe_id)
            .fetch_optional(&self.db_pool)
            .await?
        else {
            return Err(Error::NotFound);
        };
        authorize(&maybe.user_id, user_id)?;

        maybe.tags = self.tags_of(&maybe.id).await?;
        Ok(maybe)
    }

    async fn query_by_tag(&self, tag: &str, user_id: &str) -> Result<Vec<Maybe>> {
        let maybes = sqlx::query_as::<_, Maybe>(
            r#"SELECT m.maybe_id,m.user_id,m.title,m.url,m.description,m.created_at,m.updated_at
            FROM maybes m
            JOIN maybetags mt ON mt.maybe_id=m.maybe_id
            JOIN tags t ON t.tag_id=mt.tag_id
            WHERE t.name=? AND mt.user_id=?
            ORDER BY m.created_at DESC, m.maybe_id DESC"#,
        )
        .bind(tag.trim())
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        self.with_tags(maybes).await
    }

    async fn query_by_title(&self, title: &str, user_id: &str) -> Result<Vec<Maybe>> {
        let maybes = sqlx::query_as::<_, Maybe>(&format!(
            "{SELECT_MAYBES} WHERE user_id=? AND instr(lower(title), lower(?)) > 0 ORDER BY created_at DESC, maybe_id DESC"
        ))
        .bind(user_id)
        .bind(title.trim())
        .fetch_all(&self.db_pool)
        .await?;

        self.with_tags(maybes).await
    }

    async fn create(&self, nm: NewMaybe, user_id: &str) -> Result<Maybe> {
        let tags = tag_names(&nm.tags)?;
        let now = timestamp()?;
        let maybe = Maybe {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_owned(),
            title: nm.title,
            url: nm.url,
            description: nm.description,
            tags,
            created_at: now.clone(),
            updated_at: now,
        };

        let mut tx = self.db_pool.begin().await?;
        sqlx::query("INSERT INTO maybes (maybe_id,user_id,title,url,description,created_at,updated_at) VALUES (?,?,?,?,?,?,?)")
            .bind(&maybe.id)
            .bind(&maybe.user_id)
            .bind(&maybe.title)
            .bind(&maybe.url)
            .bind(&maybe.description)
            .bind(&maybe.created_at)
            .bind(&maybe.updated_at)
            .execute(&mut *tx)
            .await?;

        for name in &maybe.tags {
            let tag_id = find_or_create_tag(&mut tx, name).await?;
            link_tag(&mut tx, &tag_id, &maybe.id, user_id).await?;
        }
        tx.commit().await?;

        tracing::debug!(maybe_id = %maybe.id, tags = maybe.tags.len(), "created maybe");
        Ok(maybe)
    }

    async fn update(&self, um: UpdateMaybe, maybe_id: &str, user_id: &str) -> Result<Maybe> {
        let mut maybe = self.query_by_id(maybe_id, user_id).await?;
        let tags = tag_names(&um.tags)?;

        if let Some(title) = um.title.filter(|t| !t.trim().is_empty()) {
            maybe.title = title;
        }
        if let Some(url) = um.url.filter(|u| !u.trim().is_empty()) {
            maybe.url = url;
        }
        if let Some(description) = um.description.filter(|d| !d.trim().is_empty()) {
            maybe.description = description;
        }
        maybe.updated_at = timestamp()?;

        let mut tx = self.db_pool.begin().await?;
        write_update(&mut tx, &maybe, &tags, user_id).await?;
        prune_orphan_tags(&mut tx).await?;
        tx.commit().await?;

        maybe.tags = tags;
        Ok(maybe)
    }

    async fn delete(&self, maybe_id: &str, user_id: &str) -> Result<()> {
        parse_id(maybe_id)?;

        let owner_id = sqlx::query_scalar::<_, String>("SELECT user_id FROM maybes WHERE maybe_id=?")
            .bind(maybe_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(Error::NotFound)?;
        authorize(&owner_id, user_id)?;

        let mut tx = self.db_pool.begin().await?;
        sqlx::query("DELETE FROM maybes WHERE maybe_id=?")
            .bind(maybe_id)
            .execute(&mut *tx)
            .await?;
        let pruned = prune_orphan_tags(&mut tx).await?;
        tx.commit().await?;

        tracing::debug!(maybe_id, pruned, "deleted maybe");
        Ok(())
    }

    async fn tags(&self, user_id: &str) -> Result<Vec<TagCount>> {
        let tags = sqlx::query_as::<_, TagCount>(
            r#"SELECT t.name AS name, COUNT(mt.maybe_id) AS count
            FROM tags t
            JOIN maybetags mt ON mt.tag_id=t.tag_id
            WHERE mt.user_id=?
            GROUP BY t.tag_id, t.name
            ORDER BY t.name"#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{data::testing::insert_user, db};

    fn new_maybe(title: &str, tags: &[&str]) -> NewMaybe {
        NewMaybe {
            title: title.to_owned(),
            url: "https://www.rust-lang.org".to_owned(),
            description: "a language".to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn set(tags: &[String]) -> HashSet<&str> {
        tags.iter().map(String::as_str).collect()
    }

    async fn tag_rows(db_pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM tags ORDER BY name")
            .fetch_all(db_pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn created_tags_come_back_on_fetch() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        let created = repo.create(new_maybe("Rust", &["go", "web"]), &user).await.unwrap();
        let fetched = repo.query_by_id(&created.id, &user).await.unwrap();

        assert_eq!(set(&fetched.tags), HashSet::from(["go", "web"]));
        assert_eq!(fetched.title, "Rust");
    }

    #[tokio::test]
    async fn repeated_tags_collapse() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        let created = repo.create(new_maybe("Rust", &["web", " web ", "go"]), &user).await.unwrap();
        let fetched = repo.query_by_id(&created.id, &user).await.unwrap();

        assert_eq!(fetched.tags, vec!["go".to_owned(), "web".to_owned()]);
    }

    #[tokio::test]
    async fn tags_are_reused_across_maybes() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool.clone());

        repo.create(new_maybe("one", &["books"]), &user).await.unwrap();
        repo.create(new_maybe("two", &["books"]), &user).await.unwrap();

        assert_eq!(tag_rows(&db_pool).await, vec!["books".to_owned()]);
        let counts = repo.tags(&user).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 2);
    }

    #[tokio::test]
    async fn update_reconciles_tag_links() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool.clone());

        let created = repo.create(new_maybe("Rust", &["a", "b"]), &user).await.unwrap();
        let b_before: String = sqlx::query_scalar("SELECT tag_id FROM tags WHERE name='b'")
            .fetch_one(&db_pool)
            .await
            .unwrap();

        let update = UpdateMaybe {
            tags: vec!["b".to_owned(), "c".to_owned()],
            ..Default::default()
        };
        repo.update(update, &created.id, &user).await.unwrap();

        let fetched = repo.query_by_id(&created.id, &user).await.unwrap();
        assert_eq!(set(&fetched.tags), HashSet::from(["b", "c"]));
        assert_eq!(fetched.title, "Rust");

        let b_after: String = sqlx::query_scalar("SELECT tag_id FROM tags WHERE name='b'")
            .fetch_one(&db_pool)
            .await
            .unwrap();
        assert_eq!(b_before, b_after);
        assert_eq!(tag_rows(&db_pool).await, vec!["b".to_owned(), "c".to_owned()]);
    }

    #[tokio::test]
    async fn update_without_tags_clears_links() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool.clone());

        let created = repo.create(new_maybe("Rust", &["a"]), &user).await.unwrap();
        let update = UpdateMaybe {
            title: Some("Rust 2024".to_owned()),
            url: Some(String::new()),
            ..Default::default()
        };
        let updated = repo.update(update, &created.id, &user).await.unwrap();

        assert_eq!(updated.title, "Rust 2024");
        assert_eq!(updated.url, "https://www.rust-lang.org");
        assert!(repo.query_by_id(&created.id, &user).await.unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn update_of_a_vanished_maybe_is_not_found() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool.clone());

        let created = repo.create(new_maybe("Rust", &["a"]), &user).await.unwrap();
        let stale = repo.query_by_id(&created.id, &user).await.unwrap();
        repo.delete(&created.id, &user).await.unwrap();

        let mut tx = db_pool.begin().await.unwrap();
        let res = write_update(&mut tx, &stale, &["b".to_owned()], &user).await;
        assert!(matches!(res, Err(Error::NotFound)));
        tx.rollback().await.unwrap();

        assert!(tag_rows(&db_pool).await.is_empty());
    }

    #[tokio::test]
    async fn delete_prunes_only_orphaned_tags() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool.clone());

        let first = repo.create(new_maybe("one", &["rare", "shared"]), &user).await.unwrap();
        repo.create(new_maybe("two", &["shared"]), &user).await.unwrap();

        repo.delete(&first.id, &user).await.unwrap();

        assert_eq!(tag_rows(&db_pool).await, vec!["shared".to_owned()]);
        assert!(matches!(repo.query_by_id(&first.id, &user).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn other_users_maybe_is_forbidden() {
        let db_pool = db::memory().await;
        let owner = insert_user(&db_pool, "a@example.com").await;
        let other = insert_user(&db_pool, "b@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        let created = repo.create(new_maybe("mine", &[]), &owner).await.unwrap();

        assert!(matches!(repo.query_by_id(&created.id, &other).await, Err(Error::Forbidden)));
        assert!(matches!(repo.delete(&created.id, &other).await, Err(Error::Forbidden)));
        assert!(matches!(
            repo.update(UpdateMaybe::default(), &created.id, &other).await,
            Err(Error::Forbidden)
        ));
    }

    #[tokio::test]
    async fn malformed_and_unknown_ids() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        assert!(matches!(repo.query_by_id("nope", &user).await, Err(Error::InvalidId)));
        assert!(matches!(repo.delete("nope", &user).await, Err(Error::InvalidId)));
        let unknown = Uuid::now_v7().to_string();
        assert!(matches!(repo.query_by_id(&unknown, &user).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn invalid_tags_are_rejected_before_writing() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        let long = "x".repeat(MAX_TAG_LENGTH + 1);
        assert!(matches!(
            repo.create(new_maybe("one", &["ok", ""]), &user).await,
            Err(Error::InvalidTag(_))
        ));
        assert!(matches!(
            repo.create(new_maybe("one", &[long.as_str()]), &user).await,
            Err(Error::InvalidTag(_))
        ));
        assert!(repo.query(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filters_by_title_and_tag_per_user() {
        let db_pool = db::memory().await;
        let user = insert_user(&db_pool, "a@example.com").await;
        let other = insert_user(&db_pool, "b@example.com").await;
        let repo = MaybeRepo::new(db_pool);

        repo.create(new_maybe("Go Web Programming", &["books"]), &user).await.unwrap();
        repo.create(new_maybe("Rust in Action", &["books", "rust"]), &user).await.unwrap();
        repo.create(new_maybe("Programming Rust", &["books"]), &other).await.unwrap();

        let found = repo.query_by_title("programming", &user).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Go Web Programming");

        assert_eq!(repo.query_by_tag("books", &user).await.unwrap().len(), 2);
        assert_eq!(repo.query_by_tag("rust", &other).await.unwrap().len(), 0);
        assert!(repo.query_by_title("missing", &user).await.unwrap().is_empty());

        let names: Vec<String> = repo.tags(&other).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["books".to_owned()]);
    }
}
