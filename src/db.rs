use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

/// One row of the `listings` table, minus the generated id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRow {
    pub title: Option<String>,
    pub price_original: Option<String>,
    pub link: Option<String>,
    pub price_cleaned: Option<i64>,
}

pub async fn connect(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(1).connect_with(options).await?;
    Ok(pool)
}

/// Drops and recreates `listings`; a load always replaces the previous one.
pub async fn init_db(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS listings").execute(pool).await?;
    sqlx::query(
        r#"
        CREATE TABLE listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            price_original TEXT,
            link TEXT,
            price_cleaned INTEGER
        );
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_listings(pool: &SqlitePool, rows: &[ListingRow]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for row in rows {
        sqlx::query("INSERT INTO listings (title, price_original, link, price_cleaned) VALUES (?, ?, ?, ?)")
            .bind(&row.title)
            .bind(&row.price_original)
            .bind(&row.link)
            .bind(row.price_cleaned)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn count_listings(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT count(*) FROM listings").fetch_one(pool).await?;
    Ok(row.try_get(0)?)
}

pub async fn fetch_listings(pool: &SqlitePool) -> Result<Vec<ListingRow>> {
    let rows = sqlx::query("SELECT title, price_original, link, price_cleaned FROM listings ORDER BY id")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| {
            Ok(ListingRow {
                title: row.try_get("title")?,
                price_original: row.try_get("price_original")?,
                link: row.try_get("link")?,
                price_cleaned: row.try_get("price_cleaned")?,
            })
        })
        .collect()
}
