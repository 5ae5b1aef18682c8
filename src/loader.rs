use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::db::{self, ListingRow};

const TARGET_COLUMNS: [&str; 4] = ["title", "price_original", "link", "price_cleaned"];

/// Maps a cleaned CSV header onto `listings` columns: names are trimmed and
/// lowercased, and `price` is stored as `price_original`.
fn column_indices(headers: &csv::StringRecord) -> [Option<usize>; 4] {
    let names: Vec<String> = headers
        .iter()
        .map(|h| {
            let h = h.trim().to_lowercase();
            if h == "price" {
                "price_original".to_string()
            } else {
                h
            }
        })
        .collect();
    TARGET_COLUMNS.map(|target| names.iter().position(|n| n == target))
}

pub fn read_cleaned(path: &Path) -> Result<Vec<ListingRow>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let [title, price, link, cleaned] = column_indices(reader.headers()?);
    info!("Columns {:?}", reader.headers()?.iter().collect::<Vec<_>>());
    if price.is_none() {
        warn!("⚠️ price_original not found, storing \"0\"");
    }

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty()).map(str::to_string)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let price_cleaned = match field(&record, cleaned) {
            Some(v) => Some(
                v.trim()
                    .parse::<i64>()
                    .with_context(|| format!("price_cleaned is not an integer: {:?}", v))?,
            ),
            None => None,
        };
        rows.push(ListingRow {
            title: field(&record, title),
            price_original: if price.is_some() {
                field(&record, price)
            } else {
                Some("0".to_string())
            },
            link: field(&record, link),
            price_cleaned,
        });
    }
    Ok(rows)
}

/// Replaces the `listings` table with the cleaned CSV. A missing CSV is
/// reported and skipped; it yields `Ok(None)`.
pub async fn run(csv_path: &Path, db_path: &Path) -> Result<Option<i64>> {
    if !csv_path.exists() {
        warn!("⚠️ File is not found {}", csv_path.display());
        return Ok(None);
    }
    let rows = read_cleaned(csv_path)?;

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    info!("🔌 Connecting to {}", db_path.display());
    let pool = db::connect(db_path).await?;

    let result = async {
        db::init_db(&pool).await?;
        db::insert_listings(&pool, &rows).await?;
        db::count_listings(&pool).await
    }
    .await;
    pool.close().await;

    let count = result?;
    info!("✅ {} rows loaded into listings", count);
    Ok(Some(count))
}
