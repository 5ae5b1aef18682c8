use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::num::IntErrorKind;
use std::path::Path;
use tracing::{info, warn};

use crate::models::{CleanedRecord, NO_PRICE};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const CLEANED_HEADER: [&str; 4] = ["title", "price", "link", "price_cleaned"];

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("static regex"));

/// One row of the raw dataset. Every column may be blank.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawRow {
    pub title: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Default)]
pub struct CleanReport {
    pub original: usize,
    pub after_dedup: usize,
    pub rows: Vec<CleanedRecord>,
}

/// Digits of the price text read as one integer; no digits is 0. Digits
/// beyond the `INTEGER` column range saturate at `i64::MAX`.
pub fn clean_price(value: Option<&str>) -> i64 {
    let digits = match value {
        None => return 0,
        Some(v) if v == NO_PRICE => return 0,
        Some(v) => NON_DIGIT.replace_all(v, ""),
    };
    match digits.parse::<i64>() {
        Ok(price) => price,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(_) => 0,
    }
}

pub fn clean_rows(rows: Vec<RawRow>) -> CleanReport {
    let original = rows.len();

    let mut seen = HashSet::new();
    let unique: Vec<RawRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.link.clone().unwrap_or_default()))
        .collect();
    let after_dedup = unique.len();

    let rows = unique
        .into_iter()
        .map(|row| {
            let price_cleaned = clean_price(row.price.as_deref());
            CleanedRecord {
                title: row
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                price: row.price.unwrap_or_default(),
                link: row.link.unwrap_or_default(),
                price_cleaned,
            }
        })
        .filter(|row| row.price_cleaned > 0)
        .collect();

    CleanReport {
        original,
        after_dedup,
        rows,
    }
}

/// Reads the raw CSV, cleans it and writes the cleaned CSV. A missing input
/// file is reported and skipped; it yields `Ok(None)`.
pub fn run(input: &Path, output: &Path) -> Result<Option<usize>> {
    if !input.exists() {
        warn!("⚠️ {} not found, nothing to clean", input.display());
        return Ok(None);
    }

    let mut reader = csv::Reader::from_path(input).with_context(|| format!("opening {}", input.display()))?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawRow>, _>>()
        .with_context(|| format!("parsing {}", input.display()))?;

    let report = clean_rows(rows);
    info!("Original data collected: {}", report.original);
    info!("After removing duplicates: {}", report.after_dedup);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output)
        .with_context(|| format!("creating {}", output.display()))?;
    writer.write_record(CLEANED_HEADER)?;
    for row in &report.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("🧽 Cleaned dataset size = {}", report.rows.len());
    Ok(Some(report.rows.len()))
}
