use std::fs;
use std::path::Path;
use tracing::info;

use crate::collector::Accumulator;
use crate::error::ScrapeError;
use crate::models::CandidateRecord;

pub const RAW_HEADER: [&str; 3] = ["title", "price", "link"];

/// The final, bounded set of records handed to the cleaning stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<CandidateRecord>,
}

impl Dataset {
    /// Takes the accumulated records in insertion order, capped at `target_count`.
    pub fn emit(accumulator: Accumulator, target_count: usize) -> Self {
        let mut records = accumulator.into_records();
        records.truncate(target_count);
        Self { records }
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes `title,price,link` rows, header first even when empty.
    pub fn write_csv(&self, path: &Path) -> Result<(), ScrapeError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(RAW_HEADER)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!("💾 Data collected: {} rows -> {}", self.records.len(), path.display());
        Ok(())
    }
}
