//! CSV export of a dataset for spreadsheet review.

use crate::error::Result;
use crate::record::{Dataset, PublicationRecord};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Column order of the exported CSV.
pub const CSV_COLUMNS: &[&str] = &[
    "title",
    "author",
    "year",
    "citation_count",
    "url",
    "keywords",
    "abstract",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    author: &'a str,
    year: &'a str,
    citation_count: Option<u64>,
    url: &'a str,
    keywords: &'a str,
    #[serde(rename = "abstract")]
    abstract_text: &'a str,
}

impl<'a> From<&'a PublicationRecord> for CsvRow<'a> {
    fn from(record: &'a PublicationRecord) -> Self {
        Self {
            title: &record.title,
            author: &record.author,
            year: &record.year,
            citation_count: record.citation_count,
            url: &record.resolved_link,
            keywords: &record.keywords,
            abstract_text: &record.abstract_text,
        }
    }
}

/// Save a dataset as CSV. Writes only the header row for an empty dataset.
pub fn save_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(CSV_COLUMNS)?;
    for record in dataset.iter() {
        wtr.serialize(CsvRow::from(record))?;
    }

    wtr.flush()?;
    info!(path = %path.display(), rows = dataset.len(), "Saved CSV");
    Ok(())
}
