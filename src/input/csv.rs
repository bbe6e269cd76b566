use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::core::CollisionRecord;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Load collision records from a CSV file.
///
/// Column positions are detected from the header row, accepting common name
/// variants. Field parsing is permissive: a blank or garbage cell loads as
/// `None` on that record rather than failing the file. Only I/O and a
/// missing header are errors.
pub fn load_csv(path: &str) -> Result<Vec<CollisionRecord>> {
    let file = std::fs::File::open(Path::new(path))
        .with_context(|| format!("failed to open {}", path))?;
    let records = parse_records(file)?;
    info!(path, records = records.len(), "collision CSV loaded");
    Ok(records)
}

/// Parse collision records from any CSV reader.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<CollisionRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers().context("failed to read CSV header")?;
    let columns = Columns::detect(headers)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.context("failed to read CSV row")?;
        records.push(columns.parse_row(&row));
    }

    Ok(records)
}

/// Detected column indices. Only `year` is required; the other columns are
/// optional so partial exports still load.
struct Columns {
    year: usize,
    date: Option<usize>,
    time: Option<usize>,
    longitude: Option<usize>,
    latitude: Option<usize>,
}

impl Columns {
    fn detect(headers: &csv::StringRecord) -> Result<Self> {
        Ok(Self {
            year: find_column(headers, &["year", "yr"])
                .context("CSV has no year column")?,
            date: find_column(headers, &["date", "day"]).ok(),
            time: find_column(headers, &["time", "time_of_day"]).ok(),
            longitude: find_column(headers, &["longitude", "lon", "lng"]).ok(),
            latitude: find_column(headers, &["latitude", "lat"]).ok(),
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> CollisionRecord {
        CollisionRecord {
            year: field(row, Some(self.year)).and_then(|s| s.parse::<i32>().ok()),
            date: field(row, self.date)
                .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()),
            time: field(row, self.time)
                .and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok()),
            longitude: field(row, self.longitude).and_then(|s| s.parse::<f64>().ok()),
            latitude: field(row, self.latitude).and_then(|s| s.parse::<f64>().ok()),
        }
    }
}

/// Non-empty trimmed cell at an optional column index.
fn field<'a>(row: &'a csv::StringRecord, idx: Option<usize>) -> Option<&'a str> {
    let cell = row.get(idx?)?.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell)
    }
}

/// Find a column by checking possible names, case-insensitively.
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    anyhow::bail!("could not find column with names: {:?}", names)
}
