//! Offline bars from a CSV file.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. The timestamp is
//! RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or epoch milliseconds. The volume
//! column may be absent or empty on every row, which yields a series flagged
//! as volume-less. A file that reports volume on some rows but not others is
//! malformed.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::provider::{DataProvider, FetchError};
use crate::domain::{Asset, Bar, Series, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Read every row of `path` into a validated series.
pub fn read_series(path: &Path, asset: &Asset, timeframe: Timeframe) -> Result<Series, FetchError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut bars = Vec::new();
    let mut any_volume = false;
    let mut first_blank_volume = None;
    for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|e| FetchError::Malformed(format!("{}: {e}", path.display())))?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            FetchError::Malformed(format!(
                "{} row {}: bad timestamp '{}'",
                path.display(),
                line + 1,
                row.timestamp
            ))
        })?;
        match row.volume {
            Some(_) => any_volume = true,
            None => {
                first_blank_volume.get_or_insert(line + 1);
            }
        }
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        });
    }

    if let (true, Some(row)) = (any_volume, first_blank_volume) {
        return Err(FetchError::Malformed(format!(
            "{} row {row}: volume missing while other rows report it",
            path.display()
        )));
    }

    let series = Series::new(asset.clone(), timeframe, bars)?;
    Ok(if any_volume {
        series
    } else {
        series.without_volume()
    })
}

/// Replays a CSV file: every fetch returns its last `limit` rows.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        let series = read_series(&self.path, asset, timeframe)?;
        if series.is_empty() {
            return Err(FetchError::NoData {
                symbol: asset.exchange_symbol(),
            });
        }
        Ok(series.tail(limit))
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn btc() -> Asset {
        Asset::crypto("BTC", "USDT")
    }

    #[test]
    fn reads_mixed_timestamp_formats() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             1704067200000,1,2,0.5,1.5,10\n\
             2024-01-01T00:05:00Z,1.5,2,1,1.8,12\n\
             2024-01-01 00:10:00,1.8,2.2,1.7,2.0,9\n",
        );
        let series = read_series(file.path(), &btc(), Timeframe::M5).unwrap();
        assert_eq!(series.closes(), vec![1.5, 1.8, 2.0]);
        assert_eq!(series.bars()[0].timestamp.timestamp_millis(), 1_704_067_200_000);
        assert!(series.volume_reported());
    }

    #[test]
    fn missing_volume_column_flags_series() {
        let file = write_csv(
            "timestamp,open,high,low,close\n\
             2024-01-01T00:00:00Z,1.09,1.10,1.08,1.095\n\
             2024-01-01T00:05:00Z,1.095,1.10,1.09,1.097\n",
        );
        let series = read_series(file.path(), &Asset::forex("EUR", "USD"), Timeframe::M5).unwrap();
        assert!(!series.volume_reported());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn partial_volume_is_malformed() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T00:00:00Z,1,1,1,1,100\n\
             2024-01-01T00:01:00Z,1,1,1,1,\n\
             2024-01-01T00:02:00Z,1,1,1,1,300\n",
        );
        let err = read_series(file.path(), &btc(), Timeframe::M1).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("row 2")));
    }

    #[test]
    fn blank_volume_on_every_row_flags_series() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T00:00:00Z,1,1,1,1,\n\
             2024-01-01T00:01:00Z,1,1,1,1,\n",
        );
        let series = read_series(file.path(), &btc(), Timeframe::M1).unwrap();
        assert!(!series.volume_reported());
    }

    #[test]
    fn provider_returns_tail() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T00:00:00Z,1,1,1,1,1\n\
             2024-01-01T00:01:00Z,2,2,2,2,1\n\
             2024-01-01T00:02:00Z,3,3,3,3,1\n",
        );
        let provider = CsvProvider::new(file.path());
        assert!(provider.is_available());
        let series = provider.fetch(&btc(), Timeframe::M1, 2).unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let file = write_csv("timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n");
        let err = read_series(file.path(), &btc(), Timeframe::M1).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("yesterday")));
    }

    #[test]
    fn unordered_rows_are_malformed() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T00:05:00Z,1,1,1,1,1\n\
             2024-01-01T00:00:00Z,1,1,1,1,1\n",
        );
        let err = read_series(file.path(), &btc(), Timeframe::M5).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn header_only_is_no_data() {
        let file = write_csv("timestamp,open,high,low,close,volume\n");
        let err = CsvProvider::new(file.path())
            .fetch(&btc(), Timeframe::M1, 10)
            .unwrap_err();
        assert!(matches!(err, FetchError::NoData { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let provider = CsvProvider::new("/nonexistent/radar/bars.csv");
        assert!(!provider.is_available());
        let err = provider.fetch(&btc(), Timeframe::M1, 10).unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
