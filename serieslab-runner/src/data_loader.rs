//! Bar loading for the runner.
//!
//! Reads OHLCV bars from a CSV file with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are either a date
//! (`2024-01-02`) or a date-time (`2024-01-02 09:30:00`). Rows must be in
//! time order; the loader checks this rather than sorting silently.
//!
//! Every load produces a BLAKE3 dataset hash so sweep summaries can name the
//! exact bars they were computed on.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serieslab_core::domain::Bar;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: timestamp {timestamp} is not after the previous bar")]
    OutOfOrder { row: usize, timestamp: NaiveDateTime },

    #[error("'{0}' contains no bars")]
    Empty(PathBuf),
}

/// Bars plus their provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    /// BLAKE3 over every bar's timestamp and OHLCV bits.
    pub dataset_hash: String,
    /// Rows with a NaN field or failing the OHLC sanity check.
    pub void_bars: usize,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Load bars from a CSV file.
pub fn load_bars(path: impl AsRef<Path>) -> Result<LoadedData, LoadError> {
    let path = path.as_ref();
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut bars: Vec<Bar> = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(csv_err)?;
        // Row numbers are 1-based and skip the header
        let row_no = i + 2;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: row_no,
            value: row.timestamp.clone(),
        })?;
        if bars.last().is_some_and(|prev| prev.timestamp >= timestamp) {
            return Err(LoadError::OutOfOrder {
                row: row_no,
                timestamp,
            });
        }
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let void_bars = bars.iter().filter(|b| b.is_void() || !b.is_sane()).count();
    if void_bars > 0 {
        warn!(path = %path.display(), void_bars, "loaded bars with NaN or inconsistent OHLC");
    }

    let dataset_hash = dataset_hash(&bars);
    debug!(path = %path.display(), bars = bars.len(), %dataset_hash, "bars loaded");
    Ok(LoadedData {
        bars,
        dataset_hash,
        void_bars,
    })
}

/// BLAKE3 hex digest over timestamps and OHLCV bit patterns.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
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

    #[test]
    fn loads_dates_and_datetimes() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-02,10,11,9,10.5,1000\n\
             2024-01-03 00:00:00,10.5,12,10,11.5,1200\n",
        );
        let loaded = load_bars(file.path()).unwrap();
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.bars[1].close, 11.5);
        assert_eq!(loaded.void_bars, 0);
        assert_eq!(loaded.dataset_hash.len(), 64);
    }

    #[test]
    fn hash_depends_on_values() {
        let a = write_csv("timestamp,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.5,10\n");
        let b = write_csv("timestamp,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.6,10\n");
        let ha = load_bars(a.path()).unwrap().dataset_hash;
        let hb = load_bars(b.path()).unwrap().dataset_hash;
        assert_ne!(ha, hb);
        assert_eq!(ha, load_bars(a.path()).unwrap().dataset_hash);
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-03,1,2,0.5,1.5,10\n\
             2024-01-02,1,2,0.5,1.5,10\n",
        );
        let err = load_bars(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::OutOfOrder { row: 3, .. }));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let file = write_csv("timestamp,open,high,low,close,volume\nyesterday,1,2,0.5,1.5,10\n");
        assert!(matches!(
            load_bars(file.path()).unwrap_err(),
            LoadError::Timestamp { row: 2, .. }
        ));
    }

    #[test]
    fn rejects_empty_and_missing_files() {
        let file = write_csv("timestamp,open,high,low,close,volume\n");
        assert!(matches!(load_bars(file.path()).unwrap_err(), LoadError::Empty(_)));
        assert!(matches!(
            load_bars("/definitely/not/here.csv").unwrap_err(),
            LoadError::Csv { .. }
        ));
    }

    #[test]
    fn counts_void_bars() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-02,1,2,0.5,1.5,10\n\
             2024-01-03,1,0.5,2,1.5,10\n",
        );
        assert_eq!(load_bars(file.path()).unwrap().void_bars, 1);
    }
}
