//! CSV file data adapter.
//!
//! Files carry a `date,open,high,low,close,volume` header with `YYYY-MM-DD`
//! dates. Rows are returned in file order; ordering problems surface later as
//! data integrity errors.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `SYMBOL` resolves to `<base>/SYMBOL.csv`; anything already ending in
    /// `.csv` is taken as a path relative to the base (or absolute).
    fn csv_path(&self, symbol: &str) -> PathBuf {
        if symbol.ends_with(".csv") {
            self.base_path.join(symbol)
        } else {
            self.base_path.join(format!("{symbol}.csv"))
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, symbol: &str) -> Result<Vec<OhlcvBar>, BacktestError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        rdr.deserialize::<OhlcvBar>()
            .enumerate()
            .map(|(row, result)| {
                result.map_err(|e| BacktestError::Data {
                    reason: format!("{} row {}: {}", path.display(), row + 1, e),
                })
            })
            .collect()
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktestError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BacktestError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
