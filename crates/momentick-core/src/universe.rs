//! Constituent universe: the index family table and the loaders that supply
//! each index's ordered constituent list.
//!
//! A workbook universe holds one sheet per index, named after the index,
//! with `Code`, `Name` and `Weight` columns in any order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ConstituentRecord, SymbolFamily, ValidationError};

/// Universe loading errors.
#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to open workbook '{path}': {message}")]
    Open { path: String, message: String },

    #[error("index '{index}' is not part of the universe")]
    UnknownIndex { index: String },

    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("sheet '{sheet}' has no '{column}' column")]
    MissingColumn {
        sheet: String,
        column: &'static str,
    },

    #[error("sheet '{sheet}' row {row}: {source}")]
    InvalidRow {
        sheet: String,
        row: usize,
        #[source]
        source: ValidationError,
    },
}

/// An index and the symbol family its constituent codes belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub family: SymbolFamily,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, family: SymbolFamily) -> Self {
        Self {
            name: name.into(),
            family,
        }
    }
}

/// The four indices of the default universe, in display order.
pub fn default_indices() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new("HSI", SymbolFamily::Numeric),
        IndexSpec::new("HSTECH", SymbolFamily::Numeric),
        IndexSpec::new("HSCEI", SymbolFamily::Numeric),
        IndexSpec::new("SP 500", SymbolFamily::Alphabetic),
    ]
}

/// Looks up an index by name, ignoring ASCII case.
pub fn find_index<'a>(indices: &'a [IndexSpec], name: &str) -> Result<&'a IndexSpec, UniverseError> {
    indices
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| UniverseError::UnknownIndex {
            index: name.to_owned(),
        })
}

/// Source of per-index constituent lists.
///
/// The returned order is the display order; duplicate codes are kept.
pub trait UniverseLoader: Send + Sync {
    fn load_universe(&self, index: &str) -> Result<Vec<ConstituentRecord>, UniverseError>;
}

/// Spreadsheet-backed universe (`.xlsx`, `.xls`, `.ods`).
#[derive(Debug, Clone)]
pub struct WorkbookUniverse {
    path: PathBuf,
}

impl WorkbookUniverse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UniverseLoader for WorkbookUniverse {
    fn load_universe(&self, index: &str) -> Result<Vec<ConstituentRecord>, UniverseError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| UniverseError::Open {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let sheet = workbook
            .sheet_names()
            .iter()
            .find(|name| name.trim().eq_ignore_ascii_case(index.trim()))
            .cloned()
            .ok_or_else(|| UniverseError::UnknownIndex {
                index: index.to_owned(),
            })?;

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| UniverseError::Sheet {
                sheet: sheet.clone(),
                message: e.to_string(),
            })?;

        let records = records_from_range(&sheet, &range)?;
        tracing::debug!(
            path = %self.path.display(),
            sheet = %sheet,
            constituents = records.len(),
            "workbook universe loaded"
        );
        Ok(records)
    }
}

static EMPTY_CELL: Data = Data::Empty;

fn records_from_range(sheet: &str, range: &Range<Data>) -> Result<Vec<ConstituentRecord>, UniverseError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| UniverseError::MissingColumn {
        sheet: sheet.to_owned(),
        column: "Code",
    })?;

    let column = |name: &'static str| {
        header
            .iter()
            .position(|cell| cell_text(cell).eq_ignore_ascii_case(name))
            .ok_or_else(|| UniverseError::MissingColumn {
                sheet: sheet.to_owned(),
                column: name,
            })
    };
    let code_col = column("Code")?;
    let name_col = column("Name")?;
    let weight_col = column("Weight")?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        let cell = |col: usize| row.get(col).unwrap_or(&EMPTY_CELL);
        if row.iter().all(|cell| cell_text(cell).is_empty()) {
            continue;
        }

        // Header is spreadsheet row first_row + 1; data starts one below.
        let row_number = first_row + offset + 2;
        let invalid_row = |source| UniverseError::InvalidRow {
            sheet: sheet.to_owned(),
            row: row_number,
            source,
        };

        let weight = cell_number(cell(weight_col)).map_err(invalid_row)?;
        let record = ConstituentRecord::new(cell_text(cell(code_col)), cell_text(cell(name_col)), weight)
            .map_err(invalid_row)?;
        records.push(record);
    }

    Ok(records)
}

/// Cell as text; whole floats print without a fraction so a numeric code
/// cell `5.0` reads as `"5"`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.trim().to_owned(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_owned(),
    }
}

fn cell_number(cell: &Data) -> Result<f64, ValidationError> {
    match cell {
        Data::Float(value) => Ok(*value),
        Data::Int(value) => Ok(*value as f64),
        other => {
            let text = cell_text(other);
            text.trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidWeight { value: text })
        }
    }
}

/// In-memory universe.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    indices: HashMap<String, Vec<ConstituentRecord>>,
}

impl StaticUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, index: impl Into<String>, records: Vec<ConstituentRecord>) -> Self {
        self.indices.insert(index.into(), records);
        self
    }

    /// Small built-in universe covering the default indices, for offline runs.
    pub fn demo() -> Self {
        Self::new()
            .with_index(
                "HSI",
                demo_records(&[
                    ("5", "HSBC Holdings", 8.21),
                    ("700", "Tencent", 9.64),
                    ("9988", "Alibaba", 7.12),
                    ("1299", "AIA", 5.87),
                    ("941", "China Mobile", 4.03),
                    ("388", "HKEX", 3.35),
                ]),
            )
            .with_index(
                "HSTECH",
                demo_records(&[
                    ("700", "Tencent", 8.02),
                    ("9988", "Alibaba", 7.86),
                    ("3690", "Meituan", 7.95),
                    ("1810", "Xiaomi", 8.11),
                    ("9618", "JD.com", 5.48),
                ]),
            )
            .with_index(
                "HSCEI",
                demo_records(&[
                    ("939", "China Construction Bank", 6.12),
                    ("1398", "ICBC", 4.73),
                    ("3988", "Bank of China", 3.91),
                    ("2318", "Ping An", 4.45),
                ]),
            )
            .with_index(
                "SP 500",
                demo_records(&[
                    ("AAPL", "Apple", 7.02),
                    ("MSFT", "Microsoft", 6.81),
                    ("NVDA", "NVIDIA", 6.55),
                    ("AMZN", "Amazon", 3.74),
                    ("GOOGL", "Alphabet", 2.08),
                ]),
            )
    }

    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indices.keys().cloned().collect();
        names.sort();
        names
    }
}

fn demo_records(rows: &[(&str, &str, f64)]) -> Vec<ConstituentRecord> {
    rows.iter()
        .map(|(code, name, weight)| {
            ConstituentRecord::new(*code, *name, *weight).expect("demo entries are valid")
        })
        .collect()
}

impl UniverseLoader for StaticUniverse {
    fn load_universe(&self, index: &str) -> Result<Vec<ConstituentRecord>, UniverseError> {
        self.indices
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(index.trim()))
            .map(|(_, records)| records.clone())
            .ok_or_else(|| UniverseError::UnknownIndex {
                index: index.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[[Data; 3]]) -> Range<Data> {
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, 2));
        for (row, cells) in rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                range.set_value((row as u32, col as u32), cell.clone());
            }
        }
        range
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_owned())
    }

    #[test]
    fn reads_rows_in_sheet_order_with_numeric_codes() {
        let range = sheet(&[
            [text("weight"), text("CODE"), text("Name")],
            [Data::Float(8.2), Data::Float(5.0), text("HSBC")],
            [Data::Empty, Data::Empty, Data::Empty],
            [text("9.6%"), text(" 700 "), text("Tencent")],
            [Data::Int(1), Data::Float(5.0), text("HSBC again")],
        ]);

        let records = records_from_range("HSI", &range).expect("valid sheet");
        let codes: Vec<&str> = records.iter().map(|record| record.code()).collect();
        assert_eq!(codes, vec!["5", "700", "5"]);
        assert_eq!(records[1].weight(), 9.6);
        assert_eq!(records[2].name(), "HSBC again");
    }

    #[test]
    fn missing_column_is_reported() {
        let range = sheet(&[[text("Code"), text("Name"), text("Shares")]]);
        let err = records_from_range("HSI", &range).expect_err("no weight column");
        assert!(matches!(
            err,
            UniverseError::MissingColumn {
                column: "Weight",
                ..
            }
        ));
    }

    #[test]
    fn bad_weight_names_the_row() {
        let range = sheet(&[
            [text("Code"), text("Name"), text("Weight")],
            [text("5"), text("HSBC"), text("heavy")],
        ]);
        let err = records_from_range("HSI", &range).expect_err("bad weight");
        assert!(matches!(
            err,
            UniverseError::InvalidRow {
                row: 2,
                source: ValidationError::InvalidWeight { .. },
                ..
            }
        ));
    }

    #[test]
    fn missing_workbook_fails_to_open() {
        let universe = WorkbookUniverse::new("/nonexistent/Index-Weight.xlsx");
        let err = universe.load_universe("HSI").expect_err("missing file");
        assert!(matches!(err, UniverseError::Open { .. }));
    }

    #[test]
    fn demo_universe_covers_default_indices() {
        let universe = StaticUniverse::demo();
        for spec in default_indices() {
            let records = universe.load_universe(&spec.name).expect("demo index");
            assert!(!records.is_empty());
            for record in &records {
                spec.family
                    .resolve(record.code())
                    .expect("demo codes resolve in their family");
            }
        }
        assert!(matches!(
            universe.load_universe("DAX"),
            Err(UniverseError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn index_lookup_ignores_case() {
        let indices = default_indices();
        assert_eq!(
            find_index(&indices, "sp 500").expect("known").family,
            SymbolFamily::Alphabetic
        );
        assert!(find_index(&indices, "NIKKEI").is_err());
    }
}
