//! In-memory tabular data
//!
//! A [`DataFrame`] is a list of named, equally long columns. Column types are
//! inferred once at load time: a column is numeric when every non-null cell
//! parses as a finite number, otherwise it is text.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::coerce::{is_null_token, parse_numeric, render_number};
use crate::errors::{CoreError, Result};

/// Cell storage for a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a numeric column
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Create a text column
    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Infer the column type from raw cells.
    fn infer(name: String, raw: Vec<Option<String>>) -> Self {
        let parsed: Vec<Option<f64>> = raw
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_numeric))
            .collect();
        let all_numeric = raw
            .iter()
            .zip(parsed.iter())
            .all(|(cell, num)| cell.is_none() || num.is_some());

        if all_numeric {
            Self::numeric(name, parsed)
        } else {
            Self::text(name, raw)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the column was typed numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Number of non-null cells
    pub fn non_null_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().filter(|c| c.is_some()).count(),
            ColumnData::Text(v) => v.iter().filter(|c| c.is_some()).count(),
        }
    }

    /// Number of cells that can be coerced to a number
    pub fn numeric_count(&self) -> usize {
        self.to_numeric().iter().filter(|c| c.is_some()).count()
    }

    /// Coerce every cell to a number; non-coercible cells become `None`.
    pub fn to_numeric(&self) -> Vec<Option<f64>> {
        match &self.data {
            ColumnData::Numeric(v) => v.clone(),
            ColumnData::Text(v) => v
                .iter()
                .map(|cell| cell.as_deref().and_then(parse_numeric))
                .collect(),
        }
    }

    /// View every cell as text; numbers are rendered.
    pub fn to_text(&self) -> Vec<Option<String>> {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().map(|c| c.map(render_number)).collect(),
            ColumnData::Text(v) => v.clone(),
        }
    }

    /// Number of distinct non-null values
    pub fn n_unique(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v
                .iter()
                .flatten()
                .map(|x| x.to_bits())
                .collect::<BTreeSet<_>>()
                .len(),
            ColumnData::Text(v) => v.iter().flatten().collect::<BTreeSet<_>>().len(),
        }
    }

    /// Render a single cell for logging
    pub fn display_cell(&self, row: usize) -> String {
        let cell = match &self.data {
            ColumnData::Numeric(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            ColumnData::Text(v) => v.get(row).cloned().flatten(),
        };
        cell.unwrap_or_else(|| "NaN".to_string())
    }

    fn take(&self, indices: &[usize]) -> Self {
        let data = match &self.data {
            ColumnData::Numeric(v) => ColumnData::Numeric(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Text(v) => {
                ColumnData::Text(indices.iter().map(|&i| v[i].clone()).collect())
            }
        };
        Self {
            name: self.name.clone(),
            data,
        }
    }
}

/// Table of named columns with a common row count
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl DataFrame {
    /// Build a frame from columns, which must all have the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(CoreError::Shape(format!(
                "column '{}' has {} rows, expected {}",
                bad.name(),
                bad.len(),
                n_rows
            )));
        }
        Ok(Self { columns, n_rows })
    }

    /// Load a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load CSV data with a header row from any reader. Cells are trimmed;
    /// header names are kept verbatim.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let headers = dedup_headers(reader.headers()?.iter());
        if headers.is_empty() {
            return Err(CoreError::EmptyDataset("CSV has no header row".to_string()));
        }

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (col, field) in record.iter().enumerate() {
                let cell = if is_null_token(field) {
                    None
                } else {
                    Some(field.to_string())
                };
                raw[col].push(cell);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::infer(name, cells))
            .collect();

        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in header order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Replace the column with the same name, or append it.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(CoreError::Shape(format!(
                "column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.n_rows
            )));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keep only the rows at the given indices, in that order.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            n_rows: indices.len(),
        }
    }

    /// Keep the rows where `keep` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.take_rows(&indices)
    }

    /// Render the first `n` rows as `name=value` lines for logging
    pub fn preview(&self, n: usize) -> Vec<String> {
        (0..self.n_rows.min(n))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| format!("{}={}", c.name, c.display_cell(row)))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect()
    }
}

/// Give repeated header names a `.N` suffix so every column is addressable.
fn dedup_headers<'a, I: Iterator<Item = &'a str>>(headers: I) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .map(|h| {
            let count = seen.entry(h.to_string()).or_insert(0);
            let name = if *count == 0 {
                h.to_string()
            } else {
                format!("{}.{}", h, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ndvi,soil_type,notes,yield
0.5,loam,ok,3.1
0.7,clay,,4.2
NA,sand,fine,
0.9,loam,great,5.0
";

    #[test]
    fn test_type_inference() {
        let frame = DataFrame::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(frame.n_rows(), 4);
        assert_eq!(frame.n_cols(), 4);
        assert!(frame.column("ndvi").unwrap().is_numeric());
        assert!(frame.column("yield").unwrap().is_numeric());
        assert!(!frame.column("soil_type").unwrap().is_numeric());
        assert_eq!(frame.column("ndvi").unwrap().non_null_count(), 3);
        assert_eq!(frame.column("notes").unwrap().non_null_count(), 3);
    }

    #[test]
    fn test_numeric_count_on_mixed_text() {
        let csv = "reading\n1\n2\nbroken\n4\n";
        let frame = DataFrame::from_reader(csv.as_bytes()).unwrap();
        let col = frame.column("reading").unwrap();
        assert!(!col.is_numeric());
        assert_eq!(col.numeric_count(), 3);
        assert_eq!(col.to_numeric(), vec![Some(1.0), Some(2.0), None, Some(4.0)]);
    }

    #[test]
    fn test_n_unique_ignores_nulls() {
        let frame = DataFrame::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(frame.column("soil_type").unwrap().n_unique(), 3);
        assert_eq!(frame.column("ndvi").unwrap().n_unique(), 3);
    }

    #[test]
    fn test_take_and_filter_rows() {
        let frame = DataFrame::from_reader(SAMPLE.as_bytes()).unwrap();
        let taken = frame.take_rows(&[3, 0]);
        assert_eq!(taken.n_rows(), 2);
        assert_eq!(
            taken.column("soil_type").unwrap().to_text(),
            vec![Some("loam".to_string()), Some("loam".to_string())]
        );

        let filtered = frame.filter_rows(&[true, false, false, true]);
        assert_eq!(
            filtered.column("yield").unwrap().to_numeric(),
            vec![Some(3.1), Some(5.0)]
        );
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let csv = "a,a,b\n1,2,3\n";
        let frame = DataFrame::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(frame.column_names(), vec!["a", "a.1", "b"]);
    }

    #[test]
    fn test_headers_are_not_trimmed() {
        let csv = " yield,ndvi\n 3.5 , 0.4\n";
        let frame = DataFrame::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(frame.column_names(), vec![" yield", "ndvi"]);
        assert!(frame.column("yield").is_none());
        assert_eq!(frame.column(" yield").unwrap().to_numeric(), vec![Some(3.5)]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = "a,b\n1,2\n3\n";
        assert!(DataFrame::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_set_column_length_mismatch() {
        let mut frame = DataFrame::from_reader(SAMPLE.as_bytes()).unwrap();
        let err = frame.set_column(Column::numeric("short", vec![Some(1.0)]));
        assert!(err.is_err());
        frame
            .set_column(Column::numeric("yield", vec![Some(1.0); 4]))
            .unwrap();
        assert_eq!(frame.n_cols(), 4);
    }
}
