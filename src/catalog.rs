//! Flat table/column/type catalog loaded from a CSV export.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::{debug, info};

pub const TABLE_HEADER: &str = "Table";
pub const COLUMN_HEADER: &str = "Column";
pub const DATA_TYPE_HEADER: &str = "Data Type";

const REQUIRED_HEADERS: [&str; 3] = [TABLE_HEADER, COLUMN_HEADER, DATA_TYPE_HEADER];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaFormatError {
    #[error("schema file must contain 'Table', 'Column' and 'Data Type' columns; missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row} has no value for '{field}'")]
    MissingField { row: usize, field: &'static str },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read schema: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Format(#[from] SchemaFormatError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRecord {
    pub table: String,
    pub column: String,
    pub data_type: String,
}

impl ColumnRecord {
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered, read-only collection of column records. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    records: Vec<ColumnRecord>,
}

impl SchemaCatalog {
    pub fn from_records(records: Vec<ColumnRecord>) -> Self {
        Self { records }
    }

    /// Load a catalog from CSV with `Table`, `Column` and `Data Type` headers.
    /// Extra columns are ignored.
    pub fn load<R: Read>(source: R) -> Result<Self, CatalogError> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(source);

        let headers = rdr.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut indices = [0usize; 3];
        let mut missing = Vec::new();
        for (slot, name) in indices.iter_mut().zip(REQUIRED_HEADERS) {
            match position(name) {
                Some(idx) => *slot = idx,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(SchemaFormatError::MissingColumns(missing).into());
        }
        let [table_idx, column_idx, type_idx] = indices;

        let mut records = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = i + 2;
            // Short rows and blank cells both count as missing.
            let field = |idx: usize, name: &'static str| {
                row.get(idx)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .ok_or(SchemaFormatError::MissingField { row: line, field: name })
            };
            records.push(ColumnRecord {
                table: field(table_idx, TABLE_HEADER)?,
                column: field(column_idx, COLUMN_HEADER)?,
                data_type: field(type_idx, DATA_TYPE_HEADER)?,
            });
        }

        info!(rows = records.len(), "loaded schema catalog");
        Ok(Self { records })
    }

    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening schema file");
        Self::load(File::open(path)?)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, CatalogError> {
        Self::load(text.as_bytes())
    }

    pub fn records(&self) -> &[ColumnRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Columns of `table` with their data types, in catalog order.
    pub fn columns_of(&self, table: &str) -> Vec<(&str, &str)> {
        self.records
            .iter()
            .filter(|r| r.table == table)
            .map(|r| (r.column.as_str(), r.data_type.as_str()))
            .collect()
    }

    /// Table names in first-occurrence order.
    pub fn distinct_tables(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.table.as_str()))
    }

    /// Column names in first-occurrence order.
    pub fn distinct_columns(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.column.as_str()))
    }

    pub fn filter_by_type(&self, data_type: &str) -> SchemaCatalog {
        SchemaCatalog {
            records: self
                .records
                .iter()
                .filter(|r| r.data_type == data_type)
                .cloned()
                .collect(),
        }
    }

    /// Tables that contain `column`, in first-occurrence order.
    pub fn tables_with_column(&self, column: &str) -> Vec<&str> {
        distinct(
            self.records
                .iter()
                .filter(|r| r.column == column)
                .map(|r| r.table.as_str()),
        )
    }
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}
