//! The tabular data a batch iterates over

use crate::{CertgenError, Result};
use std::collections::{HashMap, HashSet};

/// One data row
///
/// `index` is the row's position in the loaded file (rows appended later
/// continue the sequence) and never changes while the row lives, whatever
/// view it is displayed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    index: usize,
    values: HashMap<String, String>,
}

impl DataRow {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value by column name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Non-blank cell value by column name
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.trim().is_empty())
    }

    fn matches(&self, needle: &str) -> bool {
        self.values
            .values()
            .any(|v| v.to_lowercase().contains(needle))
    }
}

/// Column names plus rows in original order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<DataRow>,
    next_index: usize,
}

impl Dataset {
    /// Parse CSV text with a header row
    ///
    /// Empty lines are skipped, short records are padded with empty cells
    /// and cells past the last header are ignored. A repeated header gets a
    /// numeric suffix (`Name`, `Name_1`) so every column stays reachable.
    pub fn from_csv(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = unique_headers(
            reader
                .headers()
                .map_err(|e| CertgenError::Parse(e.to_string()))?
                .iter(),
        );
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(CertgenError::Parse("missing header row".into()));
        }

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CertgenError::Parse(e.to_string()))?;
            let values = headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(DataRow { index, values });
        }

        log::info!("Parsed {} rows with columns {:?}", rows.len(), headers);
        Ok(Self {
            next_index: rows.len(),
            headers,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Rows in original order
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by original index
    pub fn row(&self, index: usize) -> Option<&DataRow> {
        self.rows.iter().find(|r| r.index == index)
    }

    /// Append a row with every column empty, returning its index
    pub fn add_row(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        let values = self
            .headers
            .iter()
            .map(|h| (h.clone(), String::new()))
            .collect();
        self.rows.push(DataRow { index, values });
        index
    }

    /// Remove a row by original index, keeping at least one
    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        let position = self
            .rows
            .iter()
            .position(|r| r.index == index)
            .ok_or_else(|| CertgenError::Validation(format!("No row with index {index}")))?;
        if self.rows.len() == 1 {
            return Err(CertgenError::Validation(
                "At least one row must remain".into(),
            ));
        }
        self.rows.remove(position);
        Ok(())
    }

    /// Overwrite one cell
    pub fn edit_cell(&mut self, index: usize, column: &str, value: &str) -> Result<()> {
        if !self.has_column(column) {
            return Err(CertgenError::Validation(format!("No column named {column:?}")));
        }
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.index == index)
            .ok_or_else(|| CertgenError::Validation(format!("No row with index {index}")))?;
        row.values.insert(column.to_string(), value.to_string());
        Ok(())
    }

    /// Rows containing `query` in any cell, case-insensitively
    pub fn filter(&self, query: &str) -> Vec<&DataRow> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows.iter().filter(|r| r.matches(&needle)).collect()
    }
}

fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.map(|header| {
        if seen.insert(header.to_string()) {
            return header.to_string();
        }
        let renamed = (1..)
            .map(|n| format!("{header}_{n}"))
            .find(|candidate| !seen.contains(candidate))
            .unwrap_or_default();
        log::warn!("Duplicate column {header:?} renamed to {renamed:?}");
        seen.insert(renamed.clone());
        renamed
    })
    .collect()
}
