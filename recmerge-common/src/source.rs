//! Tabular source and record model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// One row of a tabular source
///
/// `input_line` is the 1-based data row index (header excluded) and is the
/// record's identity within its source for the duration of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub input_line: usize,
    pub values: BTreeMap<String, String>,
}

impl Record {
    pub fn new(input_line: usize, values: BTreeMap<String, String>) -> Self {
        Self { input_line, values }
    }

    /// Value of `column`, or "" when the record has no such column
    pub fn value(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Ordered set of named columns plus the records that populate them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    headers: Vec<String>,
    records: Vec<Record>,
    primary_key: Option<String>,
}

impl Source {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
            primary_key: None,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Designate `column` as the primary key
    ///
    /// # Errors
    /// Returns [`Error::MissingColumn`] if the column is not a header of this source
    pub fn set_primary_key(&mut self, column: &str) -> Result<()> {
        if !self.has_column(column) {
            return Err(Error::MissingColumn(column.to_string()));
        }
        self.primary_key = Some(column.to_string());
        Ok(())
    }

    /// Identity of `record` within this source
    ///
    /// The primary-key value when a primary key is set, otherwise the line number.
    pub fn record_id(&self, record: &Record) -> String {
        match &self.primary_key {
            Some(key) => record.value(key).to_string(),
            None => record.input_line.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
