// Copyright 2025 Felix Engl
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::data::LogicalField;
use indexmap::IndexMap;
use thiserror::Error;

/// What an extractor hands to the pipeline: equal-length string columns
/// keyed by logical field, in source order (newest row first).
pub type RawExtraction = IndexMap<LogicalField, Vec<String>>;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column {field} has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        field: LogicalField,
        expected: usize,
        found: usize,
    },
}

/// A column-oriented frame of extracted rows.
///
/// Row order reflects source order, which is newest-first. Cells are
/// `Option<String>`; `None` only appears through scrubbing or through
/// fields the source never provided.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: IndexMap<LogicalField, Vec<Option<String>>>,
    rows: usize,
}

impl Frame {
    /// Builds a frame from raw extractor output. All columns must agree in
    /// length.
    pub fn from_extraction(extraction: RawExtraction) -> Result<Self, FrameError> {
        let mut columns = IndexMap::with_capacity(extraction.len());
        let mut rows = None;
        for (field, values) in extraction {
            let expected = *rows.get_or_insert(values.len());
            if values.len() != expected {
                return Err(FrameError::ColumnLengthMismatch {
                    field,
                    expected,
                    found: values.len(),
                });
            }
            columns.insert(field, values.into_iter().map(Some).collect());
        }
        Ok(Self {
            columns,
            rows: rows.unwrap_or(0),
        })
    }

    /// A frame with the same columns but no rows.
    pub fn cleared(&self) -> Self {
        Self {
            columns: self.columns.keys().map(|k| (*k, Vec::new())).collect(),
            rows: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn column(&self, field: LogicalField) -> Option<&[Option<String>]> {
        self.columns.get(&field).map(Vec::as_slice)
    }

    pub fn column_mut(&mut self, field: LogicalField) -> Option<&mut Vec<Option<String>>> {
        self.columns.get_mut(&field)
    }

    /// One horizontal slice across all columns.
    pub fn row(&self, index: usize) -> Row {
        debug_assert!(index < self.rows);
        Row {
            cells: self
                .columns
                .iter()
                .map(|(field, values)| (*field, values[index].clone()))
                .collect(),
        }
    }

    /// All rows in frame order (newest first).
    pub fn rows(&self) -> Vec<Row> {
        (0..self.rows).map(|i| self.row(i)).collect()
    }

    /// Keeps exactly the rows whose index satisfies the predicate,
    /// preserving order.
    pub fn retain_rows<F: Fn(usize) -> bool>(&self, keep: F) -> Self {
        let kept: Vec<usize> = (0..self.rows).filter(|i| keep(*i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(field, values)| (*field, kept.iter().map(|i| values[*i].clone()).collect()))
            .collect();
        Self {
            columns,
            rows: kept.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Self {
        self.retain_rows(|i| i < n)
    }

    /// The fingerprint of a row: the JSON stringification of its cells.
    pub fn fingerprint(&self, index: usize) -> String {
        self.row(index).fingerprint()
    }
}

/// One row of a [`Frame`], cells keyed by logical field in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: IndexMap<LogicalField, Option<String>>,
}

impl Row {
    /// The cell for `field`, if present and non-null.
    pub fn get(&self, field: LogicalField) -> Option<&str> {
        self.cells.get(&field).and_then(|v| v.as_deref())
    }

    /// The stringified representation of this row, used for change
    /// detection. Stable across runs for identical cell contents.
    pub fn fingerprint(&self) -> String {
        let values: Vec<&Option<String>> = self.cells.values().collect();
        serde_json::to_string(&values).unwrap_or_default()
    }
}
