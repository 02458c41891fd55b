// Copyright 2020 - present Alex Dukhno
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

use data_scalar::ScalarValue;
use std::fmt::{self, Display, Formatter};

/// Materialized grid handed back to the caller. Values are deep copies of
/// catalog data; dropping the result releases them.
#[derive(Debug, PartialEq, Clone)]
pub struct QueryResult {
    column_names: Vec<String>,
    rows: Vec<Vec<ScalarValue>>,
}

impl QueryResult {
    pub fn new(column_names: Vec<String>, rows: Vec<Vec<ScalarValue>>) -> QueryResult {
        QueryResult { column_names, rows }
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<ScalarValue>] {
        &self.rows
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&ScalarValue> {
        self.rows.get(row).and_then(|row| row.get(column))
    }
}

#[derive(Debug, PartialEq)]
pub enum QueryExecution {
    Inserted(usize),
    Deleted(usize),
    Updated(usize),
    Selected(QueryResult),
}

#[derive(Debug, PartialEq)]
pub enum QueryExecutionError {
    TableDoesNotExist(String),
    ColumnNotFound(String),
    ColumnCountMismatch { expected: usize, given: usize },
    NullConstraintViolation(String),
    UniqueConstraintViolation { column: String, value: String },
    ForeignKeyViolation { column: String, referenced: String, value: String },
    JoinMaterialization(String),
    NotSupported(String),
}

impl QueryExecutionError {
    pub fn table_does_not_exist<T: ToString>(table: T) -> QueryExecutionError {
        QueryExecutionError::TableDoesNotExist(table.to_string())
    }

    pub fn column_not_found<C: ToString>(column: C) -> QueryExecutionError {
        QueryExecutionError::ColumnNotFound(column.to_string())
    }

    pub fn column_count_mismatch(expected: usize, given: usize) -> QueryExecutionError {
        QueryExecutionError::ColumnCountMismatch { expected, given }
    }

    pub fn null_constraint_violation<C: ToString>(column: C) -> QueryExecutionError {
        QueryExecutionError::NullConstraintViolation(column.to_string())
    }

    pub fn unique_constraint_violation<C: ToString, V: ToString>(column: C, value: V) -> QueryExecutionError {
        QueryExecutionError::UniqueConstraintViolation {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn foreign_key_violation<C: ToString, R: ToString, V: ToString>(
        column: C,
        referenced: R,
        value: V,
    ) -> QueryExecutionError {
        QueryExecutionError::ForeignKeyViolation {
            column: column.to_string(),
            referenced: referenced.to_string(),
            value: value.to_string(),
        }
    }

    pub fn join_materialization<R: ToString>(reason: R) -> QueryExecutionError {
        QueryExecutionError::JoinMaterialization(reason.to_string())
    }

    pub fn not_supported<W: ToString>(what: W) -> QueryExecutionError {
        QueryExecutionError::NotSupported(what.to_string())
    }
}

impl Display for QueryExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryExecutionError::TableDoesNotExist(table) => write!(f, "table {} does not exist", table),
            QueryExecutionError::ColumnNotFound(column) => write!(f, "column {} not found", column),
            QueryExecutionError::ColumnCountMismatch { expected, given } => {
                write!(f, "expected {} values but {} were given", expected, given)
            }
            QueryExecutionError::NullConstraintViolation(column) => {
                write!(f, "null value in column {} violates not-null constraint", column)
            }
            QueryExecutionError::UniqueConstraintViolation { column, value } => {
                write!(f, "duplicate value {} violates unique constraint on column {}", value, column)
            }
            QueryExecutionError::ForeignKeyViolation { column, referenced, value } => write!(
                f,
                "value {} in column {} is not present in referenced column {}",
                value, column, referenced
            ),
            QueryExecutionError::JoinMaterialization(reason) => {
                write!(f, "could not materialize join table: {}", reason)
            }
            QueryExecutionError::NotSupported(what) => write!(f, "{} is not supported", what),
        }
    }
}
