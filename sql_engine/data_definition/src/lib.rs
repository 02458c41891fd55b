// Copyright 2020 - 2021 Alex Dukhno
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

use definition::TableDef;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq)]
pub struct CreateTableQuery {
    pub table_def: TableDef,
}

#[derive(Debug, PartialEq)]
pub struct DropTableQuery {
    pub table_name: String,
}

#[derive(Debug, PartialEq)]
pub struct CreateIndexQuery {
    pub name: Option<String>,
    pub table_name: String,
    pub column_name: String,
}

#[derive(Debug, PartialEq)]
pub struct DropIndexQuery {
    pub name: String,
}

/// A catalog mutation requested by a DDL statement.
#[derive(Debug, PartialEq)]
pub enum SchemaChange {
    CreateTable(CreateTableQuery),
    DropTable(DropTableQuery),
    CreateIndex(CreateIndexQuery),
    DropIndex(DropIndexQuery),
}

#[derive(Debug, PartialEq)]
pub enum ExecutionOutcome {
    TableCreated,
    TableDropped,
    IndexCreated(String),
    IndexDropped,
}

#[derive(Debug, PartialEq)]
pub enum ExecutionError {
    TableAlreadyExists(String),
    TableDoesNotExist(String),
    TableLimitReached(usize),
    ColumnDoesNotExist(String),
    IndexDoesNotExist(String),
    NameTooLong(String),
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::TableAlreadyExists(table) => write!(f, "table {} already exists", table),
            ExecutionError::TableDoesNotExist(table) => write!(f, "table {} does not exist", table),
            ExecutionError::TableLimitReached(limit) => write!(f, "catalog limit of {} tables reached", limit),
            ExecutionError::ColumnDoesNotExist(column) => write!(f, "column {} does not exist", column),
            ExecutionError::IndexDoesNotExist(index) => write!(f, "index {} does not exist", index),
            ExecutionError::NameTooLong(name) => write!(f, "name {} is too long", name),
        }
    }
}
