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

use std::fmt::{self, Display, Formatter};
use types::SqlType;

/// Table and index names are capped at the same length the storage layout
/// reserves for them.
pub const MAX_NAME_LEN: usize = 31;

#[derive(Debug, PartialEq, Clone)]
pub struct ForeignKeyRef {
    table: String,
    column: String,
}

impl ForeignKeyRef {
    pub fn new<T: ToString, C: ToString>(table: T, column: C) -> ForeignKeyRef {
        ForeignKeyRef {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Display for ForeignKeyRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    name: String,
    sql_type: SqlType,
    ord_num: usize,
    nullable: bool,
    unique: bool,
    primary_key: bool,
    foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDef {
    pub fn new(name: String, sql_type: SqlType, ord_num: usize) -> ColumnDef {
        ColumnDef {
            name,
            sql_type,
            ord_num,
            nullable: true,
            unique: false,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn not_null(mut self) -> ColumnDef {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> ColumnDef {
        self.unique = true;
        self
    }

    /// PRIMARY KEY implies UNIQUE and NOT NULL.
    pub fn primary_key(mut self) -> ColumnDef {
        self.primary_key = true;
        self.unique = true;
        self.nullable = false;
        self
    }

    pub fn references(mut self, foreign_key: ForeignKeyRef) -> ColumnDef {
        self.foreign_key = Some(foreign_key);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn index(&self) -> usize {
        self.ord_num
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn foreign_key(&self) -> Option<&ForeignKeyRef> {
        self.foreign_key.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
    strict: bool,
}

impl TableDef {
    pub fn new(name: String, columns: Vec<ColumnDef>) -> TableDef {
        TableDef {
            name,
            columns,
            strict: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Case-sensitive lookup of a column's position in declaration order.
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == column_name)
    }

    pub fn has_column(&self, column_name: &str) -> bool {
        self.columns.iter().any(|col| col.name == column_name)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }
}
