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

use dashmap::DashMap;
use data_definition::{
    CreateIndexQuery, CreateTableQuery, DropIndexQuery, DropTableQuery, ExecutionError, ExecutionOutcome, SchemaChange,
};
use data_scalar::ScalarValue;
use definition::{TableDef, MAX_NAME_LEN};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, RwLock,
};

mod index;

pub use index::{HashIndex, BUCKET_COUNT};

pub const MAX_TABLES: usize = 64;

pub type Row = Vec<ScalarValue>;

#[derive(Debug, Default)]
struct InternalTable {
    rows: Vec<Row>,
}

/// Cheaply clonable handle to one table. Plan operators keep a clone while
/// the catalog keeps the canonical entry; the row store behind it is shared.
#[derive(Debug, Clone)]
pub struct TableHandle {
    id: u32,
    def: Arc<TableDef>,
    inner: Arc<RwLock<InternalTable>>,
}

impl TableHandle {
    fn with_def(id: u32, def: TableDef) -> TableHandle {
        TableHandle {
            id,
            def: Arc::new(def),
            inner: Arc::new(RwLock::new(InternalTable::default())),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    pub fn def(&self) -> &TableDef {
        &self.def
    }

    /// Deep-copied snapshot of the rows in insertion order.
    pub fn scan(&self) -> Vec<Row> {
        self.inner.read().unwrap().rows.clone()
    }

    pub fn row_count(&self) -> usize {
        self.inner.read().unwrap().rows.len()
    }

    pub fn append(&self, row: Row) {
        debug_assert_eq!(row.len(), self.def.columns().len());
        self.inner.write().unwrap().rows.push(row);
    }

    pub fn update_row(&self, index: usize, row: Row) {
        debug_assert_eq!(row.len(), self.def.columns().len());
        self.inner.write().unwrap().rows[index] = row;
    }

    /// Replaces the whole row sequence; DELETE compacts through this.
    pub fn replace_rows(&self, rows: Vec<Row>) {
        self.inner.write().unwrap().rows = rows;
    }

    /// True when some other row than `skip` holds a value equal to `value`
    /// in the given column.
    pub fn has_value_in_column(&self, column: usize, value: &ScalarValue, skip: Option<usize>) -> bool {
        self.inner
            .read()
            .unwrap()
            .rows
            .iter()
            .enumerate()
            .filter(|(index, _row)| Some(*index) != skip)
            .any(|(_index, row)| row[column].value_eq(value))
    }
}

impl PartialEq for TableHandle {
    fn eq(&self, other: &TableHandle) -> bool {
        self.id == other.id
    }
}

/// The process-wide registry of tables and indexes.
pub struct Catalog {
    tables: DashMap<String, TableHandle>,
    indexes: DashMap<String, Arc<RwLock<HashIndex>>>,
    table_ids: AtomicU32,
}

impl Default for Catalog {
    fn default() -> Catalog {
        Catalog {
            tables: DashMap::default(),
            indexes: DashMap::default(),
            table_ids: AtomicU32::default(),
        }
    }
}

impl Catalog {
    pub fn table(&self, table_name: &str) -> Option<TableHandle> {
        self.tables.get(table_name).map(|table| table.value().clone())
    }

    pub fn table_by_id(&self, id: u32) -> Option<TableHandle> {
        self.tables
            .iter()
            .find(|entry| entry.value().id() == id)
            .map(|entry| entry.value().clone())
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn create_table(&self, table_def: TableDef) -> Result<TableHandle, ExecutionError> {
        if table_def.name().len() > MAX_NAME_LEN {
            return Err(ExecutionError::NameTooLong(table_def.name().to_owned()));
        }
        if self.tables.contains_key(table_def.name()) {
            return Err(ExecutionError::TableAlreadyExists(table_def.name().to_owned()));
        }
        if self.tables.len() >= MAX_TABLES {
            return Err(ExecutionError::TableLimitReached(MAX_TABLES));
        }
        let id = self.table_ids.fetch_add(1, Ordering::SeqCst);
        let table = TableHandle::with_def(id, table_def);
        log::debug!("TABLE {:?} was created with id {}", table.name(), id);
        self.tables.insert(table.name().to_owned(), table.clone());
        Ok(table)
    }

    pub fn drop_table(&self, table_name: &str) -> Result<(), ExecutionError> {
        match self.tables.remove(table_name) {
            None => Err(ExecutionError::TableDoesNotExist(table_name.to_owned())),
            Some(_) => {
                // indexes are tied to the table's life
                let dangling = self
                    .indexes
                    .iter()
                    .filter(|entry| entry.value().read().unwrap().table_name() == table_name)
                    .map(|entry| entry.key().clone())
                    .collect::<Vec<String>>();
                for index_name in dangling {
                    self.indexes.remove(&index_name);
                }
                log::debug!("TABLE {:?} was removed", table_name);
                Ok(())
            }
        }
    }

    pub fn create_index(
        &self,
        name: Option<String>,
        table_name: &str,
        column_name: &str,
    ) -> Result<String, ExecutionError> {
        let table = match self.table(table_name) {
            None => return Err(ExecutionError::TableDoesNotExist(table_name.to_owned())),
            Some(table) => table,
        };
        let column_index = match table.def().column_index(column_name) {
            None => return Err(ExecutionError::ColumnDoesNotExist(column_name.to_owned())),
            Some(column_index) => column_index,
        };
        let index_name = name.unwrap_or_else(|| format!("idx_{}_{}", table_name, column_name));
        if index_name.len() > MAX_NAME_LEN {
            return Err(ExecutionError::NameTooLong(index_name));
        }
        if self.indexes.remove(&index_name).is_some() {
            log::warn!("INDEX {:?} already exists and will be rebuilt", index_name);
        }
        let mut index = HashIndex::new(&index_name, table_name, column_name, column_index);
        index.rebuild(&table.scan());
        self.indexes.insert(index_name.clone(), Arc::new(RwLock::new(index)));
        log::debug!("INDEX {:?} on TABLE {:?} was created", index_name, table_name);
        Ok(index_name)
    }

    pub fn drop_index(&self, index_name: &str) -> Result<(), ExecutionError> {
        match self.indexes.remove(index_name) {
            None => Err(ExecutionError::IndexDoesNotExist(index_name.to_owned())),
            Some(_) => Ok(()),
        }
    }

    /// Probes an index, transparently rebuilding it when writes have made it
    /// stale since the last build.
    pub fn index_lookup(&self, index_name: &str, key: &ScalarValue) -> Option<Vec<usize>> {
        let index = self.indexes.get(index_name)?.value().clone();
        let mut index = index.write().unwrap();
        if index.is_stale() {
            match self.table(index.table_name()) {
                Some(table) => {
                    log::debug!("INDEX {:?} is stale and will be rebuilt", index_name);
                    index.rebuild(&table.scan());
                }
                None => return None,
            }
        }
        Some(index.lookup(key))
    }

    pub fn mark_indexes_stale(&self, table_name: &str) {
        for entry in self.indexes.iter() {
            let mut index = entry.value().write().unwrap();
            if index.table_name() == table_name {
                index.mark_stale();
            }
        }
    }

    pub fn apply(&self, schema_change: SchemaChange) -> Result<ExecutionOutcome, ExecutionError> {
        match schema_change {
            SchemaChange::CreateTable(CreateTableQuery { table_def }) => {
                self.create_table(table_def).map(|_| ExecutionOutcome::TableCreated)
            }
            SchemaChange::DropTable(DropTableQuery { table_name }) => {
                self.drop_table(&table_name).map(|_| ExecutionOutcome::TableDropped)
            }
            SchemaChange::CreateIndex(CreateIndexQuery {
                name,
                table_name,
                column_name,
            }) => self
                .create_index(name, &table_name, &column_name)
                .map(ExecutionOutcome::IndexCreated),
            SchemaChange::DropIndex(DropIndexQuery { name }) => {
                self.drop_index(&name).map(|_| ExecutionOutcome::IndexDropped)
            }
        }
    }

    /// Drops every table and index; test harness hook.
    pub fn reset(&self) {
        self.tables.clear();
        self.indexes.clear();
    }
}
