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

use crate::Row;
use data_scalar::ScalarValue;

pub const BUCKET_COUNT: usize = 64;

#[derive(Debug)]
struct IndexEntry {
    key: ScalarValue,
    row_index: usize,
}

/// Hash index over a single column. Collisions chain inside the bucket.
/// NULL and ERROR keys are never indexed and never matchable.
///
/// The executor does not consult indexes while planning; they are maintained
/// for point lookups through [`crate::Catalog::index_lookup`]. Writes mark
/// them stale and the next lookup rebuilds from the current rows.
#[derive(Debug)]
pub struct HashIndex {
    name: String,
    table_name: String,
    column_name: String,
    column_index: usize,
    buckets: Vec<Vec<IndexEntry>>,
    stale: bool,
}

impl HashIndex {
    pub fn new(name: &str, table_name: &str, column_name: &str, column_index: usize) -> HashIndex {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        buckets.resize_with(BUCKET_COUNT, Vec::new);
        HashIndex {
            name: name.to_owned(),
            table_name: table_name.to_owned(),
            column_name: column_name.to_owned(),
            column_index,
            buckets,
            stale: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn insert(&mut self, key: ScalarValue, row_index: usize) {
        if key.is_null() || key.is_error() {
            return;
        }
        let bucket = key.bucket(BUCKET_COUNT);
        self.buckets[bucket].push(IndexEntry { key, row_index });
    }

    pub fn lookup(&self, key: &ScalarValue) -> Vec<usize> {
        if key.is_null() || key.is_error() {
            return vec![];
        }
        self.buckets[key.bucket(BUCKET_COUNT)]
            .iter()
            .filter(|entry| entry.key.value_eq(key))
            .map(|entry| entry.row_index)
            .collect()
    }

    pub fn rebuild(&mut self, rows: &[Row]) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        for (row_index, row) in rows.iter().enumerate() {
            if let Some(key) = row.get(self.column_index) {
                self.insert(key.clone(), row_index);
            }
        }
        self.stale = false;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}
