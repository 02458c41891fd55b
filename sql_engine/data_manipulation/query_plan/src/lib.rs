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

use catalog::{Catalog, Row, TableHandle};
use data_manipulation_query_result::{QueryExecution, QueryExecutionError, QueryResult};
use data_manipulation_typed_queries::{JoinKind, ProjectionItem, SortKey, SortOrder, TypedJoin};
use data_manipulation_typed_tree::TypedTree;
use data_scalar::ScalarValue;
use definition::{ColumnDef, TableDef};
use itertools::Itertools;
use std::cmp::Ordering;

pub enum QueryPlan<'p> {
    Insert(InsertQueryPlan<'p>),
    Update(UpdateQueryPlan<'p>),
    Delete(DeleteQueryPlan<'p>),
    Select(SelectQueryPlan<'p>),
}

impl<'p> QueryPlan<'p> {
    pub fn execute(self) -> Result<QueryExecution, QueryExecutionError> {
        match self {
            QueryPlan::Insert(insert_query_plan) => insert_query_plan.execute().map(QueryExecution::Inserted),
            QueryPlan::Update(update_query_plan) => update_query_plan.execute().map(QueryExecution::Updated),
            QueryPlan::Delete(delete_query_plan) => delete_query_plan.execute().map(QueryExecution::Deleted),
            QueryPlan::Select(select_query_plan) => select_query_plan.execute().map(QueryExecution::Selected),
        }
    }
}

pub trait Flow {
    type Output;

    fn next_tuple(&mut self) -> Result<Option<Self::Output>, QueryExecutionError>;
}

/// Snapshot scan over a table, yielding `(row position, row)` pairs.
pub struct FullTableScan {
    source: std::iter::Enumerate<std::vec::IntoIter<Row>>,
}

impl FullTableScan {
    pub fn new(table: &TableHandle) -> Box<FullTableScan> {
        log::debug!("[SCAN] TABLE {:?}", table.name());
        Box::new(FullTableScan {
            source: table.scan().into_iter().enumerate(),
        })
    }
}

impl Flow for FullTableScan {
    type Output = (usize, Row);

    fn next_tuple(&mut self) -> Result<Option<Self::Output>, QueryExecutionError> {
        Ok(self.source.next())
    }
}

/// Gate in front of the projection: passes through rows the predicate holds
/// for and counts what it let through.
pub struct Filter {
    source: Box<dyn Flow<Output = (usize, Row)>>,
    predicate: Option<TypedTree>,
    matched: usize,
}

impl Filter {
    pub fn new(source: Box<dyn Flow<Output = (usize, Row)>>, predicate: Option<TypedTree>) -> Box<Filter> {
        Box::new(Filter {
            source,
            predicate,
            matched: 0,
        })
    }
}

impl Flow for Filter {
    type Output = (usize, Row);

    fn next_tuple(&mut self) -> Result<Option<Self::Output>, QueryExecutionError> {
        while let Some((key, row)) = self.source.next_tuple()? {
            match &self.predicate {
                None => {
                    self.matched += 1;
                    return Ok(Some((key, row)));
                }
                Some(predicate) => {
                    if predicate.matches(&row) {
                        self.matched += 1;
                        return Ok(Some((key, row)));
                    }
                }
            }
        }
        log::debug!("[FILTER] {} rows matched", self.matched);
        Ok(None)
    }
}

/// Cross product with an ON predicate, materialized into a synthesized
/// `_join_<left id>_<right id>` table appended to the catalog. The planner
/// is responsible for dropping it at end of statement.
pub struct NestedLoopJoin {
    left: TableHandle,
    right: TableHandle,
    kind: JoinKind,
    on: TypedTree,
}

impl NestedLoopJoin {
    pub fn new(left: TableHandle, right: TableHandle, join: TypedJoin) -> NestedLoopJoin {
        NestedLoopJoin {
            left,
            right,
            kind: join.kind,
            on: join.on,
        }
    }

    pub fn execute(self, catalog: &Catalog) -> Result<TableHandle, QueryExecutionError> {
        let table_name = format!("_join_{}_{}", self.left.id(), self.right.id());
        let columns = self
            .left
            .def()
            .columns()
            .iter()
            .chain(self.right.def().columns().iter())
            .enumerate()
            .map(|(ord_num, column)| ColumnDef::new(column.name().to_owned(), column.sql_type(), ord_num))
            .collect::<Vec<ColumnDef>>();
        if catalog.table(&table_name).is_some() {
            log::warn!("stale join table {:?} found and dropped", table_name);
            let _ = catalog.drop_table(&table_name);
        }
        let table = catalog
            .create_table(TableDef::new(table_name, columns))
            .map_err(QueryExecutionError::join_materialization)?;

        let right_width = self.right.def().columns().len();
        let right_rows = self.right.scan();
        for left_row in self.left.scan() {
            let mut matched = false;
            for right_row in right_rows.iter() {
                let merged = left_row
                    .iter()
                    .cloned()
                    .chain(right_row.iter().cloned())
                    .collect::<Row>();
                if self.on.matches(&merged) {
                    table.append(merged);
                    matched = true;
                }
            }
            if !matched && self.kind == JoinKind::LeftOuter {
                let padded = left_row
                    .into_iter()
                    .chain(std::iter::repeat(ScalarValue::Null).take(right_width))
                    .collect::<Row>();
                table.append(padded);
            }
        }
        Ok(table)
    }
}

/// Enforces NOT NULL, UNIQUE and FOREIGN KEY, in that order, for one
/// candidate row. UPDATE passes the row's own position through `skip` so a
/// row does not collide with itself.
pub struct ConstraintValidator<'v> {
    catalog: &'v Catalog,
    table: &'v TableHandle,
}

impl<'v> ConstraintValidator<'v> {
    pub fn new(catalog: &'v Catalog, table: &'v TableHandle) -> ConstraintValidator<'v> {
        ConstraintValidator { catalog, table }
    }

    pub fn validate(&self, row: &Row, skip: Option<usize>) -> Result<(), QueryExecutionError> {
        for column in self.table.def().columns() {
            let value = &row[column.index()];
            if !column.is_nullable() && value.is_null() {
                return Err(QueryExecutionError::null_constraint_violation(column.name()));
            }
            if column.is_unique()
                && !value.is_null()
                && !value.is_error()
                && self.table.has_value_in_column(column.index(), value, skip)
            {
                return Err(QueryExecutionError::unique_constraint_violation(
                    column.name(),
                    value.clone().as_text(),
                ));
            }
            if let Some(foreign_key) = column.foreign_key() {
                if !value.is_null() && !value.is_error() {
                    let referenced = self
                        .catalog
                        .table(foreign_key.table())
                        .ok_or_else(|| QueryExecutionError::table_does_not_exist(foreign_key.table()))?;
                    let referenced_column = referenced
                        .def()
                        .column_index(foreign_key.column())
                        .ok_or_else(|| QueryExecutionError::column_not_found(foreign_key.column()))?;
                    if !referenced.has_value_in_column(referenced_column, value, None) {
                        return Err(QueryExecutionError::foreign_key_violation(
                            column.name(),
                            foreign_key,
                            value.clone().as_text(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Applies the column type to an incoming value. A failed conversion under a
/// strict schema records NULL; a relaxed schema keeps the value as given.
fn coerce(strict: bool, column: &ColumnDef, value: ScalarValue) -> ScalarValue {
    match value.try_convert(column.sql_type()) {
        Some(converted) => converted,
        None => {
            if strict {
                log::warn!(
                    "value {:?} does not fit {} column {:?}; NULL recorded",
                    value,
                    column.sql_type(),
                    column.name()
                );
                ScalarValue::Null
            } else {
                value
            }
        }
    }
}

pub struct InsertQueryPlan<'p> {
    catalog: &'p Catalog,
    table: TableHandle,
    columns: Option<Vec<usize>>,
    values: Vec<Vec<TypedTree>>,
}

impl<'p> InsertQueryPlan<'p> {
    pub fn new(
        catalog: &'p Catalog,
        table: TableHandle,
        columns: Option<Vec<usize>>,
        values: Vec<Vec<TypedTree>>,
    ) -> InsertQueryPlan<'p> {
        InsertQueryPlan {
            catalog,
            table,
            columns,
            values,
        }
    }

    /// Inserts each VALUES tuple independently. A tuple that fails arity,
    /// conversion-to-NULL constraints or any declared constraint is logged
    /// and skipped; the remaining tuples proceed.
    pub fn execute(self) -> Result<usize, QueryExecutionError> {
        let validator = ConstraintValidator::new(self.catalog, &self.table);
        let width = self.table.def().columns().len();
        let strict = self.table.def().is_strict();
        let mut inserted = 0;
        for tuple in &self.values {
            let mut row: Row = vec![ScalarValue::Null; width];
            match &self.columns {
                Some(positions) => {
                    if tuple.len() != positions.len() {
                        log::error!("{}", QueryExecutionError::column_count_mismatch(positions.len(), tuple.len()));
                        continue;
                    }
                    for (tree, position) in tuple.iter().zip_eq(positions.iter()) {
                        row[*position] = tree.eval(&[]);
                    }
                }
                None => {
                    if tuple.len() != width {
                        log::error!("{}", QueryExecutionError::column_count_mismatch(width, tuple.len()));
                        continue;
                    }
                    for (position, tree) in tuple.iter().enumerate() {
                        row[position] = tree.eval(&[]);
                    }
                }
            }
            for column in self.table.def().columns() {
                let value = std::mem::replace(&mut row[column.index()], ScalarValue::Null);
                row[column.index()] = coerce(strict, column, value);
            }
            match validator.validate(&row, None) {
                Ok(()) => {
                    self.table.append(row);
                    inserted += 1;
                }
                Err(error) => log::error!("{}", error),
            }
        }
        if inserted > 0 {
            self.catalog.mark_indexes_stale(self.table.name());
        }
        Ok(inserted)
    }
}

pub struct UpdateQueryPlan<'p> {
    catalog: &'p Catalog,
    table: TableHandle,
    assignments: Vec<(usize, TypedTree)>,
    filter: Option<TypedTree>,
}

impl<'p> UpdateQueryPlan<'p> {
    pub fn new(
        catalog: &'p Catalog,
        table: TableHandle,
        assignments: Vec<(usize, TypedTree)>,
        filter: Option<TypedTree>,
    ) -> UpdateQueryPlan<'p> {
        UpdateQueryPlan {
            catalog,
            table,
            assignments,
            filter,
        }
    }

    pub fn execute(self) -> Result<usize, QueryExecutionError> {
        let validator = ConstraintValidator::new(self.catalog, &self.table);
        let strict = self.table.def().is_strict();
        let rows = self.table.scan();
        let mut updated = 0;
        for (index, row) in rows.iter().enumerate() {
            let qualifies = match &self.filter {
                None => true,
                Some(predicate) => predicate.matches(row),
            };
            if !qualifies {
                continue;
            }
            let mut new_row = row.clone();
            for (position, tree) in &self.assignments {
                // assignments see the row's values from before this UPDATE
                let value = tree.eval(row);
                new_row[*position] = coerce(strict, &self.table.def().columns()[*position], value);
            }
            match validator.validate(&new_row, Some(index)) {
                Ok(()) => {
                    self.table.update_row(index, new_row);
                    updated += 1;
                }
                Err(error) => log::error!("{}", error),
            }
        }
        if updated > 0 {
            self.catalog.mark_indexes_stale(self.table.name());
        }
        Ok(updated)
    }
}

pub struct DeleteQueryPlan<'p> {
    catalog: &'p Catalog,
    table: TableHandle,
    filter: Option<TypedTree>,
}

impl<'p> DeleteQueryPlan<'p> {
    pub fn new(catalog: &'p Catalog, table: TableHandle, filter: Option<TypedTree>) -> DeleteQueryPlan<'p> {
        DeleteQueryPlan { catalog, table, filter }
    }

    pub fn execute(self) -> Result<usize, QueryExecutionError> {
        let rows = self.table.scan();
        let total = rows.len();
        let kept = match &self.filter {
            None => vec![],
            Some(predicate) => rows.into_iter().filter(|row| !predicate.matches(row)).collect(),
        };
        let deleted = total - kept.len();
        self.table.replace_rows(kept);
        if deleted > 0 {
            self.catalog.mark_indexes_stale(self.table.name());
        }
        Ok(deleted)
    }
}

pub struct SelectQueryPlan<'p> {
    catalog: &'p Catalog,
    table_name: Option<String>,
    join: Option<TypedJoin>,
    projection_items: Vec<ProjectionItem>,
    filter: Option<TypedTree>,
    order_by: Vec<SortKey>,
    limit: Option<usize>,
}

impl<'p> SelectQueryPlan<'p> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: &'p Catalog,
        table_name: Option<String>,
        join: Option<TypedJoin>,
        projection_items: Vec<ProjectionItem>,
        filter: Option<TypedTree>,
        order_by: Vec<SortKey>,
        limit: Option<usize>,
    ) -> SelectQueryPlan<'p> {
        SelectQueryPlan {
            catalog,
            table_name,
            join,
            projection_items,
            filter,
            order_by,
            limit,
        }
    }

    pub fn execute(self) -> Result<QueryResult, QueryExecutionError> {
        let mut join_table = None;
        let source = match &self.table_name {
            None => None,
            Some(table_name) => {
                let left = self
                    .catalog
                    .table(table_name)
                    .ok_or_else(|| QueryExecutionError::table_does_not_exist(table_name))?;
                match self.join.clone() {
                    None => Some(left),
                    Some(join) => {
                        let right = self
                            .catalog
                            .table(&join.right_table)
                            .ok_or_else(|| QueryExecutionError::table_does_not_exist(&join.right_table))?;
                        let joined = NestedLoopJoin::new(left, right, join).execute(self.catalog)?;
                        join_table = Some(joined.name().to_owned());
                        Some(joined)
                    }
                }
            }
        };
        let result = self.project(source.as_ref());
        if let Some(table_name) = join_table {
            // the synthesized join table does not outlive the statement
            let _ = self.catalog.drop_table(&table_name);
        }
        result
    }

    fn project(&self, source: Option<&TableHandle>) -> Result<QueryResult, QueryExecutionError> {
        log::debug!(
            "[PROJECT] columns: {}",
            self.projection_items.iter().map(|item| item.alias.as_str()).join(", ")
        );
        let filtered = match source {
            Some(table) => {
                let mut flow = Filter::new(FullTableScan::new(table), self.filter.clone());
                let mut rows = vec![];
                while let Some((_key, row)) = flow.next_tuple()? {
                    rows.push(row);
                }
                rows
            }
            None => {
                // no FROM clause: the projection runs once over an empty row
                let empty: Row = vec![];
                match &self.filter {
                    Some(predicate) if !predicate.matches(&empty) => vec![],
                    _ => vec![empty],
                }
            }
        };

        let has_aggregates = self
            .projection_items
            .iter()
            .any(|item| item.tree.contains_aggregate());
        let mut output = if has_aggregates {
            let mut nodes = vec![];
            for item in &self.projection_items {
                item.tree.collect_aggregates(&mut nodes);
            }
            let results = nodes
                .into_iter()
                .map(|node| aggregate_over(node, &filtered))
                .collect::<Vec<ScalarValue>>();
            let width = source.map(|table| table.def().columns().len()).unwrap_or(0);
            // plain items alongside aggregates read from the first
            // qualifying row, or NULLs when nothing qualified
            let base_row = filtered
                .first()
                .cloned()
                .unwrap_or_else(|| vec![ScalarValue::Null; width]);
            let mut next = 0;
            let row = self
                .projection_items
                .iter()
                .map(|item| item.tree.eval_with_aggregates(&base_row, &results, &mut next))
                .collect::<Row>();
            vec![row]
        } else {
            let mut rows = filtered;
            sort_rows(&mut rows, &self.order_by);
            rows.iter()
                .map(|row| {
                    self.projection_items
                        .iter()
                        .map(|item| item.tree.eval(row))
                        .collect::<Row>()
                })
                .collect()
        };

        if let Some(limit) = self.limit {
            output.truncate(limit);
        }
        let column_names = self
            .projection_items
            .iter()
            .map(|item| item.alias.clone())
            .collect::<Vec<String>>();
        Ok(QueryResult::new(column_names, output))
    }
}

/// Reduces one aggregate node over the WHERE-qualifying rows. DISTINCT
/// de-duplicates the operand values before the reduction; the buffer lives
/// only for this call.
fn aggregate_over(node: &TypedTree, rows: &[Row]) -> ScalarValue {
    match node {
        TypedTree::Aggregate { func, operand, distinct } => match operand {
            None => ScalarValue::Int(rows.len() as i64),
            Some(tree) => {
                let mut values = rows.iter().map(|row| tree.eval(row)).collect::<Vec<ScalarValue>>();
                if *distinct {
                    let mut unique: Vec<ScalarValue> = vec![];
                    for value in values {
                        if !unique.iter().any(|seen| seen.value_eq(&value)) {
                            unique.push(value);
                        }
                    }
                    values = unique;
                }
                func.apply(&values)
            }
        },
        other => {
            log::error!("{:?} is not an aggregate node", other);
            ScalarValue::Error
        }
    }
}

/// Stable multi-key sort. Ties fall through to the next key; rows equal on
/// every key keep their original order.
fn sort_rows(rows: &mut [Row], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|left, right| {
        for key in keys {
            let ordering = key.tree.eval(left).compare(&key.tree.eval(right));
            let ordering = match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests;
