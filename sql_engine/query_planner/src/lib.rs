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

use catalog::Catalog;
use data_manipulation_query_plan::{
    DeleteQueryPlan, InsertQueryPlan, QueryPlan, SelectQueryPlan, UpdateQueryPlan,
};
use data_manipulation_query_result::QueryExecutionError;
use data_manipulation_typed_queries::TypedQuery;

/// Turns an analyzed statement into its executable plan. SELECT follows the
/// fixed pipeline: join materialization, filter, aggregation when an
/// aggregate item is present, then projection with ORDER BY and LIMIT.
pub struct QueryPlanner<'p> {
    catalog: &'p Catalog,
}

impl<'p> From<&'p Catalog> for QueryPlanner<'p> {
    fn from(catalog: &'p Catalog) -> QueryPlanner<'p> {
        QueryPlanner { catalog }
    }
}

impl<'p> QueryPlanner<'p> {
    pub fn plan(&self, query: TypedQuery) -> Result<QueryPlan<'p>, QueryExecutionError> {
        match query {
            TypedQuery::Insert(insert) => {
                let table = self
                    .catalog
                    .table(&insert.table_name)
                    .ok_or_else(|| QueryExecutionError::table_does_not_exist(&insert.table_name))?;
                Ok(QueryPlan::Insert(InsertQueryPlan::new(
                    self.catalog,
                    table,
                    insert.columns,
                    insert.values,
                )))
            }
            TypedQuery::Update(update) => {
                let table = self
                    .catalog
                    .table(&update.table_name)
                    .ok_or_else(|| QueryExecutionError::table_does_not_exist(&update.table_name))?;
                Ok(QueryPlan::Update(UpdateQueryPlan::new(
                    self.catalog,
                    table,
                    update.assignments,
                    update.filter,
                )))
            }
            TypedQuery::Delete(delete) => {
                let table = self
                    .catalog
                    .table(&delete.table_name)
                    .ok_or_else(|| QueryExecutionError::table_does_not_exist(&delete.table_name))?;
                Ok(QueryPlan::Delete(DeleteQueryPlan::new(self.catalog, table, delete.filter)))
            }
            TypedQuery::Select(select) => Ok(QueryPlan::Select(SelectQueryPlan::new(
                self.catalog,
                select.table_name,
                select.join,
                select.projection_items,
                select.filter,
                select.order_by,
                select.limit,
            ))),
        }
    }
}
