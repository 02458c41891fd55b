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

use crate::tree_builder::{ColumnContext, TreeBuilder};
use catalog::Catalog;
use data_definition::{
    CreateIndexQuery, CreateTableQuery, DropIndexQuery, DropTableQuery, SchemaChange,
};
use data_manipulation_typed_queries::{
    JoinKind, ProjectionItem, SortKey, SortOrder, TypedDeleteQuery, TypedInsertQuery, TypedJoin, TypedQuery,
    TypedSelectQuery, TypedUpdateQuery,
};
use data_manipulation_typed_tree::{TypedItem, TypedTree};
use definition::{ColumnDef, ForeignKeyRef, TableDef};
use query_ast::{
    ColumnConstraint, DataType, Definition, DeleteStatement, Expr, InsertStatement, JoinType, Query, SelectItem,
    SelectStatement, UpdateStatement,
};
use std::fmt::{self, Display, Formatter};
use types::SqlType;

mod tree_builder;

#[derive(Debug, PartialEq)]
pub enum AnalysisError {
    TableDoesNotExist(String),
    ColumnNotFound(String),
    NotSupported(String),
}

impl AnalysisError {
    pub fn table_does_not_exist<T: ToString>(table: T) -> AnalysisError {
        AnalysisError::TableDoesNotExist(table.to_string())
    }

    pub fn column_not_found<C: ToString>(column: C) -> AnalysisError {
        AnalysisError::ColumnNotFound(column.to_string())
    }

    pub fn not_supported<W: ToString>(what: W) -> AnalysisError {
        AnalysisError::NotSupported(what.to_string())
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::TableDoesNotExist(table) => write!(f, "table {} does not exist", table),
            AnalysisError::ColumnNotFound(column) => write!(f, "column {} not found", column),
            AnalysisError::NotSupported(what) => write!(f, "{} is not supported", what),
        }
    }
}

/// Resolves parsed statements against the catalog: table and column names
/// become handles and row positions, expressions become [`TypedTree`]s.
pub struct QueryAnalyzer<'a> {
    catalog: &'a Catalog,
}

impl<'a> From<&'a Catalog> for QueryAnalyzer<'a> {
    fn from(catalog: &'a Catalog) -> QueryAnalyzer<'a> {
        QueryAnalyzer { catalog }
    }
}

impl<'a> QueryAnalyzer<'a> {
    pub fn analyze(&self, query: Query) -> Result<TypedQuery, AnalysisError> {
        match query {
            Query::Insert(InsertStatement {
                table_name,
                columns,
                values,
            }) => {
                let table = self
                    .catalog
                    .table(&table_name)
                    .ok_or_else(|| AnalysisError::table_does_not_exist(&table_name))?;
                let columns = if columns.is_empty() {
                    None
                } else {
                    let mut positions = vec![];
                    for column in &columns {
                        match table.def().column_index(column) {
                            Some(position) => positions.push(position),
                            None => return Err(AnalysisError::column_not_found(column)),
                        }
                    }
                    Some(positions)
                };
                // VALUES tuples cannot reference columns, so they are built
                // against an empty context
                let context = ColumnContext::empty();
                let mut tuples = vec![];
                for tuple in values {
                    let mut trees = vec![];
                    for value in tuple {
                        trees.push(TreeBuilder::build(value, &context)?);
                    }
                    tuples.push(trees);
                }
                Ok(TypedQuery::Insert(TypedInsertQuery {
                    table_name,
                    values: tuples,
                    columns,
                }))
            }
            Query::Update(UpdateStatement {
                table_name,
                assignments,
                where_clause,
            }) => {
                let table = self
                    .catalog
                    .table(&table_name)
                    .ok_or_else(|| AnalysisError::table_does_not_exist(&table_name))?;
                let context = ColumnContext::over_table(&table_name, table.def());
                let mut typed_assignments = vec![];
                for assignment in assignments {
                    let position = table
                        .def()
                        .column_index(&assignment.column)
                        .ok_or_else(|| AnalysisError::column_not_found(&assignment.column))?;
                    typed_assignments.push((position, TreeBuilder::build(assignment.value, &context)?));
                }
                let filter = match where_clause {
                    None => None,
                    Some(predicate) => Some(TreeBuilder::build(predicate, &context)?),
                };
                Ok(TypedQuery::Update(TypedUpdateQuery {
                    table_name,
                    assignments: typed_assignments,
                    filter,
                }))
            }
            Query::Delete(DeleteStatement {
                table_name,
                where_clause,
            }) => {
                let table = self
                    .catalog
                    .table(&table_name)
                    .ok_or_else(|| AnalysisError::table_does_not_exist(&table_name))?;
                let context = ColumnContext::over_table(&table_name, table.def());
                let filter = match where_clause {
                    None => None,
                    Some(predicate) => Some(TreeBuilder::build(predicate, &context)?),
                };
                Ok(TypedQuery::Delete(TypedDeleteQuery { table_name, filter }))
            }
            Query::Select(select) => self.analyze_select(select),
        }
    }

    fn analyze_select(&self, select: SelectStatement) -> Result<TypedQuery, AnalysisError> {
        let SelectStatement {
            select_items,
            table,
            join,
            where_clause,
            order_by,
            limit,
        } = select;

        let mut context = ColumnContext::empty();
        let table_name = match &table {
            None => None,
            Some(table) => {
                let handle = self
                    .catalog
                    .table(&table.name)
                    .ok_or_else(|| AnalysisError::table_does_not_exist(&table.name))?;
                let label = table.alias.as_deref().unwrap_or(&table.name);
                context.push_segment(label, handle.def());
                Some(table.name.clone())
            }
        };
        let typed_join = match join {
            None => None,
            Some(join) => {
                if table_name.is_none() {
                    return Err(AnalysisError::not_supported("JOIN without a FROM table"));
                }
                let right = self
                    .catalog
                    .table(&join.table.name)
                    .ok_or_else(|| AnalysisError::table_does_not_exist(&join.table.name))?;
                let label = join.table.alias.as_deref().unwrap_or(&join.table.name);
                context.push_segment(label, right.def());
                let kind = match join.join_type {
                    JoinType::Inner => JoinKind::Inner,
                    JoinType::LeftOuter => JoinKind::LeftOuter,
                };
                Some(TypedJoin {
                    right_table: join.table.name,
                    kind,
                    on: TreeBuilder::build(join.on, &context)?,
                })
            }
        };

        let mut projection_items = vec![];
        for select_item in select_items {
            match select_item {
                SelectItem::Wildcard => {
                    // `*` expands to the source columns in declaration order
                    for (name, sql_type, index) in context.all_columns() {
                        projection_items.push(ProjectionItem {
                            tree: TypedTree::Item(TypedItem::Column {
                                name: name.clone(),
                                sql_type,
                                index,
                            }),
                            alias: name,
                        });
                    }
                }
                SelectItem::Expr { expr, alias } => {
                    let alias = match &alias {
                        Some(alias) => alias.clone(),
                        None => match &expr {
                            Expr::Column { name, .. } => name.clone(),
                            _ => "expr".to_owned(),
                        },
                    };
                    projection_items.push(ProjectionItem {
                        tree: TreeBuilder::build(expr, &context)?,
                        alias,
                    });
                }
            }
        }

        let filter = match where_clause {
            None => None,
            Some(predicate) => Some(TreeBuilder::build(predicate, &context)?),
        };
        let mut sort_keys = vec![];
        for order_by_item in order_by {
            sort_keys.push(SortKey {
                tree: TreeBuilder::build(order_by_item.expr, &context)?,
                order: if order_by_item.asc { SortOrder::Asc } else { SortOrder::Desc },
            });
        }

        Ok(TypedQuery::Select(TypedSelectQuery {
            table_name,
            join: typed_join,
            projection_items,
            filter,
            order_by: sort_keys,
            limit: limit.map(|limit| limit as usize),
        }))
    }

    pub fn analyze_definition(&self, definition: Definition) -> Result<SchemaChange, AnalysisError> {
        match definition {
            Definition::CreateTable { table_name, columns } => {
                let mut column_defs = vec![];
                for (ord_num, column) in columns.into_iter().enumerate() {
                    let mut column_def = ColumnDef::new(column.name, convert_type(column.data_type), ord_num);
                    for constraint in column.constraints {
                        column_def = match constraint {
                            ColumnConstraint::NotNull => column_def.not_null(),
                            ColumnConstraint::Unique => column_def.unique(),
                            ColumnConstraint::PrimaryKey => column_def.primary_key(),
                            ColumnConstraint::ForeignKey {
                                table_name,
                                column_name,
                            } => column_def.references(ForeignKeyRef::new(table_name, column_name)),
                        };
                    }
                    column_defs.push(column_def);
                }
                Ok(SchemaChange::CreateTable(CreateTableQuery {
                    table_def: TableDef::new(table_name, column_defs),
                }))
            }
            Definition::DropTable { table_name } => Ok(SchemaChange::DropTable(DropTableQuery { table_name })),
            Definition::CreateIndex {
                name,
                table_name,
                column_name,
            } => Ok(SchemaChange::CreateIndex(CreateIndexQuery {
                name,
                table_name,
                column_name,
            })),
            Definition::DropIndex { name } => Ok(SchemaChange::DropIndex(DropIndexQuery { name })),
        }
    }
}

fn convert_type(data_type: DataType) -> SqlType {
    match data_type {
        DataType::Int => SqlType::Int,
        DataType::Float => SqlType::Float,
        DataType::String => SqlType::String,
        DataType::Date => SqlType::Date,
        DataType::Time => SqlType::Time,
    }
}

#[cfg(test)]
mod tests;
