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

use super::*;
use data_scalar::ScalarValue;
use query_ast::{Assignment, BinaryOperator, OrderByItem, TableName, Value};

fn users_catalog() -> Catalog {
    let catalog = Catalog::default();
    catalog
        .create_table(TableDef::new(
            "users".to_owned(),
            vec![
                ColumnDef::new("id".to_owned(), SqlType::Int, 0),
                ColumnDef::new("name".to_owned(), SqlType::String, 1),
            ],
        ))
        .unwrap();
    catalog
        .create_table(TableDef::new(
            "orders".to_owned(),
            vec![
                ColumnDef::new("uid".to_owned(), SqlType::Int, 0),
                ColumnDef::new("amt".to_owned(), SqlType::Int, 1),
            ],
        ))
        .unwrap();
    catalog
}

fn column(name: &str) -> Expr {
    Expr::Column {
        table: None,
        name: name.to_owned(),
    }
}

fn qualified(table: &str, name: &str) -> Expr {
    Expr::Column {
        table: Some(table.to_owned()),
        name: name.to_owned(),
    }
}

fn int(value: i64) -> Expr {
    Expr::Value(Value::Int(value))
}

fn typed_column(name: &str, sql_type: SqlType, index: usize) -> TypedTree {
    TypedTree::Item(TypedItem::Column {
        name: name.to_owned(),
        sql_type,
        index,
    })
}

fn select_from(table: &str, items: Vec<SelectItem>) -> SelectStatement {
    SelectStatement {
        select_items: items,
        table: Some(TableName {
            name: table.to_owned(),
            alias: None,
        }),
        join: None,
        where_clause: None,
        order_by: vec![],
        limit: None,
    }
}

fn analyzed_select(catalog: &Catalog, select: SelectStatement) -> TypedSelectQuery {
    match QueryAnalyzer::from(catalog).analyze(Query::Select(select)) {
        Ok(TypedQuery::Select(select)) => select,
        other => panic!("unexpected analysis result {:?}", other),
    }
}


#[cfg(test)]
mod insertions {
    use super::*;

    #[test]
    fn values_become_static_trees() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Insert(InsertStatement {
            table_name: "users".to_owned(),
            columns: vec![],
            values: vec![vec![int(1), Expr::Value(Value::SingleQuotedString("Alice".to_owned()))]],
        }));

        assert_eq!(
            analyzed,
            Ok(TypedQuery::Insert(TypedInsertQuery {
                table_name: "users".to_owned(),
                values: vec![vec![
                    TypedTree::Item(TypedItem::Const(ScalarValue::Int(1))),
                    TypedTree::Item(TypedItem::Const(ScalarValue::String("Alice".to_owned()))),
                ]],
                columns: None,
            }))
        );
    }

    #[test]
    fn column_list_maps_to_schema_positions() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Insert(InsertStatement {
            table_name: "users".to_owned(),
            columns: vec!["name".to_owned(), "id".to_owned()],
            values: vec![],
        }));

        match analyzed {
            Ok(TypedQuery::Insert(insert)) => assert_eq!(insert.columns, Some(vec![1, 0])),
            other => panic!("unexpected analysis result {:?}", other),
        }
    }

    #[test]
    fn unknown_column_in_the_list_is_an_error() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Insert(InsertStatement {
            table_name: "users".to_owned(),
            columns: vec!["missing".to_owned()],
            values: vec![],
        }));

        assert_eq!(analyzed, Err(AnalysisError::column_not_found("missing")));
    }

    #[test]
    fn unknown_table_is_an_error() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Insert(InsertStatement {
            table_name: "missing".to_owned(),
            columns: vec![],
            values: vec![],
        }));

        assert_eq!(analyzed, Err(AnalysisError::table_does_not_exist("missing")));
    }
}

#[cfg(test)]
mod updates {
    use super::*;

    #[test]
    fn assignments_resolve_to_positions() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Update(UpdateStatement {
            table_name: "users".to_owned(),
            assignments: vec![Assignment {
                column: "name".to_owned(),
                value: Expr::Value(Value::SingleQuotedString("Bob".to_owned())),
            }],
            where_clause: Some(Expr::BinaryOp {
                left: Box::new(column("id")),
                op: BinaryOperator::Eq,
                right: Box::new(int(1)),
            }),
        }));

        match analyzed {
            Ok(TypedQuery::Update(update)) => {
                assert_eq!(update.assignments.len(), 1);
                assert_eq!(update.assignments[0].0, 1);
                assert!(update.filter.is_some());
            }
            other => panic!("unexpected analysis result {:?}", other),
        }
    }

    #[test]
    fn unknown_assignment_target_is_an_error() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Update(UpdateStatement {
            table_name: "users".to_owned(),
            assignments: vec![Assignment {
                column: "missing".to_owned(),
                value: int(1),
            }],
            where_clause: None,
        }));

        assert_eq!(analyzed, Err(AnalysisError::column_not_found("missing")));
    }
}

#[cfg(test)]
mod deletes {
    use super::*;

    #[test]
    fn filter_resolves_against_the_table() {
        let catalog = users_catalog();

        let analyzed = QueryAnalyzer::from(&catalog).analyze(Query::Delete(DeleteStatement {
            table_name: "users".to_owned(),
            where_clause: Some(Expr::BinaryOp {
                left: Box::new(column("id")),
                op: BinaryOperator::Eq,
                right: Box::new(int(1)),
            }),
        }));

        match analyzed {
            Ok(TypedQuery::Delete(delete)) => assert!(delete.filter.is_some()),
            other => panic!("unexpected analysis result {:?}", other),
        }
    }
}
