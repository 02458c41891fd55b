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
use data_manipulation_operators::{BiOperator, Comparison};
use data_manipulation_typed_tree::TypedItem;
use definition::ForeignKeyRef;
use types::SqlType;

fn column(name: &str, index: usize) -> TypedTree {
    TypedTree::Item(TypedItem::Column {
        name: name.to_owned(),
        sql_type: SqlType::Int,
        index,
    })
}

fn int(value: i64) -> TypedTree {
    TypedTree::Item(TypedItem::Const(ScalarValue::Int(value)))
}

fn string(value: &str) -> TypedTree {
    TypedTree::Item(TypedItem::Const(ScalarValue::String(value.to_owned())))
}

fn eq(left: TypedTree, right: TypedTree) -> TypedTree {
    TypedTree::BiOp {
        left: Box::new(left),
        op: BiOperator::Comparison(Comparison::Eq),
        right: Box::new(right),
    }
}

fn lt(left: TypedTree, right: TypedTree) -> TypedTree {
    TypedTree::BiOp {
        left: Box::new(left),
        op: BiOperator::Comparison(Comparison::Lt),
        right: Box::new(right),
    }
}

fn item(tree: TypedTree, alias: &str) -> ProjectionItem {
    ProjectionItem {
        tree,
        alias: alias.to_owned(),
    }
}

fn users_table(catalog: &Catalog) -> TableHandle {
    let table = catalog
        .create_table(TableDef::new(
            "users".to_owned(),
            vec![
                ColumnDef::new("id".to_owned(), SqlType::Int, 0),
                ColumnDef::new("name".to_owned(), SqlType::String, 1),
                ColumnDef::new("age".to_owned(), SqlType::Int, 2),
            ],
        ))
        .unwrap();
    table.append(vec![
        ScalarValue::Int(1),
        ScalarValue::String("Alice".to_owned()),
        ScalarValue::Int(25),
    ]);
    table.append(vec![
        ScalarValue::Int(2),
        ScalarValue::String("Bob".to_owned()),
        ScalarValue::Int(30),
    ]);
    table
}

fn select_all(catalog: &Catalog, table: &str) -> Vec<Vec<ScalarValue>> {
    catalog.table(table).unwrap().scan()
}

mod selects;

#[cfg(test)]
mod joins {
    use super::*;

    fn orders_table(catalog: &Catalog) -> TableHandle {
        let table = catalog
            .create_table(TableDef::new(
                "orders".to_owned(),
                vec![
                    ColumnDef::new("uid".to_owned(), SqlType::Int, 0),
                    ColumnDef::new("amt".to_owned(), SqlType::Int, 1),
                ],
            ))
            .unwrap();
        table.append(vec![ScalarValue::Int(1), ScalarValue::Int(100)]);
        table
    }

    fn on_clause() -> TypedTree {
        // users.id = orders.uid over the merged row
        eq(column("id", 0), column("uid", 3))
    }

    #[test]
    fn inner_join_emits_matched_pairs_only() {
        let catalog = Catalog::default();
        let users = users_table(&catalog);
        let orders = orders_table(&catalog);

        let joined = NestedLoopJoin::new(
            users,
            orders,
            TypedJoin {
                right_table: "orders".to_owned(),
                kind: JoinKind::Inner,
                on: on_clause(),
            },
        )
        .execute(&catalog)
        .unwrap();

        assert_eq!(joined.row_count(), 1);
        assert_eq!(
            joined.scan()[0],
            vec![
                ScalarValue::Int(1),
                ScalarValue::String("Alice".to_owned()),
                ScalarValue::Int(25),
                ScalarValue::Int(1),
                ScalarValue::Int(100),
            ]
        );
    }

    #[test]
    fn left_join_pads_unmatched_left_rows_with_nulls() {
        let catalog = Catalog::default();
        let users = users_table(&catalog);
        let orders = orders_table(&catalog);

        let joined = NestedLoopJoin::new(
            users,
            orders,
            TypedJoin {
                right_table: "orders".to_owned(),
                kind: JoinKind::LeftOuter,
                on: on_clause(),
            },
        )
        .execute(&catalog)
        .unwrap();

        let rows = joined.scan();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][3], ScalarValue::Null);
        assert_eq!(rows[1][4], ScalarValue::Null);
    }

    #[test]
    fn join_table_is_registered_with_synthesized_name() {
        let catalog = Catalog::default();
        let users = users_table(&catalog);
        let orders = orders_table(&catalog);
        let expected = format!("_join_{}_{}", users.id(), orders.id());

        let joined = NestedLoopJoin::new(
            users,
            orders,
            TypedJoin {
                right_table: "orders".to_owned(),
                kind: JoinKind::Inner,
                on: on_clause(),
            },
        )
        .execute(&catalog)
        .unwrap();

        assert_eq!(joined.name(), expected.as_str());
        assert!(catalog.table(&expected).is_some());
    }

    #[test]
    fn merged_schema_keeps_duplicate_names_in_order() {
        let catalog = Catalog::default();
        let users = users_table(&catalog);
        let orders = orders_table(&catalog);

        let joined = NestedLoopJoin::new(
            users,
            orders,
            TypedJoin {
                right_table: "orders".to_owned(),
                kind: JoinKind::Inner,
                on: on_clause(),
            },
        )
        .execute(&catalog)
        .unwrap();

        assert_eq!(
            joined.def().column_names(),
            vec!["id", "name", "age", "uid", "amt"]
        );
    }
}
