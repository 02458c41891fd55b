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
use data_manipulation_operators::AggregateFunction;

fn select(
    catalog: &Catalog,
    items: Vec<ProjectionItem>,
    filter: Option<TypedTree>,
    order_by: Vec<SortKey>,
    limit: Option<usize>,
) -> QueryResult {
    SelectQueryPlan::new(catalog, Some("users".to_owned()), None, items, filter, order_by, limit)
        .execute()
        .unwrap()
}

#[test]
fn projection_of_all_columns() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(
        &catalog,
        vec![
            item(column("id", 0), "id"),
            item(column("name", 1), "name"),
            item(column("age", 2), "age"),
        ],
        None,
        vec![],
        None,
    );

    assert_eq!(result.column_names(), &["id", "name", "age"]);
    assert_eq!(result.row_count(), 2);
    assert_eq!(
        result.rows()[0],
        vec![
            ScalarValue::Int(1),
            ScalarValue::String("Alice".to_owned()),
            ScalarValue::Int(25),
        ]
    );
}

#[test]
fn filter_gates_the_projection() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(
        &catalog,
        vec![item(column("name", 1), "name")],
        Some(lt(column("age", 2), int(28))),
        vec![],
        None,
    );

    assert_eq!(result.rows(), &[vec![ScalarValue::String("Alice".to_owned())]]);
}

#[test]
fn projected_expressions_are_evaluated_per_row() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(
        &catalog,
        vec![item(
            TypedTree::BiOp {
                left: Box::new(column("age", 2)),
                op: BiOperator::Arithmetic(data_manipulation_operators::BiArithmetic::Add),
                right: Box::new(int(1)),
            },
            "expr",
        )],
        None,
        vec![],
        None,
    );

    assert_eq!(result.rows(), &[vec![ScalarValue::Int(26)], vec![ScalarValue::Int(31)]]);
}

#[test]
fn order_by_descending_with_limit() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(
        &catalog,
        vec![item(column("name", 1), "name")],
        None,
        vec![SortKey {
            tree: column("age", 2),
            order: SortOrder::Desc,
        }],
        Some(1),
    );

    assert_eq!(result.rows(), &[vec![ScalarValue::String("Bob".to_owned())]]);
}

#[test]
fn limit_zero_emits_no_rows() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(&catalog, vec![item(column("id", 0), "id")], None, vec![], Some(0));

    assert_eq!(result.row_count(), 0);
}

#[test]
fn limit_larger_than_row_count_returns_everything() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(&catalog, vec![item(column("id", 0), "id")], None, vec![], Some(100));

    assert_eq!(result.row_count(), 2);
}

#[test]
fn stable_sort_preserves_insertion_order_on_ties() {
    let catalog = Catalog::default();
    let table = users_table(&catalog);
    table.append(vec![
        ScalarValue::Int(3),
        ScalarValue::String("Carol".to_owned()),
        ScalarValue::Int(25),
    ]);

    let result = select(
        &catalog,
        vec![item(column("name", 1), "name")],
        None,
        vec![SortKey {
            tree: column("age", 2),
            order: SortOrder::Asc,
        }],
        None,
    );

    assert_eq!(
        result.rows(),
        &[
            vec![ScalarValue::String("Alice".to_owned())],
            vec![ScalarValue::String("Carol".to_owned())],
            vec![ScalarValue::String("Bob".to_owned())],
        ]
    );
}

#[test]
fn order_by_applies_before_limit() {
    let catalog = Catalog::default();
    users_table(&catalog);

    let result = select(
        &catalog,
        vec![item(column("id", 0), "id")],
        None,
        vec![SortKey {
            tree: column("id", 0),
            order: SortOrder::Desc,
        }],
        Some(1),
    );

    assert_eq!(result.rows(), &[vec![ScalarValue::Int(2)]]);
}

#[test]
fn select_without_a_table_projects_once() {
    let catalog = Catalog::default();

    let result = SelectQueryPlan::new(
        &catalog,
        None,
        None,
        vec![item(
            TypedTree::BiOp {
                left: Box::new(int(1)),
                op: BiOperator::Arithmetic(data_manipulation_operators::BiArithmetic::Add),
                right: Box::new(int(2)),
            },
            "expr",
        )],
        None,
        vec![],
        None,
    )
    .execute()
    .unwrap();

    assert_eq!(result.rows(), &[vec![ScalarValue::Int(3)]]);
}

#[test]
fn unknown_table_aborts_the_statement() {
    let catalog = Catalog::default();

    let result = SelectQueryPlan::new(
        &catalog,
        Some("missing".to_owned()),
        None,
        vec![item(column("id", 0), "id")],
        None,
        vec![],
        None,
    )
    .execute();

    assert_eq!(result, Err(QueryExecutionError::table_does_not_exist("missing")));
}

#[cfg(test)]
mod aggregations {
    use super::*;

    fn values_table(catalog: &Catalog) -> TableHandle {
        let table = catalog
            .create_table(TableDef::new(
                "a".to_owned(),
                vec![
                    ColumnDef::new("id".to_owned(), SqlType::Int, 0),
                    ColumnDef::new("v".to_owned(), SqlType::Int, 1),
                ],
            ))
            .unwrap();
        table.append(vec![ScalarValue::Int(1), ScalarValue::Int(10)]);
        table.append(vec![ScalarValue::Int(2), ScalarValue::Null]);
        table.append(vec![ScalarValue::Int(3), ScalarValue::Int(20)]);
        table
    }

    fn aggregate(func: AggregateFunction, operand: Option<TypedTree>, distinct: bool) -> TypedTree {
        TypedTree::Aggregate {
            func,
            operand: operand.map(Box::new),
            distinct,
        }
    }

    #[test]
    fn one_row_regardless_of_input_cardinality() {
        let catalog = Catalog::default();
        values_table(&catalog);

        let result = SelectQueryPlan::new(
            &catalog,
            Some("a".to_owned()),
            None,
            vec![
                item(aggregate(AggregateFunction::Count, None, false), "COUNT(*)"),
                item(
                    aggregate(AggregateFunction::Count, Some(column("v", 1)), false),
                    "COUNT(v)",
                ),
                item(aggregate(AggregateFunction::Sum, Some(column("v", 1)), false), "SUM(v)"),
                item(aggregate(AggregateFunction::Avg, Some(column("v", 1)), false), "AVG(v)"),
                item(aggregate(AggregateFunction::Min, Some(column("v", 1)), false), "MIN(v)"),
                item(aggregate(AggregateFunction::Max, Some(column("v", 1)), false), "MAX(v)"),
            ],
            None,
            vec![],
            None,
        )
        .execute()
        .unwrap();

        assert_eq!(
            result.rows(),
            &[vec![
                ScalarValue::Int(3),
                ScalarValue::Int(2),
                ScalarValue::Int(30),
                ScalarValue::Float(15.0),
                ScalarValue::Int(10),
                ScalarValue::Int(20),
            ]]
        );
    }

    #[test]
    fn where_clause_narrows_the_aggregated_set() {
        let catalog = Catalog::default();
        values_table(&catalog);

        let result = SelectQueryPlan::new(
            &catalog,
            Some("a".to_owned()),
            None,
            vec![item(aggregate(AggregateFunction::Count, None, false), "COUNT(*)")],
            Some(lt(column("id", 0), int(3))),
            vec![],
            None,
        )
        .execute()
        .unwrap();

        assert_eq!(result.rows(), &[vec![ScalarValue::Int(2)]]);
    }

    #[test]
    fn distinct_deduplicates_before_reduction() {
        let catalog = Catalog::default();
        let table = values_table(&catalog);
        table.append(vec![ScalarValue::Int(4), ScalarValue::Int(10)]);

        let result = SelectQueryPlan::new(
            &catalog,
            Some("a".to_owned()),
            None,
            vec![
                item(
                    aggregate(AggregateFunction::Count, Some(column("v", 1)), true),
                    "COUNT(DISTINCT v)",
                ),
                item(
                    aggregate(AggregateFunction::Sum, Some(column("v", 1)), true),
                    "SUM(DISTINCT v)",
                ),
            ],
            None,
            vec![],
            None,
        )
        .execute()
        .unwrap();

        assert_eq!(result.rows(), &[vec![ScalarValue::Int(2), ScalarValue::Int(30)]]);
    }

    #[test]
    fn aggregates_over_an_empty_set_reduce_to_zero() {
        let catalog = Catalog::default();
        values_table(&catalog);

        let result = SelectQueryPlan::new(
            &catalog,
            Some("a".to_owned()),
            None,
            vec![
                item(aggregate(AggregateFunction::Sum, Some(column("v", 1)), false), "SUM(v)"),
                item(aggregate(AggregateFunction::Avg, Some(column("v", 1)), false), "AVG(v)"),
            ],
            Some(eq(column("id", 0), int(99))),
            vec![],
            None,
        )
        .execute()
        .unwrap();

        assert_eq!(result.rows(), &[vec![ScalarValue::Int(0), ScalarValue::Int(0)]]);
    }

    #[test]
    fn plain_item_next_to_aggregate_reads_the_first_row() {
        let catalog = Catalog::default();
        values_table(&catalog);

        let result = SelectQueryPlan::new(
            &catalog,
            Some("a".to_owned()),
            None,
            vec![
                item(column("id", 0), "id"),
                item(aggregate(AggregateFunction::Count, None, false), "COUNT(*)"),
            ],
            None,
            vec![],
            None,
        )
        .execute()
        .unwrap();

        assert_eq!(result.rows(), &[vec![ScalarValue::Int(1), ScalarValue::Int(3)]]);
    }
}
