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

use crate::AnalysisError;
use data_manipulation_operators::{AggregateFunction, BiOperator, ScalarFunction, UnOperator};
use data_manipulation_typed_tree::{TypedItem, TypedTree};
use data_scalar::ScalarValue;
use definition::TableDef;
use query_ast::{Expr, FunctionArg, Value};
use types::SqlType;

/// Column namespace of one statement: the source table, or for a join the
/// left table's columns followed by the right table's. Positions are
/// absolute within the merged row.
pub(crate) struct ColumnContext {
    segments: Vec<Segment>,
    width: usize,
}

struct Segment {
    label: String,
    columns: Vec<(String, SqlType, usize)>,
}

impl ColumnContext {
    pub(crate) fn empty() -> ColumnContext {
        ColumnContext {
            segments: vec![],
            width: 0,
        }
    }

    pub(crate) fn over_table(label: &str, def: &TableDef) -> ColumnContext {
        let mut context = ColumnContext::empty();
        context.push_segment(label, def);
        context
    }

    pub(crate) fn push_segment(&mut self, label: &str, def: &TableDef) {
        let offset = self.width;
        let columns = def
            .columns()
            .iter()
            .map(|column| (column.name().to_owned(), column.sql_type(), offset + column.index()))
            .collect::<Vec<(String, SqlType, usize)>>();
        self.width += columns.len();
        self.segments.push(Segment {
            label: label.to_owned(),
            columns,
        });
    }

    /// Unqualified lookup takes the leftmost match across segments;
    /// qualified lookup matches within the named segment only.
    fn resolve(&self, table: Option<&str>, name: &str) -> Option<(String, SqlType, usize)> {
        self.segments
            .iter()
            .filter(|segment| table.map(|table| segment.label == table).unwrap_or(true))
            .flat_map(|segment| segment.columns.iter())
            .find(|(column_name, _sql_type, _index)| column_name == name)
            .cloned()
    }

    pub(crate) fn all_columns(&self) -> Vec<(String, SqlType, usize)> {
        self.segments
            .iter()
            .flat_map(|segment| segment.columns.iter())
            .cloned()
            .collect()
    }
}

pub(crate) struct TreeBuilder;

impl TreeBuilder {
    pub(crate) fn build(expr: Expr, context: &ColumnContext) -> Result<TypedTree, AnalysisError> {
        match expr {
            Expr::Column { table, name } => match context.resolve(table.as_deref(), &name) {
                Some((name, sql_type, index)) => Ok(TypedTree::Item(TypedItem::Column { name, sql_type, index })),
                None => {
                    // an unknown column projects as NULL rather than
                    // aborting the statement
                    log::warn!("unknown column {:?}", name);
                    Ok(TypedTree::Item(TypedItem::Null))
                }
            },
            Expr::Value(value) => Ok(TypedTree::Item(match value {
                Value::Int(value) => TypedItem::Const(ScalarValue::Int(value)),
                Value::Float(value) => TypedItem::Const(ScalarValue::Float(value)),
                Value::SingleQuotedString(value) => TypedItem::Const(ScalarValue::string_value(&value)),
                Value::Null => TypedItem::Null,
            })),
            Expr::BinaryOp { left, op, right } => Ok(TypedTree::BiOp {
                left: Box::new(TreeBuilder::build(*left, context)?),
                op: BiOperator::from(op),
                right: Box::new(TreeBuilder::build(*right, context)?),
            }),
            Expr::UnaryOp { op, expr } => Ok(TypedTree::UnOp {
                op: UnOperator::from(op),
                item: Box::new(TreeBuilder::build(*expr, context)?),
            }),
            Expr::Function { name, args, distinct } => TreeBuilder::build_function(name, args, distinct, context),
            Expr::Subquery => Ok(TypedTree::Subquery),
        }
    }

    fn build_function(
        name: String,
        args: Vec<FunctionArg>,
        distinct: bool,
        context: &ColumnContext,
    ) -> Result<TypedTree, AnalysisError> {
        if let Some(func) = AggregateFunction::from_name(&name) {
            if args.len() != 1 {
                return Err(AnalysisError::not_supported(format!(
                    "{} with {} arguments",
                    func,
                    args.len()
                )));
            }
            let operand = match args.into_iter().next() {
                Some(FunctionArg::Wildcard) => {
                    if func != AggregateFunction::Count {
                        return Err(AnalysisError::not_supported(format!("{}(*)", func)));
                    }
                    None
                }
                Some(FunctionArg::Expr(expr)) => Some(Box::new(TreeBuilder::build(expr, context)?)),
                None => None,
            };
            return Ok(TypedTree::Aggregate { func, operand, distinct });
        }
        if let Some(func) = ScalarFunction::from_name(&name) {
            if distinct {
                log::warn!("DISTINCT has no effect on {}", func);
            }
            let mut built = vec![];
            for arg in args {
                match arg {
                    FunctionArg::Wildcard => {
                        return Err(AnalysisError::not_supported(format!("{}(*)", func)));
                    }
                    FunctionArg::Expr(expr) => built.push(TreeBuilder::build(expr, context)?),
                }
            }
            return Ok(TypedTree::ScalarFunction { func, args: built });
        }
        Err(AnalysisError::not_supported(format!("function {}", name)))
    }
}
