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

use data_manipulation_operators::{AggregateFunction, BiLogical, BiOperator, ScalarFunction, UnOperator};
use data_scalar::ScalarValue;
use types::SqlType;

/// Expression tree with columns already resolved to row positions.
///
/// The same tree shape is walked in two modes: [`TypedTree::eval`] produces a
/// value for projections and assignments, [`TypedTree::matches`] collapses
/// three-valued logic into a yes/no answer for WHERE, ON and write
/// predicates.
#[derive(Debug, PartialEq, Clone)]
pub enum TypedTree {
    Item(TypedItem),
    BiOp {
        left: Box<TypedTree>,
        op: BiOperator,
        right: Box<TypedTree>,
    },
    UnOp {
        op: UnOperator,
        item: Box<TypedTree>,
    },
    ScalarFunction {
        func: ScalarFunction,
        args: Vec<TypedTree>,
    },
    Aggregate {
        func: AggregateFunction,
        operand: Option<Box<TypedTree>>,
        distinct: bool,
    },
    Subquery,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TypedItem {
    Const(ScalarValue),
    Null,
    Column {
        name: String,
        sql_type: SqlType,
        index: usize,
    },
}

impl TypedTree {
    /// Value-mode evaluation against a single row.
    pub fn eval(&self, row: &[ScalarValue]) -> ScalarValue {
        match self {
            TypedTree::Item(TypedItem::Const(value)) => value.clone(),
            TypedTree::Item(TypedItem::Null) => ScalarValue::Null,
            TypedTree::Item(TypedItem::Column { index, .. }) => {
                row.get(*index).cloned().unwrap_or(ScalarValue::Null)
            }
            TypedTree::BiOp { left, op: BiOperator::Logical(logical), right } => {
                let holds = match logical {
                    BiLogical::And => left.matches(row) && right.matches(row),
                    BiLogical::Or => left.matches(row) || right.matches(row),
                };
                ScalarValue::Int(if holds { 1 } else { 0 })
            }
            TypedTree::BiOp { left, op, right } => op.eval(left.eval(row), right.eval(row)),
            TypedTree::UnOp { op: UnOperator::LogicalNot, item } => {
                ScalarValue::Int(if item.matches(row) { 0 } else { 1 })
            }
            TypedTree::UnOp { op, item } => op.eval(item.eval(row)),
            TypedTree::ScalarFunction { func, args } => {
                let args = args.iter().map(|arg| arg.eval(row)).collect::<Vec<ScalarValue>>();
                func.eval(&args)
            }
            TypedTree::Aggregate { func, .. } => {
                log::error!("aggregate function {} evaluated outside of an aggregation", func);
                ScalarValue::Error
            }
            TypedTree::Subquery => {
                log::error!("subquery evaluation is not implemented");
                ScalarValue::Error
            }
        }
    }

    /// Predicate-mode evaluation. NULL and ERROR answers collapse to
    /// "not matching".
    pub fn matches(&self, row: &[ScalarValue]) -> bool {
        match self {
            TypedTree::BiOp { left, op: BiOperator::Logical(BiLogical::And), right } => {
                left.matches(row) && right.matches(row)
            }
            TypedTree::BiOp { left, op: BiOperator::Logical(BiLogical::Or), right } => {
                left.matches(row) || right.matches(row)
            }
            TypedTree::UnOp { op: UnOperator::LogicalNot, item } => !item.matches(row),
            TypedTree::BiOp { op: BiOperator::Comparison(_), .. }
            | TypedTree::BiOp { op: BiOperator::Matching(_), .. } => self.eval(row) == ScalarValue::Int(1),
            _ => {
                let value = self.eval(row);
                !value.is_null() && !value.is_error()
            }
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            TypedTree::Item(_) | TypedTree::Subquery => false,
            TypedTree::Aggregate { .. } => true,
            TypedTree::BiOp { left, right, .. } => left.contains_aggregate() || right.contains_aggregate(),
            TypedTree::UnOp { item, .. } => item.contains_aggregate(),
            TypedTree::ScalarFunction { args, .. } => args.iter().any(TypedTree::contains_aggregate),
        }
    }

    /// Collects aggregate nodes in evaluation order. The order has to match
    /// [`TypedTree::eval_with_aggregates`], which consumes precomputed
    /// results positionally.
    pub fn collect_aggregates<'t>(&'t self, found: &mut Vec<&'t TypedTree>) {
        match self {
            TypedTree::Item(_) | TypedTree::Subquery => {}
            TypedTree::Aggregate { .. } => found.push(self),
            TypedTree::BiOp { left, right, .. } => {
                left.collect_aggregates(found);
                right.collect_aggregates(found);
            }
            TypedTree::UnOp { item, .. } => item.collect_aggregates(found),
            TypedTree::ScalarFunction { args, .. } => {
                for arg in args {
                    arg.collect_aggregates(found);
                }
            }
        }
    }

    /// Value-mode evaluation inside an aggregation: aggregate nodes take the
    /// next precomputed result instead of evaluating.
    pub fn eval_with_aggregates(
        &self,
        row: &[ScalarValue],
        results: &[ScalarValue],
        next: &mut usize,
    ) -> ScalarValue {
        if !self.contains_aggregate() {
            return self.eval(row);
        }
        match self {
            TypedTree::Aggregate { .. } => {
                let value = results.get(*next).cloned().unwrap_or(ScalarValue::Error);
                *next += 1;
                value
            }
            TypedTree::BiOp { left, op, right } => {
                let left = left.eval_with_aggregates(row, results, next);
                let right = right.eval_with_aggregates(row, results, next);
                op.eval(left, right)
            }
            TypedTree::UnOp { op, item } => {
                let value = item.eval_with_aggregates(row, results, next);
                op.eval(value)
            }
            TypedTree::ScalarFunction { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.eval_with_aggregates(row, results, next))
                    .collect::<Vec<ScalarValue>>();
                func.eval(&args)
            }
            other => other.eval(row),
        }
    }
}
