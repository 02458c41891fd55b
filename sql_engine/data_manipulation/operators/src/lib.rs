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

use data_scalar::ScalarValue;
use query_ast::{BinaryOperator, UnaryOperator};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

mod functions;

pub use functions::{AggregateFunction, ScalarFunction};

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum BiArithmetic {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BiArithmetic {
    fn eval_int(&self, left: i64, right: i64) -> ScalarValue {
        match self {
            BiArithmetic::Add => ScalarValue::Int(left.wrapping_add(right)),
            BiArithmetic::Sub => ScalarValue::Int(left.wrapping_sub(right)),
            BiArithmetic::Mul => ScalarValue::Int(left.wrapping_mul(right)),
            BiArithmetic::Div => {
                if right == 0 {
                    ScalarValue::Error
                } else {
                    ScalarValue::Int(left / right)
                }
            }
            BiArithmetic::Mod => {
                if right == 0 {
                    ScalarValue::Error
                } else {
                    ScalarValue::Int(left % right)
                }
            }
        }
    }

    fn eval_float(&self, left: f64, right: f64) -> ScalarValue {
        match self {
            BiArithmetic::Add => ScalarValue::Float(left + right),
            BiArithmetic::Sub => ScalarValue::Float(left - right),
            BiArithmetic::Mul => ScalarValue::Float(left * right),
            BiArithmetic::Div => {
                if right == 0.0 {
                    ScalarValue::Error
                } else {
                    ScalarValue::Float(left / right)
                }
            }
            // modulus is only defined over integers
            BiArithmetic::Mod => ScalarValue::Error,
        }
    }
}

impl Display for BiArithmetic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BiArithmetic::Add => write!(f, "+"),
            BiArithmetic::Sub => write!(f, "-"),
            BiArithmetic::Mul => write!(f, "*"),
            BiArithmetic::Div => write!(f, "/"),
            BiArithmetic::Mod => write!(f, "%"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Comparison {
    NotEq,
    Eq,
    LtEq,
    GtEq,
    Lt,
    Gt,
}

impl Comparison {
    fn eval(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::NotEq => ordering != Ordering::Equal,
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::LtEq => ordering != Ordering::Greater,
            Comparison::GtEq => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Gt => ordering == Ordering::Greater,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::NotEq => write!(f, "<>"),
            Comparison::Eq => write!(f, "="),
            Comparison::LtEq => write!(f, "<="),
            Comparison::GtEq => write!(f, ">="),
            Comparison::Lt => write!(f, "<"),
            Comparison::Gt => write!(f, ">"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum BiLogical {
    Or,
    And,
}

impl Display for BiLogical {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BiLogical::Or => write!(f, "OR"),
            BiLogical::And => write!(f, "AND"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Matching {
    Like,
    NotLike,
}

impl Matching {
    fn eval(&self, value: &str, pattern: &str) -> bool {
        let matches = match regex::Regex::new(&like_pattern(pattern)) {
            Ok(re) => re.is_match(value),
            Err(error) => {
                log::error!("LIKE pattern {:?} failed to translate: {}", pattern, error);
                false
            }
        };
        match self {
            Matching::Like => matches,
            Matching::NotLike => !matches,
        }
    }
}

/// Translates a LIKE pattern into an anchored regular expression.
/// `%` matches any substring, `_` any single character and `\` escapes the
/// character after it; everything else matches literally.
fn like_pattern(pattern: &str) -> String {
    let mut translated = String::from("^");
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '%' => translated.push_str(".*"),
            '_' => translated.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => translated.push_str(&regex::escape(&escaped.to_string())),
                None => translated.push_str(&regex::escape("\\")),
            },
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    translated
}

impl Display for Matching {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Matching::Like => write!(f, "LIKE"),
            Matching::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum BiOperator {
    Arithmetic(BiArithmetic),
    Comparison(Comparison),
    Logical(BiLogical),
    Matching(Matching),
}

impl BiOperator {
    /// Value-mode evaluation. `Null` propagates, `Error` propagates,
    /// comparisons materialize as `Int(1)` / `Int(0)`. Logical operators are
    /// short-circuited by the expression tree and never reach this point.
    pub fn eval(self, left: ScalarValue, right: ScalarValue) -> ScalarValue {
        if left.is_error() || right.is_error() {
            return ScalarValue::Error;
        }
        if left.is_null() || right.is_null() {
            return ScalarValue::Null;
        }
        match self {
            BiOperator::Arithmetic(op) => match (&left, &right) {
                (ScalarValue::Int(left), ScalarValue::Int(right)) => op.eval_int(*left, *right),
                _ => match (left.as_f64(), right.as_f64()) {
                    (Some(left), Some(right)) => op.eval_float(left, right),
                    _ => {
                        log::error!("operator {} is undefined for {:?} and {:?}", op, left, right);
                        ScalarValue::Error
                    }
                },
            },
            BiOperator::Comparison(op) => {
                if op.eval(left.compare(&right)) {
                    ScalarValue::Int(1)
                } else {
                    ScalarValue::Int(0)
                }
            }
            BiOperator::Matching(op) => match (&left, &right) {
                (ScalarValue::String(value), ScalarValue::String(pattern)) => {
                    if op.eval(value, pattern) {
                        ScalarValue::Int(1)
                    } else {
                        ScalarValue::Int(0)
                    }
                }
                _ => {
                    log::error!("operator {} is undefined for {:?} and {:?}", op, left, right);
                    ScalarValue::Error
                }
            },
            BiOperator::Logical(op) => {
                log::error!("logical operator {} reached value evaluation", op);
                ScalarValue::Error
            }
        }
    }
}

impl From<BinaryOperator> for BiOperator {
    fn from(operator: BinaryOperator) -> BiOperator {
        match operator {
            BinaryOperator::Plus => BiOperator::Arithmetic(BiArithmetic::Add),
            BinaryOperator::Minus => BiOperator::Arithmetic(BiArithmetic::Sub),
            BinaryOperator::Multiply => BiOperator::Arithmetic(BiArithmetic::Mul),
            BinaryOperator::Divide => BiOperator::Arithmetic(BiArithmetic::Div),
            BinaryOperator::Modulus => BiOperator::Arithmetic(BiArithmetic::Mod),
            BinaryOperator::Gt => BiOperator::Comparison(Comparison::Gt),
            BinaryOperator::Lt => BiOperator::Comparison(Comparison::Lt),
            BinaryOperator::GtEq => BiOperator::Comparison(Comparison::GtEq),
            BinaryOperator::LtEq => BiOperator::Comparison(Comparison::LtEq),
            BinaryOperator::Eq => BiOperator::Comparison(Comparison::Eq),
            BinaryOperator::NotEq => BiOperator::Comparison(Comparison::NotEq),
            BinaryOperator::And => BiOperator::Logical(BiLogical::And),
            BinaryOperator::Or => BiOperator::Logical(BiLogical::Or),
            BinaryOperator::Like => BiOperator::Matching(Matching::Like),
            BinaryOperator::NotLike => BiOperator::Matching(Matching::NotLike),
        }
    }
}

impl Display for BiOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BiOperator::Arithmetic(op) => write!(f, "{}", op),
            BiOperator::Comparison(op) => write!(f, "{}", op),
            BiOperator::Logical(op) => write!(f, "{}", op),
            BiOperator::Matching(op) => write!(f, "{}", op),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum UnOperator {
    Neg,
    Pos,
    LogicalNot,
}

impl UnOperator {
    /// Value-mode evaluation. `LogicalNot` is resolved by the expression
    /// tree through predicate evaluation.
    pub fn eval(self, value: ScalarValue) -> ScalarValue {
        if value.is_error() {
            return ScalarValue::Error;
        }
        if value.is_null() {
            return ScalarValue::Null;
        }
        match self {
            UnOperator::Neg => match value {
                ScalarValue::Int(value) => ScalarValue::Int(-value),
                ScalarValue::Float(value) => ScalarValue::Float(-value),
                other => {
                    log::error!("operator - is undefined for {:?}", other);
                    ScalarValue::Error
                }
            },
            UnOperator::Pos => match value {
                ScalarValue::Int(_) | ScalarValue::Float(_) => value,
                other => {
                    log::error!("operator + is undefined for {:?}", other);
                    ScalarValue::Error
                }
            },
            UnOperator::LogicalNot => {
                log::error!("operator NOT reached value evaluation");
                ScalarValue::Error
            }
        }
    }
}

impl From<UnaryOperator> for UnOperator {
    fn from(operator: UnaryOperator) -> UnOperator {
        match operator {
            UnaryOperator::Minus => UnOperator::Neg,
            UnaryOperator::Plus => UnOperator::Pos,
            UnaryOperator::Not => UnOperator::LogicalNot,
        }
    }
}

impl Display for UnOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnOperator::Neg => write!(f, "-"),
            UnOperator::Pos => write!(f, "+"),
            UnOperator::LogicalNot => write!(f, "NOT"),
        }
    }
}

#[cfg(test)]
mod tests;
