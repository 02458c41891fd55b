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
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum ScalarFunction {
    Abs,
    Sqrt,
    Mod,
    Power,
    Round,
    Floor,
    Ceil,
    Upper,
    Lower,
    Length,
    Left,
    Right,
    Mid,
    Concat,
}

impl ScalarFunction {
    pub fn from_name(name: &str) -> Option<ScalarFunction> {
        match name.to_ascii_uppercase().as_str() {
            "ABS" => Some(ScalarFunction::Abs),
            "SQRT" => Some(ScalarFunction::Sqrt),
            "MOD" => Some(ScalarFunction::Mod),
            "POWER" => Some(ScalarFunction::Power),
            "ROUND" => Some(ScalarFunction::Round),
            "FLOOR" => Some(ScalarFunction::Floor),
            "CEIL" | "CEILING" => Some(ScalarFunction::Ceil),
            "UPPER" => Some(ScalarFunction::Upper),
            "LOWER" => Some(ScalarFunction::Lower),
            "LENGTH" => Some(ScalarFunction::Length),
            "LEFT" => Some(ScalarFunction::Left),
            "RIGHT" => Some(ScalarFunction::Right),
            "MID" => Some(ScalarFunction::Mid),
            "CONCAT" => Some(ScalarFunction::Concat),
            _ => None,
        }
    }

    fn arity(&self) -> (usize, usize) {
        match self {
            ScalarFunction::Abs
            | ScalarFunction::Sqrt
            | ScalarFunction::Floor
            | ScalarFunction::Ceil
            | ScalarFunction::Upper
            | ScalarFunction::Lower
            | ScalarFunction::Length => (1, 1),
            ScalarFunction::Mod | ScalarFunction::Power | ScalarFunction::Left | ScalarFunction::Right => (2, 2),
            ScalarFunction::Round => (1, 2),
            ScalarFunction::Mid => (2, 3),
            ScalarFunction::Concat => (1, usize::MAX),
        }
    }

    /// Evaluates over already-computed argument values. Any `Null` argument
    /// yields `Null`; a wrong argument count or type yields `Error` and is
    /// logged.
    pub fn eval(&self, args: &[ScalarValue]) -> ScalarValue {
        if args.iter().any(ScalarValue::is_error) {
            return ScalarValue::Error;
        }
        if args.iter().any(ScalarValue::is_null) {
            return ScalarValue::Null;
        }
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            log::error!("{} called with {} arguments", self, args.len());
            return ScalarValue::Error;
        }
        match self {
            ScalarFunction::Abs => match &args[0] {
                ScalarValue::Int(value) => ScalarValue::Int(value.abs()),
                ScalarValue::Float(value) => ScalarValue::Float(value.abs()),
                other => self.type_error(other),
            },
            ScalarFunction::Sqrt => match args[0].as_f64() {
                Some(value) if value < 0.0 => ScalarValue::Null,
                Some(value) => ScalarValue::Float(value.sqrt()),
                None => self.type_error(&args[0]),
            },
            ScalarFunction::Mod => match (args[0].as_f64(), args[1].as_f64()) {
                (Some(_), Some(divisor)) if divisor == 0.0 => ScalarValue::Null,
                (Some(value), Some(divisor)) => ScalarValue::Float(value % divisor),
                _ => self.type_error(&args[0]),
            },
            ScalarFunction::Power => match (args[0].as_f64(), args[1].as_f64()) {
                (Some(base), Some(exponent)) => ScalarValue::Float(base.powf(exponent)),
                _ => self.type_error(&args[0]),
            },
            ScalarFunction::Round => {
                let digits = if args.len() == 2 {
                    match &args[1] {
                        ScalarValue::Int(digits) => *digits,
                        other => return self.type_error(other),
                    }
                } else {
                    0
                };
                match args[0].as_f64() {
                    Some(value) if digits == 0 => ScalarValue::Int(value.round() as i64),
                    Some(value) => {
                        let factor = 10f64.powi(digits as i32);
                        ScalarValue::Float((value * factor).round() / factor)
                    }
                    None => self.type_error(&args[0]),
                }
            }
            ScalarFunction::Floor => match args[0].as_f64() {
                Some(value) => ScalarValue::Int(value.floor() as i64),
                None => self.type_error(&args[0]),
            },
            ScalarFunction::Ceil => match args[0].as_f64() {
                Some(value) => ScalarValue::Int(value.ceil() as i64),
                None => self.type_error(&args[0]),
            },
            ScalarFunction::Upper => match &args[0] {
                ScalarValue::String(value) => ScalarValue::String(value.to_uppercase()),
                other => self.type_error(other),
            },
            ScalarFunction::Lower => match &args[0] {
                ScalarValue::String(value) => ScalarValue::String(value.to_lowercase()),
                other => self.type_error(other),
            },
            ScalarFunction::Length => match &args[0] {
                ScalarValue::String(value) => ScalarValue::Int(value.chars().count() as i64),
                other => self.type_error(other),
            },
            ScalarFunction::Left => match (&args[0], &args[1]) {
                (ScalarValue::String(value), ScalarValue::Int(len)) => {
                    ScalarValue::String(value.chars().take((*len).max(0) as usize).collect())
                }
                (other, _) => self.type_error(other),
            },
            ScalarFunction::Right => match (&args[0], &args[1]) {
                (ScalarValue::String(value), ScalarValue::Int(len)) => {
                    let chars = value.chars().count();
                    let keep = (*len).max(0) as usize;
                    ScalarValue::String(value.chars().skip(chars.saturating_sub(keep)).collect())
                }
                (other, _) => self.type_error(other),
            },
            ScalarFunction::Mid => match (&args[0], &args[1]) {
                (ScalarValue::String(value), ScalarValue::Int(start)) => {
                    // 1-based start; anything before the first character
                    // clamps to it, anything past the end yields ""
                    let skip = (*start).max(1) as usize - 1;
                    let taken = value.chars().skip(skip);
                    match args.get(2) {
                        None => ScalarValue::String(taken.collect()),
                        Some(ScalarValue::Int(len)) => {
                            ScalarValue::String(taken.take((*len).max(0) as usize).collect())
                        }
                        Some(other) => self.type_error(other),
                    }
                }
                (other, _) => self.type_error(other),
            },
            ScalarFunction::Concat => {
                let mut joined = String::new();
                for arg in args {
                    joined.push_str(&arg.clone().as_text());
                }
                ScalarValue::string_value(&joined[..])
            }
        }
    }

    fn type_error(&self, value: &ScalarValue) -> ScalarValue {
        log::error!("{} is undefined for {:?}", self, value);
        ScalarValue::Error
    }
}

impl Display for ScalarFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScalarFunction::Abs => write!(f, "ABS"),
            ScalarFunction::Sqrt => write!(f, "SQRT"),
            ScalarFunction::Mod => write!(f, "MOD"),
            ScalarFunction::Power => write!(f, "POWER"),
            ScalarFunction::Round => write!(f, "ROUND"),
            ScalarFunction::Floor => write!(f, "FLOOR"),
            ScalarFunction::Ceil => write!(f, "CEIL"),
            ScalarFunction::Upper => write!(f, "UPPER"),
            ScalarFunction::Lower => write!(f, "LOWER"),
            ScalarFunction::Length => write!(f, "LENGTH"),
            ScalarFunction::Left => write!(f, "LEFT"),
            ScalarFunction::Right => write!(f, "RIGHT"),
            ScalarFunction::Mid => write!(f, "MID"),
            ScalarFunction::Concat => write!(f, "CONCAT"),
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<AggregateFunction> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    /// Reduces the operand values of the qualifying rows. `Null` and `Error`
    /// operand values never participate. Empty reductions yield 0, matching
    /// the engine's documented convention.
    pub fn apply(&self, values: &[ScalarValue]) -> ScalarValue {
        let present = values
            .iter()
            .filter(|value| !value.is_null() && !value.is_error())
            .collect::<Vec<_>>();
        match self {
            AggregateFunction::Count => ScalarValue::Int(present.len() as i64),
            AggregateFunction::Sum => sum(&present),
            AggregateFunction::Avg => {
                let numeric = numeric_values(&present);
                if numeric.is_empty() {
                    ScalarValue::Int(0)
                } else {
                    ScalarValue::Float(numeric.iter().sum::<f64>() / numeric.len() as f64)
                }
            }
            AggregateFunction::Min => extremum(&present, std::cmp::Ordering::Less),
            AggregateFunction::Max => extremum(&present, std::cmp::Ordering::Greater),
        }
    }
}

fn sum(values: &[&ScalarValue]) -> ScalarValue {
    let mut int_sum = 0i64;
    let mut float_sum = 0f64;
    let mut saw_float = false;
    for value in values {
        match value {
            ScalarValue::Int(value) => {
                int_sum = int_sum.wrapping_add(*value);
                float_sum += *value as f64;
            }
            ScalarValue::Float(value) => {
                saw_float = true;
                float_sum += *value;
            }
            other => {
                log::warn!("non-numeric value {:?} ignored by SUM", other);
            }
        }
    }
    if saw_float {
        ScalarValue::Float(float_sum)
    } else {
        ScalarValue::Int(int_sum)
    }
}

fn numeric_values(values: &[&ScalarValue]) -> Vec<f64> {
    values.iter().filter_map(|value| value.as_f64()).collect()
}

fn extremum(values: &[&ScalarValue], keep: std::cmp::Ordering) -> ScalarValue {
    let mut best: Option<&ScalarValue> = None;
    for value in values.iter().copied() {
        if !value.is_numeric() {
            log::warn!("non-numeric value {:?} ignored by MIN/MAX", value);
            continue;
        }
        best = match best {
            None => Some(value),
            Some(current) => {
                if value.compare(current) == keep {
                    Some(value)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.cloned().unwrap_or(ScalarValue::Int(0))
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Sum => write!(f, "SUM"),
            AggregateFunction::Avg => write!(f, "AVG"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Max => write!(f, "MAX"),
        }
    }
}
