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

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};
use types::{SqlType, SqlTypeFamily};

pub const MAX_STRING_LEN: usize = 255;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// A single tagged value stored in a row or produced by evaluation.
///
/// `Null` marks absence, `Error` marks the result of an invalid computation
/// (division by zero, bad function arguments). The two are never conflated:
/// predicates treat both as "not matching" but arithmetic propagates them
/// differently.
#[derive(Debug, PartialEq, Clone)]
pub enum ScalarValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Error,
}

impl ScalarValue {
    pub fn type_family(&self) -> Option<SqlTypeFamily> {
        match self {
            ScalarValue::Int(_) => Some(SqlTypeFamily::Integer),
            ScalarValue::Float(_) => Some(SqlTypeFamily::Double),
            ScalarValue::String(_) => Some(SqlTypeFamily::String),
            ScalarValue::Date(_) => Some(SqlTypeFamily::Date),
            ScalarValue::Time(_) => Some(SqlTypeFamily::Time),
            ScalarValue::Null | ScalarValue::Error => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self == &ScalarValue::Null
    }

    pub fn is_error(&self) -> bool {
        self == &ScalarValue::Error
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarValue::Int(_) | ScalarValue::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(value) => Some(*value as f64),
            ScalarValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(value) => Some(*value),
            ScalarValue::Float(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn string_value(value: &str) -> ScalarValue {
        ScalarValue::String(clip_string(value.to_owned()))
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn as_text(self) -> String {
        match self {
            ScalarValue::Null => "NULL".to_owned(),
            ScalarValue::Error => "ERROR".to_owned(),
            ScalarValue::Int(value) => value.to_string(),
            ScalarValue::Float(value) => format_float(value),
            ScalarValue::String(value) => value,
            ScalarValue::Date(value) => value.format(DATE_FORMAT).to_string(),
            ScalarValue::Time(value) => value.format(TIME_FORMAT).to_string(),
        }
    }

    /// Converts into the given column type, or `None` when the value has no
    /// representation in it. `Null` and `Error` pass through unchanged.
    pub fn try_convert(&self, target: SqlType) -> Option<ScalarValue> {
        match (self, target) {
            (ScalarValue::Null, _) => Some(ScalarValue::Null),
            (ScalarValue::Error, _) => Some(ScalarValue::Error),
            (ScalarValue::Int(value), SqlType::Int) => Some(ScalarValue::Int(*value)),
            (ScalarValue::Int(value), SqlType::Float) => Some(ScalarValue::Float(*value as f64)),
            (ScalarValue::Int(value), SqlType::String) => Some(ScalarValue::String(value.to_string())),
            (ScalarValue::Float(value), SqlType::Float) => Some(ScalarValue::Float(*value)),
            (ScalarValue::Float(value), SqlType::Int) => Some(ScalarValue::Int(*value as i64)),
            (ScalarValue::Float(value), SqlType::String) => Some(ScalarValue::String(format_float(*value))),
            (ScalarValue::String(value), SqlType::String) => Some(ScalarValue::String(clip_string(value.clone()))),
            (ScalarValue::String(value), SqlType::Int) => value.trim().parse::<i64>().ok().map(ScalarValue::Int),
            (ScalarValue::String(value), SqlType::Float) => value.trim().parse::<f64>().ok().map(ScalarValue::Float),
            (ScalarValue::String(value), SqlType::Date) => NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
                .ok()
                .map(ScalarValue::Date),
            (ScalarValue::String(value), SqlType::Time) => NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
                .ok()
                .map(ScalarValue::Time),
            (ScalarValue::Date(value), SqlType::Date) => Some(ScalarValue::Date(*value)),
            (ScalarValue::Date(value), SqlType::String) => {
                Some(ScalarValue::String(value.format(DATE_FORMAT).to_string()))
            }
            (ScalarValue::Time(value), SqlType::Time) => Some(ScalarValue::Time(*value)),
            (ScalarValue::Time(value), SqlType::String) => {
                Some(ScalarValue::String(value.format(TIME_FORMAT).to_string()))
            }
            _ => None,
        }
    }

    /// Converting variant of [`ScalarValue::try_convert`] that collapses
    /// failures into `Error`.
    pub fn convert(&self, target: SqlType) -> ScalarValue {
        self.try_convert(target).unwrap_or(ScalarValue::Error)
    }

    /// Total ordering used by ORDER BY and MIN/MAX. Numeric kinds compare as
    /// real numbers, strings lexicographically, dates and times naturally.
    /// A numeric side pulls a string side into a numeric comparison when it
    /// parses. Everything else, `Null` and `Error` included, falls back to
    /// the lexicographic order of the rendered text.
    pub fn compare(&self, other: &ScalarValue) -> Ordering {
        match (self, other) {
            (ScalarValue::Int(left), ScalarValue::Int(right)) => left.cmp(right),
            (ScalarValue::String(left), ScalarValue::String(right)) => left.cmp(right),
            (ScalarValue::Date(left), ScalarValue::Date(right)) => left.cmp(right),
            (ScalarValue::Time(left), ScalarValue::Time(right)) => left.cmp(right),
            (left, right) => match (numeric_side(left), numeric_side(right)) {
                (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                _ => self.clone().as_text().cmp(&right.clone().as_text()),
            },
        }
    }

    /// Equality for UNIQUE checks, DISTINCT buffers and index probes.
    /// `Null` and `Error` are never equal to anything, themselves included.
    pub fn value_eq(&self, other: &ScalarValue) -> bool {
        if self.is_null() || self.is_error() || other.is_null() || other.is_error() {
            return false;
        }
        self.compare(other) == Ordering::Equal
    }

    /// Bucket assignment for the hash index. `Null` and `Error` land in
    /// bucket 0 and are never matchable on probe.
    pub fn bucket(&self, bucket_count: usize) -> usize {
        match self {
            ScalarValue::Null | ScalarValue::Error => 0,
            ScalarValue::Int(value) => (*value as u64 as usize) % bucket_count,
            ScalarValue::Float(value) => ((value * 1000.0) as i64 as u64 as usize) % bucket_count,
            ScalarValue::String(value) => {
                let mut hash: u32 = 0;
                for byte in value.bytes() {
                    hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
                }
                hash as usize % bucket_count
            }
            ScalarValue::Date(value) => {
                let packed = value.year() as i64 * 10_000 + i64::from(value.month()) * 100 + i64::from(value.day());
                (packed as u64 as usize) % bucket_count
            }
            ScalarValue::Time(value) => {
                let packed =
                    i64::from(value.hour()) * 10_000 + i64::from(value.minute()) * 100 + i64::from(value.second());
                (packed as u64 as usize) % bucket_count
            }
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clone().as_text())
    }
}

fn numeric_side(value: &ScalarValue) -> Option<f64> {
    match value {
        ScalarValue::Int(value) => Some(*value as f64),
        ScalarValue::Float(value) => Some(*value),
        ScalarValue::String(value) => value.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Floats render with up to six digits after the point, trimmed, always
/// keeping one so that `15.0` stays distinguishable from the integer `15`.
fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut text = format!("{:.6}", value);
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    text
}

fn clip_string(mut value: String) -> String {
    if value.len() > MAX_STRING_LEN {
        let mut cut = MAX_STRING_LEN;
        while !value.is_char_boundary(cut) {
            cut -= 1;
        }
        value.truncate(cut);
    }
    value
}
