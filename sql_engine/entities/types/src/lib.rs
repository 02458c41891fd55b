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

use std::fmt::{self, Display, Formatter};

/// Declared type of a table column.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum SqlType {
    Int,
    Float,
    String,
    Date,
    Time,
}

impl SqlType {
    pub fn family(&self) -> SqlTypeFamily {
        match self {
            SqlType::Int => SqlTypeFamily::Integer,
            SqlType::Float => SqlTypeFamily::Double,
            SqlType::String => SqlTypeFamily::String,
            SqlType::Date => SqlTypeFamily::Date,
            SqlType::Time => SqlTypeFamily::Time,
        }
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Int => write!(f, "int"),
            SqlType::Float => write!(f, "float"),
            SqlType::String => write!(f, "string"),
            SqlType::Date => write!(f, "date"),
            SqlType::Time => write!(f, "time"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct IncomparableSqlTypeFamilies {
    left: SqlTypeFamily,
    right: SqlTypeFamily,
}

impl IncomparableSqlTypeFamilies {
    pub fn new(left: SqlTypeFamily, right: SqlTypeFamily) -> IncomparableSqlTypeFamilies {
        IncomparableSqlTypeFamilies { left, right }
    }
}

impl Display for IncomparableSqlTypeFamilies {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} is incomparable with {}", self.left, self.right)
    }
}

/// Family a value belongs to during evaluation. Numeric families widen
/// toward `Double` when mixed.
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum SqlTypeFamily {
    Integer,
    Double,
    String,
    Date,
    Time,
}

impl SqlTypeFamily {
    pub fn compare(&self, other: &SqlTypeFamily) -> Result<SqlTypeFamily, IncomparableSqlTypeFamilies> {
        if self == other {
            Ok(*self)
        } else if self.is_numeric() && other.is_numeric() {
            Ok(SqlTypeFamily::Double)
        } else {
            Err(IncomparableSqlTypeFamilies::new(*self, *other))
        }
    }

    pub fn is_numeric(&self) -> bool {
        self == &SqlTypeFamily::Integer || self == &SqlTypeFamily::Double
    }
}

impl Display for SqlTypeFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SqlTypeFamily::Integer => write!(f, "integer"),
            SqlTypeFamily::Double => write!(f, "double"),
            SqlTypeFamily::String => write!(f, "string"),
            SqlTypeFamily::Date => write!(f, "date"),
            SqlTypeFamily::Time => write!(f, "time"),
        }
    }
}
