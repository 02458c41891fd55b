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

//! Statement tree handed from the parser to the engine. It deliberately
//! mirrors only the surface this engine executes and keeps the third-party
//! parser types out of the engine crates.

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    DDL(Definition),
    DML(Query),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Definition {
    CreateTable {
        table_name: String,
        columns: Vec<ColumnDef>,
    },
    DropTable {
        table_name: String,
    },
    CreateIndex {
        name: Option<String>,
        table_name: String,
        column_name: String,
    },
    DropIndex {
        name: String,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum DataType {
    Int,
    Float,
    String,
    Date,
    Time,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ColumnConstraint {
    NotNull,
    Unique,
    PrimaryKey,
    ForeignKey { table_name: String, column_name: String },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Query {
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Select(SelectStatement),
}

#[derive(Debug, PartialEq, Clone)]
pub struct InsertStatement {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UpdateStatement {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeleteStatement {
    pub table_name: String,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SelectStatement {
    pub select_items: Vec<SelectItem>,
    pub table: Option<TableName>,
    pub join: Option<JoinClause>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TableName {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableName,
    pub on: Expr,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum JoinType {
    Inner,
    LeftOuter,
}

#[derive(Debug, PartialEq, Clone)]
pub enum SelectItem {
    Wildcard,
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, PartialEq, Clone)]
pub struct OrderByItem {
    pub expr: Expr,
    pub asc: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Column { table: Option<String>, name: String },
    Value(Value),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<FunctionArg>,
        distinct: bool,
    },
    Subquery,
}

#[derive(Debug, PartialEq, Clone)]
pub enum FunctionArg {
    Wildcard,
    Expr(Expr),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    SingleQuotedString(String),
    Null,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    NotEq,
    And,
    Or,
    Like,
    NotLike,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}
