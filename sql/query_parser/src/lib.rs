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

//! Tokenizer/parser collaborator. SQL text goes through `sqlparser` and its
//! statements are lowered into [`query_ast`], the only parser-facing surface
//! the engine crates see.

use query_ast::{
    Assignment, BinaryOperator, ColumnConstraint, ColumnDef, DataType, Definition, DeleteStatement, Expr, FunctionArg,
    InsertStatement, JoinClause, JoinType, OrderByItem, Query, SelectItem, SelectStatement, Statement, TableName,
    UnaryOperator, UpdateStatement, Value,
};
use sqlparser::ast as sql;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq)]
pub struct ParseError(String);

impl ParseError {
    fn new<M: ToString>(message: M) -> ParseError {
        ParseError(message.to_string())
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct QueryParser;

impl QueryParser {
    pub const fn new() -> QueryParser {
        QueryParser
    }

    pub fn parse(&self, sql_text: &str) -> Result<Vec<Statement>, ParseError> {
        let statements = Parser::parse_sql(&GenericDialect {}, sql_text).map_err(ParseError::new)?;
        let mut parsed = vec![];
        for statement in statements {
            parsed.extend(self.process_statement(statement)?);
        }
        Ok(parsed)
    }

    fn process_statement(&self, statement: sql::Statement) -> Result<Vec<Statement>, ParseError> {
        match statement {
            sql::Statement::CreateTable {
                name,
                columns,
                constraints,
                ..
            } => {
                let table_name = object_name(&name);
                let mut column_defs = vec![];
                for column in columns {
                    column_defs.push(process_column(column)?);
                }
                apply_table_constraints(&mut column_defs, constraints)?;
                Ok(vec![Statement::DDL(Definition::CreateTable {
                    table_name,
                    columns: column_defs,
                })])
            }
            sql::Statement::CreateIndex {
                name,
                table_name,
                columns,
                ..
            } => {
                if columns.len() != 1 {
                    return Err(ParseError::new("indexes span exactly one column"));
                }
                let column_name = match &columns[0].expr {
                    sql::Expr::Identifier(ident) => ident.value.clone(),
                    other => return Err(ParseError::new(format!("cannot index expression {}", other))),
                };
                Ok(vec![Statement::DDL(Definition::CreateIndex {
                    name: Some(object_name(&name)),
                    table_name: object_name(&table_name),
                    column_name,
                })])
            }
            sql::Statement::Drop {
                object_type, names, ..
            } => match object_type {
                sql::ObjectType::Table => Ok(names
                    .iter()
                    .map(|name| {
                        Statement::DDL(Definition::DropTable {
                            table_name: object_name(name),
                        })
                    })
                    .collect()),
                sql::ObjectType::Index => Ok(names
                    .iter()
                    .map(|name| {
                        Statement::DDL(Definition::DropIndex {
                            name: object_name(name),
                        })
                    })
                    .collect()),
                other => Err(ParseError::new(format!("DROP {} is not supported", other))),
            },
            sql::Statement::Insert {
                table_name,
                columns,
                source,
                ..
            } => {
                let values = match *source.body {
                    sql::SetExpr::Values(sql::Values { rows, .. }) => {
                        let mut tuples = vec![];
                        for row in rows {
                            let mut tuple = vec![];
                            for expr in row {
                                tuple.push(process_expr(expr)?);
                            }
                            tuples.push(tuple);
                        }
                        tuples
                    }
                    _ => return Err(ParseError::new("INSERT supports VALUES lists only")),
                };
                Ok(vec![Statement::DML(Query::Insert(InsertStatement {
                    table_name: object_name(&table_name),
                    columns: columns.into_iter().map(|ident| ident.value).collect(),
                    values,
                }))])
            }
            sql::Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => {
                if !table.joins.is_empty() {
                    return Err(ParseError::new("UPDATE over joined tables is not supported"));
                }
                let table_name = relation_name(&table.relation)?.name;
                let mut typed_assignments = vec![];
                for assignment in assignments {
                    let column = assignment
                        .id
                        .last()
                        .map(|ident| ident.value.clone())
                        .ok_or_else(|| ParseError::new("empty assignment target"))?;
                    typed_assignments.push(Assignment {
                        column,
                        value: process_expr(assignment.value)?,
                    });
                }
                let where_clause = selection.map(process_expr).transpose()?;
                Ok(vec![Statement::DML(Query::Update(UpdateStatement {
                    table_name,
                    assignments: typed_assignments,
                    where_clause,
                }))])
            }
            sql::Statement::Delete {
                from, selection, ..
            } => {
                let table = from
                    .first()
                    .ok_or_else(|| ParseError::new("DELETE without a table"))?;
                if !table.joins.is_empty() {
                    return Err(ParseError::new("DELETE over joined tables is not supported"));
                }
                let table_name = relation_name(&table.relation)?.name;
                let where_clause = selection.map(process_expr).transpose()?;
                Ok(vec![Statement::DML(Query::Delete(DeleteStatement {
                    table_name,
                    where_clause,
                }))])
            }
            sql::Statement::Query(query) => Ok(vec![Statement::DML(Query::Select(process_query(*query)?))]),
            other => Err(ParseError::new(format!("statement {} is not supported", other))),
        }
    }
}

fn object_name(name: &sql::ObjectName) -> String {
    if name.0.len() > 1 {
        log::warn!("qualified name {} loses its qualifier", name);
    }
    name.0.last().map(|ident| ident.value.clone()).unwrap_or_default()
}

fn relation_name(relation: &sql::TableFactor) -> Result<TableName, ParseError> {
    match relation {
        sql::TableFactor::Table { name, alias, .. } => Ok(TableName {
            name: object_name(name),
            alias: alias.as_ref().map(|alias| alias.name.value.clone()),
        }),
        other => Err(ParseError::new(format!("table factor {} is not supported", other))),
    }
}

fn process_column(column: sql::ColumnDef) -> Result<ColumnDef, ParseError> {
    let data_type = process_type(&column.data_type)?;
    let mut constraints = vec![];
    for option in column.options {
        match option.option {
            sql::ColumnOption::Null => {}
            sql::ColumnOption::NotNull => constraints.push(ColumnConstraint::NotNull),
            sql::ColumnOption::Unique { is_primary } => constraints.push(if is_primary {
                ColumnConstraint::PrimaryKey
            } else {
                ColumnConstraint::Unique
            }),
            sql::ColumnOption::ForeignKey {
                foreign_table,
                referred_columns,
                ..
            } => {
                let column_name = referred_columns
                    .first()
                    .map(|ident| ident.value.clone())
                    .ok_or_else(|| ParseError::new("REFERENCES without a column"))?;
                constraints.push(ColumnConstraint::ForeignKey {
                    table_name: object_name(&foreign_table),
                    column_name,
                });
            }
            other => {
                log::warn!("column option {} is ignored", other);
            }
        }
    }
    Ok(ColumnDef {
        name: column.name.value,
        data_type,
        constraints,
    })
}

fn apply_table_constraints(
    columns: &mut [ColumnDef],
    constraints: Vec<sql::TableConstraint>,
) -> Result<(), ParseError> {
    for constraint in constraints {
        match constraint {
            sql::TableConstraint::Unique {
                columns: constrained,
                is_primary,
                ..
            } => {
                for ident in constrained {
                    let column = columns
                        .iter_mut()
                        .find(|column| column.name == ident.value)
                        .ok_or_else(|| ParseError::new(format!("unknown column {}", ident.value)))?;
                    column.constraints.push(if is_primary {
                        ColumnConstraint::PrimaryKey
                    } else {
                        ColumnConstraint::Unique
                    });
                }
            }
            sql::TableConstraint::ForeignKey {
                columns: constrained,
                foreign_table,
                referred_columns,
                ..
            } => {
                let referred = referred_columns
                    .first()
                    .map(|ident| ident.value.clone())
                    .ok_or_else(|| ParseError::new("FOREIGN KEY without a referenced column"))?;
                for ident in constrained {
                    let column = columns
                        .iter_mut()
                        .find(|column| column.name == ident.value)
                        .ok_or_else(|| ParseError::new(format!("unknown column {}", ident.value)))?;
                    column.constraints.push(ColumnConstraint::ForeignKey {
                        table_name: object_name(&foreign_table),
                        column_name: referred.clone(),
                    });
                }
            }
            other => {
                log::warn!("table constraint {} is ignored", other);
            }
        }
    }
    Ok(())
}

fn process_type(data_type: &sql::DataType) -> Result<DataType, ParseError> {
    match data_type {
        sql::DataType::Int(_) | sql::DataType::Integer(_) | sql::DataType::SmallInt(_) | sql::DataType::BigInt(_) => {
            Ok(DataType::Int)
        }
        sql::DataType::Float(_)
        | sql::DataType::Real
        | sql::DataType::Double
        | sql::DataType::DoublePrecision => Ok(DataType::Float),
        sql::DataType::String
        | sql::DataType::Text
        | sql::DataType::Varchar(_)
        | sql::DataType::Char(_) => Ok(DataType::String),
        sql::DataType::Date => Ok(DataType::Date),
        sql::DataType::Time(_, _) => Ok(DataType::Time),
        other => Err(ParseError::new(format!("type {} is not supported", other))),
    }
}

fn process_query(query: sql::Query) -> Result<SelectStatement, ParseError> {
    let sql::Query {
        body, order_by, limit, ..
    } = query;
    let select = match *body {
        sql::SetExpr::Select(select) => *select,
        other => return Err(ParseError::new(format!("query body {} is not supported", other))),
    };
    let sql::Select {
        projection,
        from,
        selection,
        ..
    } = select;

    let (table, join) = match from.len() {
        0 => (None, None),
        1 => {
            let table_with_joins = from.into_iter().next().unwrap();
            let table = relation_name(&table_with_joins.relation)?;
            let join = process_joins(table_with_joins.joins)?;
            (Some(table), join)
        }
        _ => return Err(ParseError::new("comma-joined FROM lists are not supported")),
    };

    let mut select_items = vec![];
    for item in projection {
        select_items.push(match item {
            sql::SelectItem::Wildcard(_) => SelectItem::Wildcard,
            sql::SelectItem::UnnamedExpr(expr) => SelectItem::Expr {
                expr: process_expr(expr)?,
                alias: None,
            },
            sql::SelectItem::ExprWithAlias { expr, alias } => SelectItem::Expr {
                expr: process_expr(expr)?,
                alias: Some(alias.value),
            },
            other => return Err(ParseError::new(format!("select item {} is not supported", other))),
        });
    }

    let where_clause = selection.map(process_expr).transpose()?;
    let mut order_by_items = vec![];
    for sql::OrderByExpr { expr, asc, .. } in order_by {
        order_by_items.push(OrderByItem {
            expr: process_expr(expr)?,
            asc: asc.unwrap_or(true),
        });
    }
    let limit = match limit {
        None => None,
        Some(sql::Expr::Value(sql::Value::Number(value, _))) => Some(
            value
                .parse::<u64>()
                .map_err(|_| ParseError::new(format!("invalid LIMIT {}", value)))?,
        ),
        Some(other) => return Err(ParseError::new(format!("LIMIT {} is not supported", other))),
    };

    Ok(SelectStatement {
        select_items,
        table,
        join,
        where_clause,
        order_by: order_by_items,
        limit,
    })
}

fn process_joins(joins: Vec<sql::Join>) -> Result<Option<JoinClause>, ParseError> {
    let mut joins = joins.into_iter();
    let join = match joins.next() {
        None => return Ok(None),
        Some(join) => join,
    };
    if joins.next().is_some() {
        return Err(ParseError::new("multiple joins in one statement are not supported"));
    }
    let table = relation_name(&join.relation)?;
    let (join_type, constraint) = match join.join_operator {
        sql::JoinOperator::Inner(constraint) => (JoinType::Inner, constraint),
        sql::JoinOperator::LeftOuter(constraint) => (JoinType::LeftOuter, constraint),
        other => return Err(ParseError::new(format!("join type {:?} is not supported", other))),
    };
    let on = match constraint {
        sql::JoinConstraint::On(expr) => process_expr(expr)?,
        _ => return Err(ParseError::new("joins require an ON predicate")),
    };
    Ok(Some(JoinClause { join_type, table, on }))
}

fn process_expr(expr: sql::Expr) -> Result<Expr, ParseError> {
    match expr {
        sql::Expr::Identifier(ident) => Ok(Expr::Column {
            table: None,
            name: ident.value,
        }),
        sql::Expr::CompoundIdentifier(mut idents) => {
            if idents.len() != 2 {
                return Err(ParseError::new("only table.column references are supported"));
            }
            let name = idents.pop().map(|ident| ident.value).unwrap_or_default();
            let table = idents.pop().map(|ident| ident.value);
            Ok(Expr::Column { table, name })
        }
        sql::Expr::Value(value) => Ok(Expr::Value(process_value(value)?)),
        sql::Expr::Nested(inner) => process_expr(*inner),
        sql::Expr::BinaryOp { left, op, right } => {
            let op = process_binary_operator(op)?;
            Ok(Expr::BinaryOp {
                left: Box::new(process_expr(*left)?),
                op,
                right: Box::new(process_expr(*right)?),
            })
        }
        sql::Expr::UnaryOp { op, expr } => {
            let op = match op {
                sql::UnaryOperator::Plus => UnaryOperator::Plus,
                sql::UnaryOperator::Minus => UnaryOperator::Minus,
                sql::UnaryOperator::Not => UnaryOperator::Not,
                other => return Err(ParseError::new(format!("operator {} is not supported", other))),
            };
            Ok(Expr::UnaryOp {
                op,
                expr: Box::new(process_expr(*expr)?),
            })
        }
        sql::Expr::Like {
            negated,
            expr,
            pattern,
            escape_char,
        } => {
            if let Some(escape_char) = escape_char {
                if escape_char != '\\' {
                    return Err(ParseError::new(format!("ESCAPE {:?} is not supported", escape_char)));
                }
            }
            Ok(Expr::BinaryOp {
                left: Box::new(process_expr(*expr)?),
                op: if negated {
                    BinaryOperator::NotLike
                } else {
                    BinaryOperator::Like
                },
                right: Box::new(process_expr(*pattern)?),
            })
        }
        sql::Expr::Function(function) => process_function(function),
        sql::Expr::Floor { expr, .. } => Ok(Expr::Function {
            name: "FLOOR".to_owned(),
            args: vec![FunctionArg::Expr(process_expr(*expr)?)],
            distinct: false,
        }),
        sql::Expr::Ceil { expr, .. } => Ok(Expr::Function {
            name: "CEIL".to_owned(),
            args: vec![FunctionArg::Expr(process_expr(*expr)?)],
            distinct: false,
        }),
        sql::Expr::Subquery(_) | sql::Expr::Exists { .. } | sql::Expr::InSubquery { .. } => Ok(Expr::Subquery),
        other => Err(ParseError::new(format!("expression {} is not supported", other))),
    }
}

fn process_function(function: sql::Function) -> Result<Expr, ParseError> {
    let name = object_name(&function.name);
    let mut args = vec![];
    for arg in function.args {
        match arg {
            sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Expr(expr)) => {
                args.push(FunctionArg::Expr(process_expr(expr)?));
            }
            sql::FunctionArg::Unnamed(sql::FunctionArgExpr::Wildcard) => args.push(FunctionArg::Wildcard),
            other => return Err(ParseError::new(format!("function argument {} is not supported", other))),
        }
    }
    Ok(Expr::Function {
        name,
        args,
        distinct: function.distinct,
    })
}

fn process_binary_operator(op: sql::BinaryOperator) -> Result<BinaryOperator, ParseError> {
    match op {
        sql::BinaryOperator::Plus => Ok(BinaryOperator::Plus),
        sql::BinaryOperator::Minus => Ok(BinaryOperator::Minus),
        sql::BinaryOperator::Multiply => Ok(BinaryOperator::Multiply),
        sql::BinaryOperator::Divide => Ok(BinaryOperator::Divide),
        sql::BinaryOperator::Modulo => Ok(BinaryOperator::Modulus),
        sql::BinaryOperator::Gt => Ok(BinaryOperator::Gt),
        sql::BinaryOperator::Lt => Ok(BinaryOperator::Lt),
        sql::BinaryOperator::GtEq => Ok(BinaryOperator::GtEq),
        sql::BinaryOperator::LtEq => Ok(BinaryOperator::LtEq),
        sql::BinaryOperator::Eq => Ok(BinaryOperator::Eq),
        sql::BinaryOperator::NotEq => Ok(BinaryOperator::NotEq),
        sql::BinaryOperator::And => Ok(BinaryOperator::And),
        sql::BinaryOperator::Or => Ok(BinaryOperator::Or),
        other => Err(ParseError::new(format!("operator {} is not supported", other))),
    }
}

fn process_value(value: sql::Value) -> Result<Value, ParseError> {
    match value {
        sql::Value::Number(text, _) => {
            if text.contains('.') || text.contains('e') || text.contains('E') {
                text.parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| ParseError::new(format!("invalid number {}", text)))
            } else {
                match text.parse::<i64>() {
                    Ok(value) => Ok(Value::Int(value)),
                    Err(_) => text
                        .parse::<f64>()
                        .map(Value::Float)
                        .map_err(|_| ParseError::new(format!("invalid number {}", text))),
                }
            }
        }
        sql::Value::SingleQuotedString(text) => Ok(Value::SingleQuotedString(text)),
        sql::Value::Null => Ok(Value::Null),
        other => Err(ParseError::new(format!("literal {} is not supported", other))),
    }
}
