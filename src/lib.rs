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

//! Single-process in-memory SQL database. SQL text goes through the parser
//! collaborator, the analyzer resolves it against the catalog, the planner
//! composes the operator pipeline and execution materializes a
//! [`QueryResult`].

use catalog::Catalog;
use data_definition::{ExecutionError, ExecutionOutcome};
use data_manipulation_query_result::{QueryExecution, QueryExecutionError};
use query_analyzer::{AnalysisError, QueryAnalyzer};
use query_ast::Statement;
use query_parser::QueryParser;
use query_planner::QueryPlanner;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};

pub use data_manipulation_query_result::QueryResult;
pub use data_scalar::ScalarValue;

#[derive(Debug, PartialEq)]
pub enum QueryEvent {
    TableCreated,
    TableDropped,
    IndexCreated(String),
    IndexDropped,
    RecordsInserted(usize),
    RecordsUpdated(usize),
    RecordsDeleted(usize),
    RecordsSelected(QueryResult),
}

impl From<ExecutionOutcome> for QueryEvent {
    fn from(outcome: ExecutionOutcome) -> QueryEvent {
        match outcome {
            ExecutionOutcome::TableCreated => QueryEvent::TableCreated,
            ExecutionOutcome::TableDropped => QueryEvent::TableDropped,
            ExecutionOutcome::IndexCreated(name) => QueryEvent::IndexCreated(name),
            ExecutionOutcome::IndexDropped => QueryEvent::IndexDropped,
        }
    }
}

impl From<QueryExecution> for QueryEvent {
    fn from(execution: QueryExecution) -> QueryEvent {
        match execution {
            QueryExecution::Inserted(inserted) => QueryEvent::RecordsInserted(inserted),
            QueryExecution::Updated(updated) => QueryEvent::RecordsUpdated(updated),
            QueryExecution::Deleted(deleted) => QueryEvent::RecordsDeleted(deleted),
            QueryExecution::Selected(result) => QueryEvent::RecordsSelected(result),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SqlError {
    Analysis(AnalysisError),
    Schema(ExecutionError),
    Execution(QueryExecutionError),
}

impl From<AnalysisError> for SqlError {
    fn from(error: AnalysisError) -> SqlError {
        SqlError::Analysis(error)
    }
}

impl From<ExecutionError> for SqlError {
    fn from(error: ExecutionError) -> SqlError {
        SqlError::Schema(error)
    }
}

impl From<QueryExecutionError> for SqlError {
    fn from(error: QueryExecutionError) -> SqlError {
        SqlError::Execution(error)
    }
}

impl Display for SqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::Analysis(error) => write!(f, "{}", error),
            SqlError::Schema(error) => write!(f, "{}", error),
            SqlError::Execution(error) => write!(f, "{}", error),
        }
    }
}

/// One embedded database instance: the catalog plus the slot holding the
/// most recent SELECT result.
pub struct Database {
    catalog: Catalog,
    last_result: RefCell<Option<QueryResult>>,
}

impl Default for Database {
    fn default() -> Database {
        Database::new()
    }
}

impl Database {
    pub fn new() -> Database {
        Database {
            catalog: Catalog::default(),
            last_result: RefCell::new(None),
        }
    }

    /// Parses and executes a batch of statements. Returns `None` only when
    /// parsing fails; otherwise every statement runs in textual order, a
    /// failing statement is logged and skipped, and the last SELECT's
    /// result comes back (a zero-row result is still `Some`).
    pub fn exec_query(&self, sql_text: &str) -> Option<QueryResult> {
        let statements = match QueryParser::new().parse(sql_text) {
            Ok(statements) => statements,
            Err(error) => {
                log::error!("{}", error);
                return None;
            }
        };
        for statement in statements {
            match self.exec_statement(statement) {
                Ok(QueryEvent::RecordsSelected(result)) => {
                    *self.last_result.borrow_mut() = Some(result);
                }
                Ok(_) => {}
                Err(error) => log::error!("{}", error),
            }
        }
        self.last_result.borrow().clone()
    }

    /// Executes one pre-parsed statement.
    pub fn exec_statement(&self, statement: Statement) -> Result<QueryEvent, SqlError> {
        let analyzer = QueryAnalyzer::from(&self.catalog);
        match statement {
            Statement::DDL(definition) => {
                let schema_change = analyzer.analyze_definition(definition)?;
                let outcome = self.catalog.apply(schema_change)?;
                Ok(QueryEvent::from(outcome))
            }
            Statement::DML(query) => {
                let typed_query = analyzer.analyze(query)?;
                let plan = QueryPlanner::from(&self.catalog).plan(typed_query)?;
                let execution = plan.execute()?;
                Ok(QueryEvent::from(execution))
            }
        }
    }

    /// Drops all tables, indexes and the cached result; test harness hook.
    pub fn reset(&self) {
        self.catalog.reset();
        self.last_result.borrow_mut().take();
    }
}
