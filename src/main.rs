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

use minidb::{Database, QueryEvent, QueryResult, ScalarValue};
use query_parser::QueryParser;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "minidb> ";
const HELP: &str = "\
.help           show this message
.quit           exit
.log <level>    set log level (off, error, warn, info, debug, trace)
anything else is executed as SQL";

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .unwrap_or_else(|error| eprintln!("logger setup failed: {}", error));

    let database = Database::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("{}", PROMPT);
    let _ = stdout.flush();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let input = line.trim();
        if input.is_empty() {
            print!("{}", PROMPT);
            let _ = stdout.flush();
            continue;
        }
        if let Some(command) = input.strip_prefix('.') {
            if !run_command(command) {
                break;
            }
        } else {
            run_sql(&database, input);
        }
        print!("{}", PROMPT);
        let _ = stdout.flush();
    }
}

/// Returns false when the REPL should exit.
fn run_command(command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") | Some("exit") => return false,
        Some("help") => println!("{}", HELP),
        Some("log") => match parts.next().map(str::parse::<log::LevelFilter>) {
            Some(Ok(level)) => log::set_max_level(level),
            _ => println!("usage: .log <off|error|warn|info|debug|trace>"),
        },
        Some(other) => println!("unknown command {:?}, try .help", other),
        None => println!("{}", HELP),
    }
    true
}

fn run_sql(database: &Database, sql_text: &str) {
    let statements = match QueryParser::new().parse(sql_text) {
        Ok(statements) => statements,
        Err(error) => {
            println!("error: {}", error);
            return;
        }
    };
    for statement in statements {
        match database.exec_statement(statement) {
            Ok(QueryEvent::TableCreated) => println!("table created"),
            Ok(QueryEvent::TableDropped) => println!("table dropped"),
            Ok(QueryEvent::IndexCreated(name)) => println!("index {} created", name),
            Ok(QueryEvent::IndexDropped) => println!("index dropped"),
            Ok(QueryEvent::RecordsInserted(count)) => println!("{} rows inserted", count),
            Ok(QueryEvent::RecordsUpdated(count)) => println!("{} rows updated", count),
            Ok(QueryEvent::RecordsDeleted(count)) => println!("{} rows deleted", count),
            Ok(QueryEvent::RecordsSelected(result)) => print_result(&result),
            Err(error) => println!("error: {}", error),
        }
    }
}

/// Box-drawing rendering of a result grid.
fn print_result(result: &QueryResult) {
    let mut widths = result
        .column_names()
        .iter()
        .map(String::len)
        .collect::<Vec<usize>>();
    let rendered = result
        .rows()
        .iter()
        .map(|row| row.iter().map(|value| ScalarValue::as_text(value.clone())).collect::<Vec<String>>())
        .collect::<Vec<Vec<String>>>();
    for row in &rendered {
        for (index, cell) in row.iter().enumerate() {
            if cell.len() > widths[index] {
                widths[index] = cell.len();
            }
        }
    }

    let separator = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<String>>()
        .join("+");
    println!("+{}+", separator);
    let header = result
        .column_names()
        .iter()
        .enumerate()
        .map(|(index, name)| format!(" {:<width$} ", name, width = widths[index]))
        .collect::<Vec<String>>()
        .join("|");
    println!("|{}|", header);
    println!("+{}+", separator);
    for row in &rendered {
        let line = row
            .iter()
            .enumerate()
            .map(|(index, cell)| format!(" {:<width$} ", cell, width = widths[index]))
            .collect::<Vec<String>>()
            .join("|");
        println!("|{}|", line);
    }
    println!("+{}+", separator);
    println!("{} rows", result.row_count());
}
