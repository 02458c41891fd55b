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

use data_manipulation_typed_tree::TypedTree;

#[derive(Debug, PartialEq, Clone)]
pub struct TypedInsertQuery {
    pub table_name: String,
    /// One entry per VALUES tuple in statement order. Positions carry the
    /// raw tuple; mapping onto the schema happens at execution so that a
    /// malformed tuple aborts only itself.
    pub values: Vec<Vec<TypedTree>>,
    /// Schema positions targeted by an explicit column list.
    pub columns: Option<Vec<usize>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypedUpdateQuery {
    pub table_name: String,
    /// `(column position, value expression)` pairs.
    pub assignments: Vec<(usize, TypedTree)>,
    pub filter: Option<TypedTree>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypedDeleteQuery {
    pub table_name: String,
    pub filter: Option<TypedTree>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypedSelectQuery {
    pub table_name: Option<String>,
    pub join: Option<TypedJoin>,
    pub projection_items: Vec<ProjectionItem>,
    pub filter: Option<TypedTree>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<usize>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ProjectionItem {
    pub tree: TypedTree,
    pub alias: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct TypedJoin {
    pub right_table: String,
    pub kind: JoinKind,
    pub on: TypedTree,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SortKey {
    pub tree: TypedTree,
    pub order: SortOrder,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TypedQuery {
    Insert(TypedInsertQuery),
    Update(TypedUpdateQuery),
    Delete(TypedDeleteQuery),
    Select(TypedSelectQuery),
}
