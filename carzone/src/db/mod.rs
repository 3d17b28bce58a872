// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction in terms of the operations needed by the server.
//!
//! Every operation receives the executor to run on.  The driver layer is in charge of opening a
//! transaction and passing its executor to all the operations that make up a single request.

#[cfg(feature = "postgres")]
use carzone_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carzone_core::db::sqlite;
use carzone_core::db::{DbResult, Executor};
#[cfg(any(feature = "sqlite", test))]
use carzone_core::db::DbError;
#[cfg(any(feature = "sqlite", test))]
use uuid::Uuid;

mod car;
pub(crate) use car::{create_car, delete_car, get_car, get_cars_by_brand, update_car};
mod engine;
pub(crate) use engine::{
    count_cars_with_engine, create_engine, delete_engine, get_engine, update_engine,
};

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Parses a UUID stored as text in SQLite.
#[cfg(any(feature = "sqlite", test))]
fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid UUID '{}': {}", s, e)))
}
