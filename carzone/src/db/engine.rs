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

//! Persistence of engines.

#[cfg(any(feature = "sqlite", test))]
use super::parse_uuid;
use crate::model::{Engine, EngineRequest};
#[cfg(feature = "postgres")]
use carzone_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carzone_core::db::sqlite;
use carzone_core::db::{DbError, DbResult, Executor};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Engine {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let displacement: i64 = row.try_get("displacement").map_err(postgres::map_sqlx_error)?;
        let no_of_cylinders: i64 =
            row.try_get("no_of_cylinders").map_err(postgres::map_sqlx_error)?;
        let car_range: i64 = row.try_get("car_range").map_err(postgres::map_sqlx_error)?;

        Ok(Engine::new(id, displacement, no_of_cylinders, car_range))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Engine {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let displacement: i64 = row.try_get("displacement").map_err(sqlite::map_sqlx_error)?;
        let no_of_cylinders: i64 =
            row.try_get("no_of_cylinders").map_err(sqlite::map_sqlx_error)?;
        let car_range: i64 = row.try_get("car_range").map_err(sqlite::map_sqlx_error)?;

        Ok(Engine::new(parse_uuid(&id)?, displacement, no_of_cylinders, car_range))
    }
}

/// Gets the engine identified by `id`, or `None` if it does not exist.
pub(crate) async fn get_engine(ex: &mut Executor, id: Uuid) -> DbResult<Option<Engine>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT id, displacement, no_of_cylinders, car_range FROM engine WHERE id = $1";
            let raw_engine = sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_engine.map(Engine::try_from).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT id, displacement, no_of_cylinders, car_range FROM engine WHERE id = ?";
            let raw_engine = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_engine.map(Engine::try_from).transpose()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Stores a new engine described by `request` under a freshly-generated identifier.
pub(crate) async fn create_engine(ex: &mut Executor, request: EngineRequest) -> DbResult<Engine> {
    let engine = request.into_engine(Uuid::new_v4());

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO engine (id, displacement, no_of_cylinders, car_range)
                VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(engine.engine_id())
                .bind(engine.displacement())
                .bind(engine.no_of_cylinders())
                .bind(engine.car_range())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO engine (id, displacement, no_of_cylinders, car_range)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(engine.engine_id().to_string())
                .bind(engine.displacement())
                .bind(engine.no_of_cylinders())
                .bind(engine.car_range())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(engine)
}

/// Replaces the attributes of the engine identified by `id` with those in `request`.
pub(crate) async fn update_engine(
    ex: &mut Executor,
    id: Uuid,
    request: EngineRequest,
) -> DbResult<Engine> {
    let engine = request.into_engine(id);

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE engine SET displacement = $1, no_of_cylinders = $2, car_range = $3
                WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(engine.displacement())
                .bind(engine.no_of_cylinders())
                .bind(engine.car_range())
                .bind(engine.engine_id())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE engine SET displacement = ?, no_of_cylinders = ?, car_range = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(engine.displacement())
                .bind(engine.no_of_cylinders())
                .bind(engine.car_range())
                .bind(engine.engine_id().to_string())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotUpdated),
        1 => Ok(engine),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the engine identified by `id` and returns its last contents, or `None` if it did not
/// exist.
pub(crate) async fn delete_engine(ex: &mut Executor, id: Uuid) -> DbResult<Option<Engine>> {
    let engine = match get_engine(ex, id).await? {
        Some(engine) => engine,
        None => return Ok(None),
    };

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM engine WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM engine WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        0 => Err(DbError::NotDeleted),
        1 => Ok(Some(engine)),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

/// Counts the cars that are built with the engine identified by `id`.
pub(crate) async fn count_cars_with_engine(ex: &mut Executor, id: Uuid) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM car WHERE engine_id = $1";
            let row = sqlx::query(query_str)
                .bind(id)
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM car WHERE engine_id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    u64::try_from(count).map_err(|e| DbError::DataIntegrityError(format!("Invalid count: {}", e)))
}
