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

//! Persistence of cars.

#[cfg(any(feature = "sqlite", test))]
use super::parse_uuid;
use crate::model::{Car, CarSpec, Engine, FuelType};
#[cfg(feature = "postgres")]
use carzone_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use carzone_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use carzone_core::db::{DbError, DbResult, Executor};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

/// Columns to select for a car joined with its engine, for PostgreSQL.
#[cfg(feature = "postgres")]
const PG_CAR_WITH_ENGINE: &str = "
    SELECT
        car.id, car.name, car.year, car.brand, car.fuel_type, car.engine_id, car.price,
        car.created_at, car.updated_at,
        engine.displacement, engine.no_of_cylinders, engine.car_range
    FROM car INNER JOIN engine ON car.engine_id = engine.id";

/// Columns to select for a car without its engine details, for PostgreSQL.
#[cfg(feature = "postgres")]
const PG_CAR_WITHOUT_ENGINE: &str = "
    SELECT
        id, name, year, brand, fuel_type, engine_id, price, created_at, updated_at,
        0::BIGINT AS displacement, 0::BIGINT AS no_of_cylinders, 0::BIGINT AS car_range
    FROM car";

/// Columns to select for a car joined with its engine, for SQLite.
#[cfg(any(feature = "sqlite", test))]
const SQLITE_CAR_WITH_ENGINE: &str = "
    SELECT
        car.id, car.name, car.year, car.brand, car.fuel_type, car.engine_id, car.price,
        car.created_at_secs, car.created_at_nsecs, car.updated_at_secs, car.updated_at_nsecs,
        engine.displacement, engine.no_of_cylinders, engine.car_range
    FROM car INNER JOIN engine ON car.engine_id = engine.id";

/// Columns to select for a car without its engine details, for SQLite.
#[cfg(any(feature = "sqlite", test))]
const SQLITE_CAR_WITHOUT_ENGINE: &str = "
    SELECT
        id, name, year, brand, fuel_type, engine_id, price,
        created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs,
        0 AS displacement, 0 AS no_of_cylinders, 0 AS car_range
    FROM car";

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Car {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let year: String = row.try_get("year").map_err(postgres::map_sqlx_error)?;
        let brand: String = row.try_get("brand").map_err(postgres::map_sqlx_error)?;
        let fuel_type: String = row.try_get("fuel_type").map_err(postgres::map_sqlx_error)?;
        let engine_id: Uuid = row.try_get("engine_id").map_err(postgres::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;
        let displacement: i64 = row.try_get("displacement").map_err(postgres::map_sqlx_error)?;
        let no_of_cylinders: i64 =
            row.try_get("no_of_cylinders").map_err(postgres::map_sqlx_error)?;
        let car_range: i64 = row.try_get("car_range").map_err(postgres::map_sqlx_error)?;

        let engine = Engine::new(engine_id, displacement, no_of_cylinders, car_range);
        Ok(Car::new(
            id,
            name,
            year,
            brand,
            FuelType::parse(&fuel_type)?,
            engine,
            price,
            created_at,
            updated_at,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Car {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let year: String = row.try_get("year").map_err(sqlite::map_sqlx_error)?;
        let brand: String = row.try_get("brand").map_err(sqlite::map_sqlx_error)?;
        let fuel_type: String = row.try_get("fuel_type").map_err(sqlite::map_sqlx_error)?;
        let engine_id: String = row.try_get("engine_id").map_err(sqlite::map_sqlx_error)?;
        let price: f64 = row.try_get("price").map_err(sqlite::map_sqlx_error)?;
        let created_at_secs: i64 =
            row.try_get("created_at_secs").map_err(sqlite::map_sqlx_error)?;
        let created_at_nsecs: i64 =
            row.try_get("created_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_secs: i64 =
            row.try_get("updated_at_secs").map_err(sqlite::map_sqlx_error)?;
        let updated_at_nsecs: i64 =
            row.try_get("updated_at_nsecs").map_err(sqlite::map_sqlx_error)?;
        let displacement: i64 = row.try_get("displacement").map_err(sqlite::map_sqlx_error)?;
        let no_of_cylinders: i64 =
            row.try_get("no_of_cylinders").map_err(sqlite::map_sqlx_error)?;
        let car_range: i64 = row.try_get("car_range").map_err(sqlite::map_sqlx_error)?;

        let engine = Engine::new(parse_uuid(&engine_id)?, displacement, no_of_cylinders, car_range);
        Ok(Car::new(
            parse_uuid(&id)?,
            name,
            year,
            brand,
            FuelType::parse(&fuel_type)?,
            engine,
            price,
            build_timestamp(created_at_secs, created_at_nsecs)?,
            build_timestamp(updated_at_secs, updated_at_nsecs)?,
        ))
    }
}

/// Gets the car identified by `id` together with the details of its engine.
pub(crate) async fn get_car(ex: &mut Executor, id: Uuid) -> DbResult<Car> {
    let raw_car = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!("{} WHERE car.id = $1", PG_CAR_WITH_ENGINE);
            let raw_car = sqlx::query(&query_str)
                .bind(id)
                .fetch_optional(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_car.map(Car::try_from)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!("{} WHERE car.id = ?", SQLITE_CAR_WITH_ENGINE);
            let raw_car = sqlx::query(&query_str)
                .bind(id.to_string())
                .fetch_optional(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_car.map(Car::try_from)
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match raw_car {
        Some(car) => car,
        None => Err(DbError::NotFound),
    }
}

/// Gets all cars made by `brand`, which must match exactly.
///
/// If `include_engine` is false, the engine of every returned car only carries its identifier.
pub(crate) async fn get_cars_by_brand(
    ex: &mut Executor,
    brand: &str,
    include_engine: bool,
) -> DbResult<Vec<Car>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = if include_engine {
                format!("{} WHERE car.brand = $1", PG_CAR_WITH_ENGINE)
            } else {
                format!("{} WHERE brand = $1", PG_CAR_WITHOUT_ENGINE)
            };
            let raw_cars = sqlx::query(&query_str)
                .bind(brand)
                .fetch_all(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            raw_cars.into_iter().map(Car::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = if include_engine {
                format!("{} WHERE car.brand = ?", SQLITE_CAR_WITH_ENGINE)
            } else {
                format!("{} WHERE brand = ?", SQLITE_CAR_WITHOUT_ENGINE)
            };
            let raw_cars = sqlx::query(&query_str)
                .bind(brand)
                .fetch_all(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_cars.into_iter().map(Car::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Stores a new car described by `spec` under a freshly-generated identifier, recording `now` as
/// its creation and modification times.
pub(crate) async fn create_car(
    ex: &mut Executor,
    spec: CarSpec,
    now: OffsetDateTime,
) -> DbResult<Car> {
    let car = Car::from_spec(Uuid::new_v4(), spec, now);

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO car
                    (id, name, year, brand, fuel_type, engine_id, price, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
            let done = sqlx::query(query_str)
                .bind(car.id())
                .bind(car.name())
                .bind(car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(car.engine().engine_id())
                .bind(car.price())
                .bind(car.created_at())
                .bind(car.updated_at())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = unpack_timestamp(*car.created_at())?;
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(*car.updated_at())?;

            let query_str = "
                INSERT INTO car (
                    id, name, year, brand, fuel_type, engine_id, price,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(car.id().to_string())
                .bind(car.name())
                .bind(car.year())
                .bind(car.brand())
                .bind(car.fuel_type().as_str())
                .bind(car.engine().engine_id().to_string())
                .bind(car.price())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
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
    Ok(car)
}

/// Replaces the contents of the car identified by `id` with `spec`, recording `now` as its
/// modification time.  The creation time is preserved.
pub(crate) async fn update_car(
    ex: &mut Executor,
    id: Uuid,
    spec: &CarSpec,
    now: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE car SET
                    name = $1, year = $2, brand = $3, fuel_type = $4, engine_id = $5, price = $6,
                    updated_at = $7
                WHERE id = $8";
            let done = sqlx::query(query_str)
                .bind(spec.name())
                .bind(spec.year())
                .bind(spec.brand())
                .bind(spec.fuel_type().as_str())
                .bind(spec.engine().engine_id())
                .bind(spec.price())
                .bind(now)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (updated_at_secs, updated_at_nsecs) = unpack_timestamp(now)?;

            let query_str = "
                UPDATE car SET
                    name = ?, year = ?, brand = ?, fuel_type = ?, engine_id = ?, price = ?,
                    updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(spec.name())
                .bind(spec.year())
                .bind(spec.brand())
                .bind(spec.fuel_type().as_str())
                .bind(spec.engine().engine_id().to_string())
                .bind(spec.price())
                .bind(updated_at_secs)
                .bind(updated_at_nsecs)
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
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the car identified by `id` and returns its last contents.
pub(crate) async fn delete_car(ex: &mut Executor, id: Uuid) -> DbResult<Car> {
    let car = get_car(ex, id).await?;

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM car WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM car WHERE id = ?";
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
        1 => Ok(car),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
