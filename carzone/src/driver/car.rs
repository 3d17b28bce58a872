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

//! Operations on cars.

use crate::db;
use crate::driver::engine::engine_not_found;
use crate::driver::Driver;
use crate::model::{Car, CarRequest, CarSpec};
use carzone_core::db::{DbError, Executor};
use carzone_core::driver::{DriverError, DriverResult};
use log::info;
use uuid::Uuid;

/// Builds the error returned when the car `id` does not exist.
fn car_not_found(id: Uuid) -> DriverError {
    DriverError::NotFound(format!("Car {} not found", id))
}

/// Gets the car `id` from the database, reporting a missing car with a descriptive error.
async fn get_existing_car(ex: &mut Executor, id: Uuid) -> DriverResult<Car> {
    match db::get_car(ex, id).await {
        Ok(car) => Ok(car),
        Err(DbError::NotFound) => Err(car_not_found(id)),
        Err(e) => Err(e.into()),
    }
}

/// Ensures that the engine referenced by `spec` exists.
async fn check_engine_exists(ex: &mut Executor, spec: &CarSpec) -> DriverResult<()> {
    let engine_id = *spec.engine().engine_id();
    match db::get_engine(ex, engine_id).await? {
        Some(_) => Ok(()),
        None => Err(engine_not_found(engine_id)),
    }
}

impl Driver {
    /// Gets the car identified by `id`, including the details of its engine.
    pub(crate) async fn get_car(self, id: Uuid) -> DriverResult<Car> {
        let mut tx = self.db.begin().await?;
        let car = get_existing_car(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(car)
    }

    /// Gets all cars made by `brand`.  Engine details are only populated if `include_engine` is
    /// true.
    pub(crate) async fn get_cars_by_brand(
        self,
        brand: &str,
        include_engine: bool,
    ) -> DriverResult<Vec<Car>> {
        let mut tx = self.db.begin().await?;
        let cars = db::get_cars_by_brand(tx.ex(), brand, include_engine).await?;
        tx.commit().await?;
        Ok(cars)
    }

    /// Creates a new car as described by `request`.
    pub(crate) async fn create_car(self, request: CarRequest) -> DriverResult<Car> {
        let spec = request.validate(self.clock.current_year())?;

        let mut tx = self.db.begin().await?;
        check_engine_exists(tx.ex(), &spec).await?;
        let car = db::create_car(tx.ex(), spec, self.clock.now_utc()).await?;
        tx.commit().await?;

        info!("Created car {}", car.id());
        Ok(car)
    }

    /// Replaces the contents of the car identified by `id` with `request` and returns the car as
    /// stored after the update.
    pub(crate) async fn update_car(self, id: Uuid, request: CarRequest) -> DriverResult<Car> {
        let spec = request.validate(self.clock.current_year())?;

        let mut tx = self.db.begin().await?;
        get_existing_car(tx.ex(), id).await?;
        check_engine_exists(tx.ex(), &spec).await?;
        match db::update_car(tx.ex(), id, &spec, self.clock.now_utc()).await {
            Ok(()) => (),
            Err(DbError::NotFound) => return Err(car_not_found(id)),
            Err(e) => return Err(e.into()),
        }
        let car = get_existing_car(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(car)
    }

    /// Deletes the car identified by `id` and returns its last contents.
    pub(crate) async fn delete_car(self, id: Uuid) -> DriverResult<Car> {
        let mut tx = self.db.begin().await?;
        let car = match db::delete_car(tx.ex(), id).await {
            Ok(car) => car,
            Err(DbError::NotFound) => return Err(car_not_found(id)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        info!("Deleted car {}", id);
        Ok(car)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::model::{Engine, EngineRequest, FuelType};
    use carzone_core::clocks::Clock;
    use std::time::Duration;

    /// Creates an engine directly in the database.
    async fn create_test_engine(context: &TestContext) -> Engine {
        db::create_engine(&mut context.ex().await, EngineRequest::new(2000, 4, 500)).await.unwrap()
    }

    /// Builds a valid request for a car of `brand` built with `engine`.
    fn car_request(name: &str, brand: &str, engine: &Engine) -> CarRequest {
        CarRequest {
            name: name.to_owned(),
            year: "2022".to_owned(),
            brand: brand.to_owned(),
            fuel_type: "Electric".to_owned(),
            engine: engine.clone(),
            price: 49999.0,
        }
    }

    #[tokio::test]
    async fn test_create_car_ok() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine)).await.unwrap();
        assert_eq!("Model X", car.name());
        assert_eq!("2022", car.year());
        assert_eq!("Tesla", car.brand());
        assert_eq!(&FuelType::Electric, car.fuel_type());
        assert_eq!(&engine, car.engine());
        assert_eq!(&49999.0, car.price());
        assert_eq!(&context.clock.now_utc(), car.created_at());
        assert_eq!(&context.clock.now_utc(), car.updated_at());

        assert_eq!(car, db::get_car(&mut context.ex().await, *car.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_car_year_in_future() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let mut request = car_request("Model X", "Tesla", &engine);
        request.year = "2025".to_owned();
        assert_eq!(
            DriverError::InvalidInput(
                "Year must be between 1886 and the current year".to_owned()
            ),
            context.driver().create_car(request.clone()).await.unwrap_err()
        );

        context.clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        context.driver().create_car(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_car_invalid_does_not_write() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let mut request = car_request("Model X", "Tesla", &engine);
        request.price = 0.0;
        assert_eq!(
            DriverError::InvalidInput("Price must be greater than 0".to_owned()),
            context.driver().create_car(request).await.unwrap_err()
        );
        assert!(db::get_cars_by_brand(&mut context.ex().await, "Tesla", true)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_car_unknown_engine() {
        let context = TestContext::setup().await;

        let engine = Engine::new(Uuid::new_v4(), 2000, 4, 500);
        assert_eq!(
            DriverError::NotFound(format!("Engine {} not found", engine.engine_id())),
            context
                .driver()
                .create_car(car_request("Model X", "Tesla", &engine))
                .await
                .unwrap_err()
        );
        assert!(db::get_cars_by_brand(&mut context.ex().await, "Tesla", true)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_car_ok() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine)).await.unwrap();
        assert_eq!(car, context.driver().get_car(*car.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_car_not_found() {
        let context = TestContext::setup().await;

        let id = Uuid::new_v4();
        assert_eq!(
            DriverError::NotFound(format!("Car {} not found", id)),
            context.driver().get_car(id).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_cars_by_brand() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine)).await.unwrap();
        context.driver().create_car(car_request("Mustang", "Ford", &engine)).await.unwrap();

        let cars = context.driver().get_cars_by_brand("Tesla", true).await.unwrap();
        assert_eq!(vec![car.clone()], cars);

        let cars = context.driver().get_cars_by_brand("Tesla", false).await.unwrap();
        assert_eq!(1, cars.len());
        assert_eq!(car.id(), cars[0].id());
        assert_eq!(&Engine::reference(*engine.engine_id()), cars[0].engine());

        assert!(context.driver().get_cars_by_brand("BMW", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_car_ok() {
        let context = TestContext::setup().await;
        let engine1 = create_test_engine(&context).await;
        let engine2 = db::create_engine(&mut context.ex().await, EngineRequest::new(1000, 2, 300))
            .await
            .unwrap();

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine1)).await.unwrap();
        let created_at = context.clock.now_utc();

        context.clock.advance(Duration::from_secs(60));
        let mut request = car_request("Model S", "Tesla", &engine2);
        request.fuel_type = "Hybrid".to_owned();
        let updated = context.driver().update_car(*car.id(), request).await.unwrap();

        assert_eq!(car.id(), updated.id());
        assert_eq!("Model S", updated.name());
        assert_eq!(&FuelType::Hybrid, updated.fuel_type());
        assert_eq!(&engine2, updated.engine());
        assert_eq!(&created_at, updated.created_at());
        assert_eq!(&context.clock.now_utc(), updated.updated_at());
        assert_eq!(updated, db::get_car(&mut context.ex().await, *car.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_car_not_found() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let id = Uuid::new_v4();
        assert_eq!(
            DriverError::NotFound(format!("Car {} not found", id)),
            context
                .driver()
                .update_car(id, car_request("Model X", "Tesla", &engine))
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_car_unknown_engine() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine)).await.unwrap();

        let other = Engine::new(Uuid::new_v4(), 2000, 4, 500);
        assert_eq!(
            DriverError::NotFound(format!("Engine {} not found", other.engine_id())),
            context
                .driver()
                .update_car(*car.id(), car_request("Model S", "Tesla", &other))
                .await
                .unwrap_err()
        );
        assert_eq!(car, db::get_car(&mut context.ex().await, *car.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_car_ok() {
        let context = TestContext::setup().await;
        let engine = create_test_engine(&context).await;

        let car =
            context.driver().create_car(car_request("Model X", "Tesla", &engine)).await.unwrap();

        assert_eq!(car, context.driver().delete_car(*car.id()).await.unwrap());
        assert_eq!(
            DbError::NotFound,
            db::get_car(&mut context.ex().await, *car.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_car_not_found() {
        let context = TestContext::setup().await;

        let id = Uuid::new_v4();
        assert_eq!(
            DriverError::NotFound(format!("Car {} not found", id)),
            context.driver().delete_car(id).await.unwrap_err()
        );
    }
}
