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

//! Operations on engines.

use crate::db;
use crate::driver::Driver;
use crate::model::{Engine, EngineRequest};
use carzone_core::driver::{DriverError, DriverResult};
use log::{info, warn};
use uuid::Uuid;

/// Builds the error returned when the engine `id` does not exist.
pub(super) fn engine_not_found(id: Uuid) -> DriverError {
    DriverError::NotFound(format!("Engine {} not found", id))
}

impl Driver {
    /// Gets the engine identified by `id`.
    pub(crate) async fn get_engine(self, id: Uuid) -> DriverResult<Engine> {
        let mut tx = self.db.begin().await?;
        let engine = db::get_engine(tx.ex(), id).await?.ok_or_else(|| engine_not_found(id))?;
        tx.commit().await?;
        Ok(engine)
    }

    /// Creates a new engine as described by `request`.
    pub(crate) async fn create_engine(self, request: EngineRequest) -> DriverResult<Engine> {
        request.validate()?;

        let mut tx = self.db.begin().await?;
        let engine = db::create_engine(tx.ex(), request).await?;
        tx.commit().await?;

        info!("Created engine {}", engine.engine_id());
        Ok(engine)
    }

    /// Replaces the attributes of the engine identified by `id` with those in `request`.
    pub(crate) async fn update_engine(
        self,
        id: Uuid,
        request: EngineRequest,
    ) -> DriverResult<Engine> {
        request.validate()?;

        let mut tx = self.db.begin().await?;
        let engine = db::update_engine(tx.ex(), id, request).await?;
        tx.commit().await?;
        Ok(engine)
    }

    /// Deletes the engine identified by `id`, which must not be used by any car.
    pub(crate) async fn delete_engine(self, id: Uuid) -> DriverResult<Engine> {
        let mut tx = self.db.begin().await?;

        let cars = db::count_cars_with_engine(tx.ex(), id).await?;
        if cars > 0 {
            warn!("Refusing to delete engine {} used by {} cars", id, cars);
            return Err(DriverError::InUse(format!(
                "Engine {} is still used by {} car(s)",
                id, cars
            )));
        }

        let engine = db::delete_engine(tx.ex(), id).await?.ok_or_else(|| engine_not_found(id))?;
        tx.commit().await?;

        info!("Deleted engine {}", id);
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::driver::testutils::*;
    use crate::model::{CarRequest, Engine};
    use carzone_core::clocks::Clock;

    /// Creates an engine through the driver with valid attributes.
    async fn create_test_engine(context: &TestContext) -> Engine {
        context.driver().create_engine(EngineRequest::new(2000, 4, 500)).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_engine_ok() {
        let context = TestContext::setup().await;

        let engine = db::create_engine(&mut context.ex().await, EngineRequest::new(2000, 4, 500))
            .await
            .unwrap();

        assert_eq!(engine, context.driver().get_engine(*engine.engine_id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_engine_not_found() {
        let context = TestContext::setup().await;

        let id = Uuid::new_v4();
        assert_eq!(
            DriverError::NotFound(format!("Engine {} not found", id)),
            context.driver().get_engine(id).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_engine_ok() {
        let context = TestContext::setup().await;

        let engine = create_test_engine(&context).await;
        assert_eq!(Engine::new(*engine.engine_id(), 2000, 4, 500), engine);

        let stored = db::get_engine(&mut context.ex().await, *engine.engine_id()).await.unwrap();
        assert_eq!(Some(engine), stored);
    }

    #[tokio::test]
    async fn test_create_engine_invalid() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::InvalidInput("NoOfCylinders must be greater than 0".to_owned()),
            context.driver().create_engine(EngineRequest::new(2000, 0, 500)).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_engine_ok() {
        let context = TestContext::setup().await;

        let engine = create_test_engine(&context).await;
        let id = *engine.engine_id();

        let updated =
            context.driver().update_engine(id, EngineRequest::new(1500, 3, 700)).await.unwrap();
        assert_eq!(Engine::new(id, 1500, 3, 700), updated);
        assert_eq!(Some(updated), db::get_engine(&mut context.ex().await, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_engine_invalid_does_not_write() {
        let context = TestContext::setup().await;

        let engine = create_test_engine(&context).await;
        let id = *engine.engine_id();

        assert_eq!(
            DriverError::InvalidInput("CarRange must be greater than 0".to_owned()),
            context.driver().update_engine(id, EngineRequest::new(1500, 3, 0)).await.unwrap_err()
        );
        assert_eq!(Some(engine), db::get_engine(&mut context.ex().await, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_engine_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Entity was not updated".to_owned()),
            context
                .driver()
                .update_engine(Uuid::new_v4(), EngineRequest::new(1, 1, 1))
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_engine_ok() {
        let context = TestContext::setup().await;

        let engine = create_test_engine(&context).await;
        let id = *engine.engine_id();

        assert_eq!(engine, context.driver().delete_engine(id).await.unwrap());
        assert_eq!(None, db::get_engine(&mut context.ex().await, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_engine_not_found() {
        let context = TestContext::setup().await;

        let id = Uuid::new_v4();
        assert_eq!(
            DriverError::NotFound(format!("Engine {} not found", id)),
            context.driver().delete_engine(id).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_engine_in_use() {
        let context = TestContext::setup().await;

        let engine = create_test_engine(&context).await;
        let id = *engine.engine_id();
        let request = CarRequest {
            name: "Model X".to_owned(),
            year: "2022".to_owned(),
            brand: "Tesla".to_owned(),
            fuel_type: "Electric".to_owned(),
            engine: engine.clone(),
            price: 49999.0,
        };
        let spec = request.validate(context.clock.current_year()).unwrap();
        db::create_car(&mut context.ex().await, spec, context.clock.now_utc()).await.unwrap();

        assert_eq!(
            DriverError::InUse(format!("Engine {} is still used by 1 car(s)", id)),
            context.driver().delete_engine(id).await.unwrap_err()
        );
        assert_eq!(Some(engine), db::get_engine(&mut context.ex().await, id).await.unwrap());
    }
}
