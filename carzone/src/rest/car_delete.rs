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

//! API to delete a car.

use crate::driver::Driver;
use crate::rest::parse_id;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use carzone_core::rest::{EmptyBody, RestError, SuccessResponse};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let id = parse_id(&id)?;
    let car = driver.delete_car(id).await?;
    Ok(SuccessResponse::ok("Car deleted successfully", car))
}

#[cfg(test)]
mod tests {
    use crate::model::Car;
    use crate::rest::testutils::*;
    use axum::http;
    use uuid::Uuid;

    fn route<D: std::fmt::Display>(id: D) -> (http::Method, String) {
        (http::Method::DELETE, format!("/cars/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let engine = context.create_engine(2000, 4, 500).await;
        let car = context.create_car("Mustang", "Ford", &engine).await;
        let other = context.create_car("Focus", "Ford", &engine).await;

        let response = context
            .request(route(car.id()))
            .send_empty()
            .await
            .expect_success::<Car>("Car deleted successfully")
            .await;
        assert_eq!(car, response);

        assert_eq!(None, context.get_car(*car.id()).await);
        assert_eq!(Some(other.clone()), context.get_car(*other.id()).await);
        assert_eq!(Some(engine.clone()), context.get_engine(*engine.engine_id()).await);
    }

    #[tokio::test]
    async fn test_twice() {
        let context = TestContext::setup().await;
        let engine = context.create_engine(2000, 4, 500).await;
        let car = context.create_car("Mustang", "Ford", &engine).await;

        context
            .request(route(car.id()))
            .send_empty()
            .await
            .expect_success::<Car>("Car deleted successfully")
            .await;

        context
            .request(route(car.id()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error(&format!("Car {} not found", car.id()))
            .await;
    }

    #[tokio::test]
    async fn test_invalid_id() {
        let context = TestContext::setup().await;

        context
            .request(route("1234"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Invalid ID")
            .await;
    }

    test_payload_must_be_empty!(route(Uuid::new_v4()));
}
