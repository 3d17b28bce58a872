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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::{Car, CarRequest, Engine, EngineRequest};
use crate::rest::app;
use crate::REALM;
use axum::http::Method;
use axum::Router;
use carzone_authn::model::AccessToken;
use carzone_authn::rest::testutils::do_test_login;
use carzone_core::clocks::testutils::SettableClock;
use carzone_core::clocks::Clock;
use carzone_core::db::sqlite::testutils::setup;
use carzone_core::db::{Db, Executor};
use carzone_core::rest::testutils::OneShotBuilder;
use std::sync::Arc;
use time::macros::datetime;
use uuid::Uuid;

/// Builds a valid request for a car of the given `brand` built with `engine`.
pub(crate) fn car_request(name: &str, brand: &str, engine: &Engine) -> CarRequest {
    CarRequest {
        name: name.to_owned(),
        year: "2020".to_owned(),
        brand: brand.to_owned(),
        fuel_type: "Petrol".to_owned(),
        engine: engine.clone(),
        price: 25000.0,
    }
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the app.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock shared by the business logic and the authentication layer.
    pub(crate) clock: Arc<SettableClock>,

    /// The app under test.
    app: Router,

    /// A valid token obtained by logging in with the test credentials.
    token: AccessToken,
}

impl TestContext {
    /// Initializes the app using an in-memory database and logs in as the test user.
    pub(crate) async fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(datetime!(2024-06-01 10:00:00 UTC)));

        let driver = Driver::new(db.clone(), clock.clone());
        let authn =
            carzone_authn::driver::testutils::TestContext::setup_with(clock.clone(), REALM)
                .driver();
        let app = app(driver, authn);

        let token = do_test_login(app.clone()).await;
        Self { db, clock, app, token }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Starts building an authenticated request against `route`.
    pub(crate) fn request<U: AsRef<str>>(&self, route: (Method, U)) -> OneShotBuilder {
        OneShotBuilder::new(self.app(), route).with_bearer_auth(self.token.as_str())
    }

    /// Stores an engine directly in the database.
    pub(crate) async fn create_engine(
        &self,
        displacement: i64,
        no_of_cylinders: i64,
        car_range: i64,
    ) -> Engine {
        let request = EngineRequest::new(displacement, no_of_cylinders, car_range);
        db::create_engine(&mut self.ex().await, request).await.unwrap()
    }

    /// Stores a car of the given `brand` built with `engine` directly in the database.
    pub(crate) async fn create_car(&self, name: &str, brand: &str, engine: &Engine) -> Car {
        let spec = car_request(name, brand, engine).validate(self.clock.current_year()).unwrap();
        db::create_car(&mut self.ex().await, spec, self.clock.now_utc()).await.unwrap()
    }

    /// Fetches a car directly from the database, if it exists.
    pub(crate) async fn get_car(&self, id: Uuid) -> Option<Car> {
        db::get_car(&mut self.ex().await, id).await.ok()
    }

    /// Fetches an engine directly from the database, if it exists.
    pub(crate) async fn get_engine(&self, id: Uuid) -> Option<Engine> {
        db::get_engine(&mut self.ex().await, id).await.unwrap()
    }
}

/// Generates a test to verify that an authenticated API that expects JSON fails when it gets
/// something else.
macro_rules! test_payload_must_be_json {
    ( $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_json() {
            let context = $crate::rest::testutils::TestContext::setup().await;

            context
                .request($route)
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_error("Content-Type")
                .await;

            context
                .request($route)
                .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_error("expected ident")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_json;

/// Generates a test to verify that an authenticated API that does not expect a payload fails as
/// necessary.
macro_rules! test_payload_must_be_empty {
    ( $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            let context = $crate::rest::testutils::TestContext::setup().await;

            context
                .request($route)
                .send_text("should not be here")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("should be empty")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_empty;
