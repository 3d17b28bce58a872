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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;
use carzone_authn::driver::AuthnDriver;
use carzone_authn::rest::require_bearer_auth;
use carzone_core::rest::{RestError, RestResult};
use uuid::Uuid;

mod car_delete;
mod car_get;
mod car_put;
mod cars_get;
mod cars_post;
mod engine_delete;
mod engine_get;
mod engine_put;
mod engines_post;
#[cfg(test)]
mod testutils;

/// Parses the identifier of an entity given in a request path.
fn parse_id(id: &str) -> RestResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|e| RestError::InvalidRequest(format!("Invalid ID '{}': {}", id, e)))
}

/// Creates the router for the application.
///
/// All car and engine APIs require a bearer token issued by the `/login` API that `authn` serves.
pub(crate) fn app(driver: Driver, authn: AuthnDriver) -> Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/cars", get(cars_get::handler).post(cars_post::handler))
        .route(
            "/cars/:id",
            get(car_get::handler).put(car_put::handler).delete(car_delete::handler),
        )
        .route("/engines", post(engines_post::handler))
        .route(
            "/engines/:id",
            get(engine_get::handler).put(engine_put::handler).delete(engine_delete::handler),
        )
        .route_layer(from_fn_with_state(authn.clone(), require_bearer_auth))
        .with_state(driver);

    carzone_authn::rest::app(authn).merge(protected)
}
