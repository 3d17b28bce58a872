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

//! REST interface for bearer token authentication.

use crate::driver::AuthnDriver;
use axum::Router;

mod api_login_post;
mod httputils;
mod middleware;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use api_login_post::{LoginRequest, LoginResponse};
pub use httputils::get_bearer_auth;
pub use middleware::require_bearer_auth;

/// Creates the router for the authentication endpoints.
///
/// The `driver` is a configured instance of the `AuthnDriver` to issue tokens with.  Routes that
/// need protection should be wrapped with `require_bearer_auth` using the same driver.
pub fn app(driver: AuthnDriver) -> Router {
    use axum::routing::post;

    Router::new().route("/login", post(api_login_post::handler)).with_state(driver)
}
