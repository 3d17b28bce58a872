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

//! Utilities to help testing services that protect their routes with bearer tokens.

use crate::driver::testutils::{TEST_PASSWORD, TEST_USERNAME};
use crate::model::AccessToken;
use crate::rest::{LoginRequest, LoginResponse};
use axum::Router;
use carzone_core::rest::testutils::OneShotBuilder;
use http::Method;

/// Logs in as the test user through the `/login` API served by `app` and returns the token.
pub async fn do_test_login(app: Router) -> AccessToken {
    let request =
        LoginRequest { username: TEST_USERNAME.to_owned(), password: TEST_PASSWORD.to_owned() };
    let response = OneShotBuilder::new(app, (Method::POST, "/login"))
        .send_json(request)
        .await
        .expect_success::<LoginResponse>("Login successful")
        .await;
    response.token
}
