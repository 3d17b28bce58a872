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

//! API to issue an access token for a user.

use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, Username};
use crate::rest::httputils::authn_error;
use axum::extract::State;
use axum::response::IntoResponse;
use carzone_core::driver::DriverError;
use carzone_core::rest::{JsonBody, RestError, SuccessResponse};
use serde::{Deserialize, Serialize};

/// Message sent to the server to request a login.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    /// Name of the user logging in.
    pub username: String,

    /// Password of the user logging in.
    pub password: String,
}

/// Message returned by the server after a successful login attempt.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    /// Access token to pass in the `Authorization` header of subsequent requests.
    pub token: AccessToken,
}

/// Error reported for any credentials that cannot possibly be valid.
fn bad_credentials(realm: &'static str) -> RestError {
    authn_error(DriverError::Unauthorized("Invalid username or password".to_owned()), realm)
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let realm = driver.realm();
    let username = Username::new(request.username).map_err(|_| bad_credentials(realm))?;
    let password = Password::new(request.password).map_err(|_| bad_credentials(realm))?;

    let token = driver.login(username, password).await.map_err(|e| authn_error(e, realm))?;

    Ok(SuccessResponse::ok("Login successful", LoginResponse { token }))
}
