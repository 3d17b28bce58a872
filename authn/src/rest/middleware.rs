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

//! Middleware to guard routes behind a valid bearer token.

use crate::driver::AuthnDriver;
use crate::rest::httputils::{authn_error, get_bearer_auth};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use carzone_core::rest::RestError;

/// Rejects requests that lack a valid bearer token before they reach the wrapped handler.
///
/// On success, the `Username` the token was issued to is inserted in the request extensions so
/// that handlers can extract it with `axum::Extension`.
pub async fn require_bearer_auth(
    State(driver): State<AuthnDriver>,
    mut request: Request,
    next: Next,
) -> Result<Response, RestError> {
    let realm = driver.realm();
    let token = get_bearer_auth(request.headers(), realm)?;
    let username = driver.verify_token(&token).map_err(|e| authn_error(e, realm))?;
    request.extensions_mut().insert(username);
    Ok(next.run(request).await)
}
