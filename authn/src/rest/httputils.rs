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

//! Utilities to deal with HTTP authorization.

use crate::model::AccessToken;
use carzone_core::driver::DriverError;
use carzone_core::rest::{get_unique_header, RestError, RestResult};
use http::header::HeaderMap;

/// Authorization scheme accepted by this service.
const SCHEME: &str = "Bearer";

/// Builds an authentication error for the bearer scheme under `realm`.
fn unauthorized<S: Into<String>>(realm: &'static str, message: S) -> RestError {
    RestError::Unauthorized { scheme: SCHEME, realm, message: message.into() }
}

/// Converts a driver error into a REST error, turning authentication failures into challenges
/// for the bearer scheme under `realm`.
pub(crate) fn authn_error(e: DriverError, realm: &'static str) -> RestError {
    match e {
        DriverError::Unauthorized(message) => unauthorized(realm, message),
        e => RestError::from(e),
    }
}

/// Validates that the `Authorization` HTTP header contains a textual payload for the bearer
/// scheme and returns it.
fn get_authorization_header<'a>(
    headers: &'a HeaderMap,
    realm: &'static str,
) -> RestResult<&'a str> {
    let authz = match get_unique_header(headers, "Authorization") {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized(realm, "Missing Authorization header")),
        Err(e) => return Err(unauthorized(realm, e.to_string())),
    };

    let authz = authz
        .to_str()
        .map_err(|e| unauthorized(realm, format!("Bad encoding in Authorization header: {}", e)))?;

    let mut fields = authz.splitn(2, ' ');
    let scheme = match fields.next() {
        Some(s) if !s.is_empty() => s,
        _ => return Err(unauthorized(realm, "Bad Authorization header: missing scheme")),
    };
    let payload = match fields.next() {
        Some(s) if !s.trim().is_empty() => s.trim(),
        _ => return Err(unauthorized(realm, "Bad Authorization header: missing payload")),
    };

    if scheme != SCHEME {
        return Err(unauthorized(realm, "Unsupported scheme"));
    }

    Ok(payload)
}

/// Assumes that the `headers` contain a bearer access token and extracts it.
pub fn get_bearer_auth(headers: &HeaderMap, realm: &'static str) -> RestResult<AccessToken> {
    let payload = get_authorization_header(headers, realm)?;
    AccessToken::new(payload).map_err(|e| unauthorized(realm, e.to_string()))
}
