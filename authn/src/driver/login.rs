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

//! Extends the driver with the `login` method.

use crate::driver::{AuthnDriver, Claims};
use crate::model::{AccessToken, Password, Username};
use carzone_core::driver::{DriverError, DriverResult};
use log::warn;

impl AuthnDriver {
    /// Logs a user with `username` and `password` and issues a signed access token for them.
    pub(crate) async fn login(
        self,
        username: Username,
        password: Password,
    ) -> DriverResult<AccessToken> {
        if !self.verifier.verify(&username, password).await? {
            warn!("Failed login attempt for user {}", username.as_str());
            return Err(DriverError::Unauthorized("Invalid username or password".to_owned()));
        }

        let now = self.clock.now_utc();
        let exp = now + self.opts.token_max_age;
        let claims = Claims {
            sub: username.as_str().to_owned(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        let token = jsonwebtoken::encode(&Self::header(), &claims, &self.encoding_key)
            .map_err(|e| DriverError::BackendError(format!("Failed to sign token: {}", e)))?;
        Ok(AccessToken::new(token)?)
    }
}
