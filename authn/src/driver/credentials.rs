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

//! Sources of valid credentials for the `login` operation.

use crate::model::{HashedPassword, Password, Username};
use async_trait::async_trait;
use carzone_core::driver::DriverResult;
use carzone_core::env::get_required_var;

/// Checks whether a username and password pair is valid.
#[async_trait]
pub trait CredentialsVerifier {
    /// Returns true if `password` is the correct password for `username`.  Unknown users are not
    /// an error: they just yield false.
    async fn verify(&self, username: &Username, password: Password) -> DriverResult<bool>;
}

/// Verifier backed by a single configured user whose password is stored as a bcrypt hash.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    /// The only username accepted by this verifier.
    username: Username,

    /// Hash of the password for `username`.
    password_hash: HashedPassword,
}

impl StaticCredentials {
    /// Creates a new verifier that accepts `username` with a password matching `password_hash`.
    pub fn new(username: Username, password_hash: HashedPassword) -> Self {
        Self { username, password_hash }
    }

    /// Creates a new verifier from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_USERNAME` and `<prefix>_PASSWORD_HASH`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let username = get_required_var::<String>(prefix, "USERNAME")?;
        let username = Username::new(username)
            .map_err(|e| format!("Invalid {}_USERNAME: {}", prefix, e))?;
        let password_hash = get_required_var::<String>(prefix, "PASSWORD_HASH")?;
        let password_hash = HashedPassword::new(password_hash)
            .map_err(|e| format!("Invalid {}_PASSWORD_HASH: {}", prefix, e))?;
        Ok(Self::new(username, password_hash))
    }
}

#[async_trait]
impl CredentialsVerifier for StaticCredentials {
    async fn verify(&self, username: &Username, password: Password) -> DriverResult<bool> {
        if username != &self.username {
            return Ok(false);
        }
        Ok(password.verify(&self.password_hash)?)
    }
}
