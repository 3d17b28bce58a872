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

//! Utilities to help testing services that integrate with the `authn` features.

use crate::driver::{AuthnDriver, AuthnOptions, StaticCredentials};
use crate::model::{Password, Username};
use carzone_core::clocks::testutils::SettableClock;
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;

/// Username accepted by the test credentials.
pub const TEST_USERNAME: &str = "admin";

/// Password accepted by the test credentials.
pub const TEST_PASSWORD: &str = "admin123";

/// Secret used to sign tokens in tests.
pub const TEST_SECRET: &str = "test-secret";

/// Returns a verifier that accepts `TEST_USERNAME` with `TEST_PASSWORD`.
///
/// The password is hashed with the minimum bcrypt cost to keep tests fast.
pub fn test_credentials() -> StaticCredentials {
    let hash = Password::from(TEST_PASSWORD).hash(4).expect("Hashing must succeed");
    StaticCredentials::new(Username::from(TEST_USERNAME), hash)
}

/// Returns the options used by test drivers.
pub fn test_options() -> AuthnOptions {
    AuthnOptions {
        secret: TEST_SECRET.to_owned(),
        token_max_age: Duration::from_secs(24 * 60 * 60),
    }
}

/// State of a running test.
pub struct TestContext {
    /// The clock used by the driver, which tests can move around.
    pub clock: Arc<SettableClock>,

    /// The driver to handle authentication flows.
    driver: AuthnDriver,
}

impl TestContext {
    /// Initializes the driver using a settable clock and the test credentials.
    pub fn setup() -> Self {
        let clock = Arc::from(SettableClock::new(datetime!(2024-06-01 10:00:00 UTC)));
        Self::setup_with(clock, "the-realm")
    }

    /// Initializes the test context using the given already-initialized objects.
    pub fn setup_with(clock: Arc<SettableClock>, realm: &'static str) -> Self {
        let driver = AuthnDriver::new(
            clock.clone(),
            Arc::new(test_credentials()),
            realm,
            test_options(),
        );
        TestContext { clock, driver }
    }

    /// Gets a copy of the driver in this test context.
    pub fn driver(&self) -> AuthnDriver {
        self.driver.clone()
    }
}
