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

//! Extends the driver with the `verify_token` method.

use crate::driver::{AuthnDriver, Claims};
use crate::model::{AccessToken, Username};
use carzone_core::driver::{DriverError, DriverResult};
use jsonwebtoken::errors::ErrorKind;

impl AuthnDriver {
    /// Checks that `token` was signed by us and has not expired yet, returning the user it was
    /// issued to.
    pub(crate) fn verify_token(&self, token: &AccessToken) -> DriverResult<Username> {
        let data =
            jsonwebtoken::decode::<Claims>(token.as_str(), &self.decoding_key, &Self::validation())
                .map_err(|e| match e.kind() {
                    ErrorKind::InvalidSignature => {
                        DriverError::Unauthorized("Invalid token signature".to_owned())
                    }
                    _ => DriverError::Unauthorized("Invalid token".to_owned()),
                })?;

        if data.claims.exp <= self.clock.now_utc().unix_timestamp() {
            return Err(DriverError::Unauthorized("Token has expired".to_owned()));
        }

        Username::new(data.claims.sub)
            .map_err(|_| DriverError::Unauthorized("Invalid token subject".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::model::Password;
    use carzone_core::clocks::Clock;
    use jsonwebtoken::{EncodingKey, Header};
    use std::time::Duration;

    /// Signs arbitrary `claims` with `secret` for tests that need malformed tokens.
    fn sign<T: serde::Serialize>(claims: &T, secret: &str) -> AccessToken {
        let token = jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        AccessToken::new(token).unwrap()
    }

    async fn do_login(context: &TestContext) -> AccessToken {
        context
            .driver()
            .login(Username::from(TEST_USERNAME), Password::from(TEST_PASSWORD))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_verify_token_ok_until_expiration() {
        let context = TestContext::setup();
        let token = do_login(&context).await;

        context.clock.advance(Duration::from_secs(24 * 60 * 60 - 1));
        assert_eq!(Username::from(TEST_USERNAME), context.driver().verify_token(&token).unwrap());

        context.clock.advance(Duration::from_secs(1));
        match context.driver().verify_token(&token) {
            Err(DriverError::Unauthorized(msg)) => assert_eq!("Token has expired", msg),
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let context = TestContext::setup();
        let now = context.clock.now_utc().unix_timestamp();
        let token = sign(
            &Claims { sub: TEST_USERNAME.to_owned(), iat: now, exp: now + 60 },
            "other-secret",
        );

        match context.driver().verify_token(&token) {
            Err(DriverError::Unauthorized(msg)) => assert_eq!("Invalid token signature", msg),
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_verify_token_missing_claims() {
        #[derive(serde::Serialize)]
        struct NoExp {
            sub: String,
        }

        let context = TestContext::setup();
        let token = sign(&NoExp { sub: TEST_USERNAME.to_owned() }, TEST_SECRET);

        match context.driver().verify_token(&token) {
            Err(DriverError::Unauthorized(msg)) => assert_eq!("Invalid token", msg),
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_verify_token_garbage() {
        let context = TestContext::setup();
        let token = AccessToken::new("abc.def.ghi").unwrap();

        match context.driver().verify_token(&token) {
            Err(DriverError::Unauthorized(msg)) => assert_eq!("Invalid token", msg),
            e => panic!("{:?}", e),
        }
    }
}
