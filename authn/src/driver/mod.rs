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

//! Business logic for user authentication.

use carzone_core::clocks::Clock;
use carzone_core::env::{get_optional_var, get_required_var};
use derivative::Derivative;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use std::time::Duration;

mod credentials;
pub use credentials::{CredentialsVerifier, StaticCredentials};
mod login;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;
mod verify;

/// Default value for the `TOKEN_MAX_AGE` setting when not specified.
const DEFAULT_TOKEN_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Configuration options for the authentication driver.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AuthnOptions {
    /// Secret used to sign and verify access tokens.
    #[derivative(Debug = "ignore")]
    pub secret: String,

    /// The amount of time we consider access tokens valid for.
    pub token_max_age: Duration,
}

impl AuthnOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_SECRET` and `<prefix>_TOKEN_MAX_AGE`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let secret = get_required_var::<String>(prefix, "SECRET")?;
        if secret.is_empty() {
            return Err(format!("Environment variable {}_SECRET cannot be empty", prefix));
        }
        Ok(Self {
            secret,
            token_max_age: get_optional_var::<Duration>(prefix, "TOKEN_MAX_AGE")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TOKEN_MAX_AGE_SECONDS)),
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver consume it, mirroring the way the rest of the
/// service handles per-request state.
#[derive(Clone)]
pub struct AuthnDriver {
    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Source of truth for the credentials accepted by `login`.
    verifier: Arc<dyn CredentialsVerifier + Send + Sync>,

    /// Key to sign new access tokens with.
    encoding_key: Arc<EncodingKey>,

    /// Key to verify the signature of incoming access tokens with.
    decoding_key: Arc<DecodingKey>,

    /// Authentication realm to return to requests.
    realm: &'static str,

    /// Options for the authentication driver.
    opts: AuthnOptions,
}

impl AuthnDriver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        verifier: Arc<dyn CredentialsVerifier + Send + Sync>,
        realm: &'static str,
        opts: AuthnOptions,
    ) -> Self {
        let encoding_key = Arc::from(EncodingKey::from_secret(opts.secret.as_bytes()));
        let decoding_key = Arc::from(DecodingKey::from_secret(opts.secret.as_bytes()));
        Self { clock, verifier, encoding_key, decoding_key, realm, opts }
    }

    /// Gets the authentication realm.
    pub(crate) fn realm(&self) -> &'static str {
        self.realm
    }

    /// Returns the JWT header used for all tokens issued by this driver.
    fn header() -> Header {
        Header::new(Algorithm::HS256)
    }

    /// Returns the JWT validation rules for tokens issued by this driver.
    ///
    /// Expiration is checked by hand against the injected clock, not against the system time.
    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

/// Contents of the access tokens issued by the driver.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct Claims {
    /// Name of the user the token was issued to.
    sub: String,

    /// Issue time in seconds since the Unix epoch.
    iat: i64,

    /// Expiration time in seconds since the Unix epoch.
    exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_options_from_env_only_required() {
        temp_env::with_vars(
            [("PREFIX_SECRET", Some("the-secret")), ("PREFIX_TOKEN_MAX_AGE", None)],
            || {
                let opts = AuthnOptions::from_env("PREFIX").unwrap();
                assert_eq!(
                    AuthnOptions {
                        secret: "the-secret".to_owned(),
                        token_max_age: Duration::from_secs(DEFAULT_TOKEN_MAX_AGE_SECONDS),
                    },
                    opts
                );
            },
        );
    }

    #[test]
    pub fn test_options_from_env_all_present() {
        temp_env::with_vars(
            [("PREFIX_SECRET", Some("the-secret")), ("PREFIX_TOKEN_MAX_AGE", Some("10m"))],
            || {
                let opts = AuthnOptions::from_env("PREFIX").unwrap();
                assert_eq!(
                    AuthnOptions {
                        secret: "the-secret".to_owned(),
                        token_max_age: Duration::from_secs(10 * 60),
                    },
                    opts
                );
            },
        );
    }

    #[test]
    pub fn test_options_from_env_missing_secret() {
        temp_env::with_vars_unset(["PREFIX_SECRET"], || {
            let err = AuthnOptions::from_env("PREFIX").unwrap_err();
            assert!(err.contains("PREFIX_SECRET not present"));
        });
    }

    #[test]
    pub fn test_options_from_env_empty_secret() {
        temp_env::with_var("PREFIX_SECRET", Some(""), || {
            let err = AuthnOptions::from_env("PREFIX").unwrap_err();
            assert!(err.contains("cannot be empty"));
        });
    }

    #[test]
    pub fn test_options_debug_hides_secret() {
        let opts = AuthnOptions {
            secret: "super-secret".to_owned(),
            token_max_age: Duration::from_secs(60),
        };
        assert!(!format!("{:?}", opts).contains("super-secret"));
    }
}
