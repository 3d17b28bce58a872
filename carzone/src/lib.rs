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

//! REST service to manage a catalog of cars and the engines they are built with.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use carzone_authn::driver::{AuthnDriver, AuthnOptions, CredentialsVerifier};
use carzone_core::clocks::SystemClock;
use carzone_core::db::Db;
use log::{info, warn};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod db;
pub(crate) mod driver;
use driver::Driver;
pub(crate) mod model;
mod rest;
use rest::app;

/// Authentication realm reported to clients that fail to authenticate.
pub(crate) const REALM: &str = "carzone";

/// Waits until the process is asked to terminate.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot wait for Ctrl-C; shutting down: {}", e);
    }
    info!("Shutdown requested; draining in-flight requests");
}

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// Returns once the server has shut down gracefully.  The caller retains ownership of `db` and is
/// responsible for closing it afterwards.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    authn_opts: AuthnOptions,
    verifier: Arc<dyn CredentialsVerifier + Send + Sync>,
) -> Result<(), Box<dyn Error>> {
    let clock = Arc::new(SystemClock::default());
    let driver = Driver::new(db, clock.clone());
    let authn = AuthnDriver::new(clock, verifier, REALM, authn_opts);
    let app = app(driver, authn);

    let listener = TcpListener::bind(bind_addr.into()).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
