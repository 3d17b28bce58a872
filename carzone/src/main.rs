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

//! Entry point to the CarZone service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use carzone::db::init_schema;
use carzone::serve;
use carzone_authn::driver::{AuthnOptions, StaticCredentials};
use carzone_core::db::postgres::{PostgresDb, PostgresOptions};
use carzone_core::db::Db;
use carzone_core::env::get_optional_var;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Prefix of the environment variables that configure the service.
const ENV_PREFIX: &str = "CARZONE";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _missing_is_ok = dotenvy::dotenv();
    env_logger::init();

    let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(8080);
    let addr = (Ipv4Addr::UNSPECIFIED, port);

    let authn_opts = AuthnOptions::from_env("CARZONE_AUTHN")?;
    let credentials = StaticCredentials::from_env("CARZONE_AUTHN")?;

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let db: Arc<dyn Db + Send + Sync> = Arc::new(PostgresDb::connect(db_opts)?);
    init_schema(&mut db.ex().await?).await?;

    let result = serve(addr, db.clone(), authn_opts, Arc::new(credentials)).await;
    db.close().await;
    result
}
