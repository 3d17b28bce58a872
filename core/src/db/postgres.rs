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
//! PostgreSQL backend used by the deployed service.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgPool, PgPoolOptions, Postgres,
};
use sqlx::Transaction;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Number of retries used when `<prefix>_MAX_RETRIES` is not set.
const DEFAULT_MAX_RETRIES: u16 = 60;

/// Pool acquisition timeout used when `<prefix>_ACQUIRE_TIMEOUT` is not set.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Converts a raw SQLx error `e` into a `DbError`, classifying the PostgreSQL error codes that the
/// stores care about.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.downcast_ref::<PgDatabaseError>().code() {
            // A car pointing to an engine that does not exist.
            "23503" => DbError::NotFound,
            "23505" => DbError::AlreadyExists,
            "53300" => DbError::Unavailable,
            code => DbError::BackendError(format!("pgsql error {}: {}", code, e)),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection settings for the PostgreSQL database.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Server hostname.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Name of the database holding the catalog.
    pub database: String,

    /// Role to log in as.
    pub username: String,

    /// Password for `username`.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Connections the pool keeps open even when idle.
    pub min_connections: Option<u32>,

    /// Upper bound on the connections the pool may open.
    pub max_connections: Option<u32>,

    /// How many times to retry acquiring a connection or opening a transaction while the server
    /// reports that it is unavailable.
    pub max_retries: u16,

    /// How long to wait for a free pooled connection before treating the server as unavailable.
    pub acquire_timeout: Duration,
}

impl PostgresOptions {
    /// Reads the options from the `<prefix>_HOST`, `<prefix>_PORT`, `<prefix>_DATABASE`,
    /// `<prefix>_USERNAME` and `<prefix>_PASSWORD` variables, all required, and from the optional
    /// `<prefix>_MIN_CONNECTIONS`, `<prefix>_MAX_CONNECTIONS`, `<prefix>_MAX_RETRIES` and
    /// `<prefix>_ACQUIRE_TIMEOUT` variables.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        let host = get_required_var::<String>(prefix, "HOST")?;
        let port = get_required_var::<u16>(prefix, "PORT")?;
        let database = get_required_var::<String>(prefix, "DATABASE")?;
        let username = get_required_var::<String>(prefix, "USERNAME")?;
        let password = get_required_var::<String>(prefix, "PASSWORD")?;

        let max_retries =
            get_optional_var::<u16>(prefix, "MAX_RETRIES")?.unwrap_or(DEFAULT_MAX_RETRIES);
        let acquire_timeout = get_optional_var::<Duration>(prefix, "ACQUIRE_TIMEOUT")?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT);

        Ok(PostgresOptions {
            host,
            port,
            database,
            username,
            password,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            max_retries,
            acquire_timeout,
        })
    }

    /// Builds the sizing settings of the connection pool.
    fn pool_options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new().acquire_timeout(self.acquire_timeout);
        if let Some(n) = self.min_connections {
            options = options.min_connections(n);
        }
        if let Some(n) = self.max_connections {
            options = options.max_connections(n);
        }
        options
    }

    /// Builds the settings used by every connection of the pool.
    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
    }
}

/// Backoff applied while the server reports that it is unavailable.
#[derive(Clone, Copy, Debug)]
struct Backoff {
    /// Retries left after the first attempt.
    retries: u16,

    /// Delay before the first retry, also the upper bound of the random jitter.
    base: Duration,

    /// Longest delay between two attempts.
    cap: Duration,
}

impl Backoff {
    /// Creates a backoff policy allowing `retries` retries.
    fn new(retries: u16) -> Self {
        Self { retries, base: Duration::from_millis(100), cap: Duration::from_secs(5) }
    }

    /// Computes the delay that follows `delay`: doubled, plus jitter, and never above `cap`.
    fn next_delay(&self, delay: Duration) -> Duration {
        let max_jitter = u64::try_from(self.base.as_millis()).unwrap_or(u64::MAX);
        let jitter = Duration::from_millis(rand::random::<u64>() % max_jitter.saturating_add(1));
        (delay * 2 + jitter).min(self.cap)
    }

    /// Runs `op` until it succeeds, fails with something other than unavailability, or the
    /// retries are exhausted.  `what` names the operation in log messages.
    async fn run<Op, OpFut, T>(self, what: &str, op: Op) -> DbResult<T>
    where
        Op: Fn() -> OpFut,
        OpFut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut retries = self.retries;
        let mut delay = self.base;
        loop {
            match op().await.map_err(map_sqlx_error) {
                Err(DbError::Unavailable) if retries > 0 => {
                    retries -= 1;
                    warn!(
                        "Cannot {} because the database is unavailable; retrying in {}ms ({} left)",
                        what,
                        delay.as_millis(),
                        retries
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                }
                result => return result,
            }
        }
    }
}

/// Executor for PostgreSQL, either on a pooled connection or inside a transaction.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// Runs queries on a connection taken from the pool.
    PoolExec(PoolConnection<Postgres>),

    /// Runs queries within an open transaction.
    TxExec(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Commits the transaction behind this executor.
    ///
    /// Panics if the executor is not transaction-based.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            PostgresExecutor::PoolExec(_) => unreachable!("Only transactions can be committed"),
            PostgresExecutor::TxExec(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// Exposes the connection so that queries can run on `&mut **ex`.
impl Deref for PostgresExecutor {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        match self {
            PostgresExecutor::PoolExec(conn) => conn,
            PostgresExecutor::TxExec(tx) => tx,
        }
    }
}

impl DerefMut for PostgresExecutor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PostgresExecutor::PoolExec(conn) => conn,
            PostgresExecutor::TxExec(tx) => tx,
        }
    }
}

/// Lazily-connected pool to the PostgreSQL database.
pub struct PostgresDb {
    /// Pool shared by all executors.
    pool: PgPool,

    /// Policy to wait out temporary unavailability of the server.
    backoff: Backoff,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("PostgreSQL pool dropped without calling close()");
        }
    }
}

impl PostgresDb {
    /// Prepares a pool configured by `opts`.  No connection is made until the first query.
    pub fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let pool = opts.pool_options().connect_lazy_with(opts.connect_options());
        Ok(Self { pool, backoff: Backoff::new(opts.max_retries) })
    }

    /// Takes a connection from the pool, waiting for the server if it is unavailable.
    pub async fn typed_ex(&self) -> DbResult<PostgresExecutor> {
        let conn = self.backoff.run("acquire a connection", || self.pool.acquire()).await?;
        Ok(PostgresExecutor::PoolExec(conn))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Postgres(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.backoff.run("begin a transaction", || self.pool.begin()).await?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Applies the `schema` script, which may contain multiple statements, through `ex`.
pub async fn run_schema(ex: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(&mut **ex).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Test utilities for the PostgreSQL connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the database configured in the `PGSQL_TEST_*` variables.
    ///
    /// The pool holds exactly one connection whose `search_path` points to `pg_temp`, so every
    /// table a test creates vanishes when the pool closes.
    ///
    /// Panics on any error.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let mut opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
        opts.min_connections = Some(1);
        opts.max_connections = Some(1);
        let db = PostgresDb::connect(opts).unwrap();

        let mut ex = db.typed_ex().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(&mut *ex).await.unwrap();
        db
    }
}
