//! Relational backend over `SeaORM`.
//!
//! [`RelationalDb`] owns the pooled `DatabaseConnection`. Read scopes hand out
//! an autocommit [`RelationalSession`]; write scopes hand out one bound to a
//! `DatabaseTransaction` opened with the configured [`TxConfig`].

mod adapter;
mod field;

pub use adapter::RelationalAdapter;
pub use field::{Field, FieldKind, FieldMap, coerce};

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RelationalConfig, redact_credentials_in_dsn};
use crate::guard::{ensure_top_level, with_tx_guard};
use crate::scope::{ScopeFuture, Store};
use crate::tx_config::TxConfig;
use crate::{DbError, Result};

#[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
use crate::pool_opts::ApplyPoolOpts;

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbEngine {
    #[serde(alias = "postgresql")]
    Postgres,
    MySql,
    Sqlite,
}

impl DbEngine {
    /// Detect engine by DSN scheme.
    ///
    /// # Errors
    /// Returns `DbError::UnknownDsn` if the DSN scheme is not recognized.
    pub fn detect(dsn: &str) -> Result<Self> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("mysql://") {
            Ok(DbEngine::MySql)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
        }
    }

    #[must_use]
    pub fn scheme(self) -> &'static str {
        match self {
            DbEngine::Postgres => "postgres",
            DbEngine::MySql => "mysql",
            DbEngine::Sqlite => "sqlite",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            DbEngine::Postgres => 5432,
            DbEngine::MySql => 3306,
            DbEngine::Sqlite => 0,
        }
    }

    fn from_backend(backend: DbBackend) -> Self {
        match backend {
            DbBackend::Postgres => DbEngine::Postgres,
            DbBackend::MySql => DbEngine::MySql,
            DbBackend::Sqlite => DbEngine::Sqlite,
        }
    }
}

impl std::fmt::Display for DbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Pooled relational store handle. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RelationalDb {
    conn: DatabaseConnection,
    tx_config: TxConfig,
}

impl RelationalDb {
    /// Build the pool described by `cfg`.
    ///
    /// # Errors
    /// Configuration errors from [`RelationalConfig::resolve_dsn`],
    /// `FeatureDisabled` when the engine's driver is not compiled in, or
    /// `BackendUnavailable` when the pool cannot connect.
    pub async fn connect(cfg: &RelationalConfig) -> Result<Self> {
        let dsn = cfg.resolve_dsn()?;
        let engine = DbEngine::detect(&dsn)?;
        info!(
            dsn = %redact_credentials_in_dsn(Some(&dsn)),
            %engine,
            "connecting relational store"
        );

        let conn = match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let pool = sea_orm::sqlx::postgres::PgPoolOptions::new()
                    .apply(&cfg.pool)
                    .connect(&dsn)
                    .await?;
                sea_orm::SqlxPostgresConnector::from_sqlx_postgres_pool(pool)
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => {
                return Err(DbError::FeatureDisabled("PostgreSQL feature not enabled"));
            }
            #[cfg(feature = "mysql")]
            DbEngine::MySql => {
                let pool = sea_orm::sqlx::mysql::MySqlPoolOptions::new()
                    .apply(&cfg.pool)
                    .connect(&dsn)
                    .await?;
                sea_orm::SqlxMySqlConnector::from_sqlx_mysql_pool(pool)
            }
            #[cfg(not(feature = "mysql"))]
            DbEngine::MySql => return Err(DbError::FeatureDisabled("MySQL feature not enabled")),
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                prepare_sqlite_path(&dsn)?;
                let pool = sea_orm::sqlx::sqlite::SqlitePoolOptions::new()
                    .apply(&cfg.pool)
                    .connect(&dsn)
                    .await?;
                sea_orm::SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
            }
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => return Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        };

        Ok(Self {
            conn,
            tx_config: cfg.transaction.clone(),
        })
    }

    /// Wrap an existing connection.
    #[must_use]
    pub fn from_connection(conn: DatabaseConnection, tx_config: TxConfig) -> Self {
        Self { conn, tx_config }
    }

    /// Raw connection, for schema bootstrap and administrative statements.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    #[must_use]
    pub fn engine(&self) -> DbEngine {
        DbEngine::from_backend(self.conn.get_database_backend())
    }

    #[must_use]
    pub fn tx_config(&self) -> &TxConfig {
        &self.tx_config
    }

    /// Write scope with settings other than the configured ones.
    ///
    /// # Errors
    /// Same as [`Store::write`].
    pub async fn write_with_config<T, E, F>(&self, config: TxConfig, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut RelationalSession) -> ScopeFuture<'a, T, E> + Send + 'static,
    {
        ensure_top_level().map_err(E::from)?;
        let txn = begin(&self.conn, &config).await.map_err(E::from)?;
        run_in_tx(txn, config, f).await
    }

    /// Close the pool.
    ///
    /// # Errors
    /// Returns `BackendUnavailable` if the driver fails to close.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for RelationalDb {
    type Session = RelationalSession;

    async fn read<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static,
    {
        ensure_top_level().map_err(E::from)?;
        debug!(engine = %self.engine(), "read scope");
        // No connection is checked out here; every statement takes its own.
        let mut session = RelationalSession {
            runner: Runner::Conn(self.conn.clone()),
            tx_config: self.tx_config.clone(),
        };
        f(&mut session).await
    }

    async fn write<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static,
    {
        self.write_with_config(self.tx_config.clone(), f).await
    }
}

enum Runner {
    Conn(DatabaseConnection),
    Tx(DatabaseTransaction),
}

/// Borrowed executor: either the pool or the open transaction.
pub(crate) enum SeaOrmRunner<'a> {
    Conn(&'a DatabaseConnection),
    Tx(&'a DatabaseTransaction),
}

/// Session yielded by relational scopes.
pub struct RelationalSession {
    runner: Runner,
    tx_config: TxConfig,
}

impl std::fmt::Debug for RelationalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalSession")
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}

impl RelationalSession {
    pub(crate) fn runner(&self) -> SeaOrmRunner<'_> {
        match &self.runner {
            Runner::Conn(c) => SeaOrmRunner::Conn(c),
            Runner::Tx(t) => SeaOrmRunner::Tx(t),
        }
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        matches!(self.runner, Runner::Tx(_))
    }

    #[must_use]
    pub fn backend(&self) -> DbBackend {
        match &self.runner {
            Runner::Conn(c) => c.get_database_backend(),
            Runner::Tx(t) => t.get_database_backend(),
        }
    }

    /// Write scope on this session.
    ///
    /// Inside a transaction the closure joins it and the outer scope stays
    /// the unit of atomicity. Otherwise a transaction is opened, committed on
    /// `Ok` and rolled back on `Err`.
    ///
    /// # Errors
    /// Begin / commit failures or whatever `f` returns.
    pub async fn write<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut RelationalSession) -> ScopeFuture<'a, T, E> + Send,
    {
        let txn = match &self.runner {
            Runner::Tx(_) => {
                debug!("joining active transaction");
                return f(self).await;
            }
            Runner::Conn(conn) => begin(conn, &self.tx_config).await.map_err(E::from)?,
        };
        run_in_tx(txn, self.tx_config.clone(), f).await
    }
}

async fn begin(conn: &DatabaseConnection, config: &TxConfig) -> Result<DatabaseTransaction> {
    let (isolation, access_mode) = config.for_backend(conn.get_database_backend());
    debug!(?isolation, ?access_mode, "begin transaction");
    Ok(conn.begin_with_config(isolation, access_mode).await?)
}

/// Run `f` on a transactional session: commit on `Ok`, roll back on `Err`.
///
/// If the future is dropped, the transaction is dropped with it and rolls
/// back.
async fn run_in_tx<T, E, F>(txn: DatabaseTransaction, tx_config: TxConfig, f: F) -> std::result::Result<T, E>
where
    E: From<DbError>,
    F: for<'a> FnOnce(&'a mut RelationalSession) -> ScopeFuture<'a, T, E>,
{
    let mut session = RelationalSession {
        runner: Runner::Tx(txn),
        tx_config,
    };
    let res = with_tx_guard(f(&mut session)).await;

    let Runner::Tx(txn) = session.runner else {
        return res;
    };
    match res {
        Ok(v) => {
            txn.commit().await.map_err(DbError::from).map_err(E::from)?;
            debug!("transaction committed");
            Ok(v)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            } else {
                debug!("transaction rolled back");
            }
            Err(e)
        }
    }
}

/// Create parent directories for file-backed `SQLite` DSNs.
#[cfg(feature = "sqlite")]
fn prepare_sqlite_path(dsn: &str) -> Result<()> {
    let rest = dsn.trim_start().trim_start_matches("sqlite:");
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" || path.starts_with("file::memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
