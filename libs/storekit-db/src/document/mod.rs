//! Document backend over the MongoDB driver.
//!
//! Read scopes get a causally consistent client session without a
//! transaction. Write scopes start a transaction on the session, which
//! requires a replica set or sharded deployment.

mod adapter;

pub use adapter::{DocumentAdapter, build_filter, build_sort, coerce, to_bson};

use async_trait::async_trait;
use mongodb::options::ClientOptions;
use mongodb::{Client, ClientSession, Database};
use tracing::{debug, info, warn};

use crate::config::{DocumentConfig, redact_credentials_in_dsn};
use crate::guard::{ensure_top_level, with_tx_guard};
use crate::pool_opts::ApplyPoolOpts;
use crate::scope::{ScopeFuture, Store};
use crate::{DbError, Result};

/// MongoDB client bound to one database. Cheap to clone.
#[derive(Clone, Debug)]
pub struct DocumentDb {
    client: Client,
    database: Database,
}

impl DocumentDb {
    /// Build a client from `cfg`.
    ///
    /// The driver connects lazily; unreachable servers surface on first use
    /// as `BackendUnavailable`.
    ///
    /// # Errors
    /// Configuration errors from [`DocumentConfig::resolve_uri`] or
    /// `BackendUnavailable` when the URI is rejected by the driver.
    pub async fn connect(cfg: &DocumentConfig) -> Result<Self> {
        if cfg.database.trim().is_empty() {
            return Err(DbError::InvalidConfig("document database name is empty".to_owned()));
        }
        let uri = cfg.resolve_uri()?;
        info!(
            uri = %redact_credentials_in_dsn(Some(&uri)),
            database = %cfg.database,
            "connecting document store"
        );
        let options = ClientOptions::parse(&uri).await?.apply(&cfg.pool);
        let client = Client::with_options(options)?;
        Ok(Self::from_client(client, &cfg.database))
    }

    #[must_use]
    pub fn from_client(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self { client, database }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    async fn session(&self) -> Result<DocumentSession> {
        let inner = self.client.start_session().await?;
        Ok(DocumentSession {
            inner,
            database: self.database.clone(),
            in_transaction: false,
        })
    }
}

#[async_trait]
impl Store for DocumentDb {
    type Session = DocumentSession;

    async fn read<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static,
    {
        ensure_top_level().map_err(E::from)?;
        debug!(database = %self.database.name(), "read scope");
        let mut session = self.session().await.map_err(E::from)?;
        f(&mut session).await
    }

    async fn write<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static,
    {
        ensure_top_level().map_err(E::from)?;
        let mut session = self.session().await.map_err(E::from)?;
        session.write(f).await
    }
}

/// Session yielded by document scopes.
pub struct DocumentSession {
    inner: ClientSession,
    database: Database,
    in_transaction: bool,
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("database", &self.database.name())
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl DocumentSession {
    pub(crate) fn parts(&mut self) -> (&Database, &mut ClientSession) {
        (&self.database, &mut self.inner)
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Write scope on this session.
    ///
    /// Joins the active transaction if there is one. Otherwise starts a
    /// transaction, commits on `Ok` and aborts on `Err`. Dropping the session
    /// mid-flight aborts as well.
    ///
    /// # Errors
    /// Start / commit failures or whatever `f` returns.
    pub async fn write<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut DocumentSession) -> ScopeFuture<'a, T, E> + Send,
    {
        if self.in_transaction {
            debug!("joining active transaction");
            return f(self).await;
        }

        self.inner
            .start_transaction()
            .await
            .map_err(DbError::from)
            .map_err(E::from)?;
        self.in_transaction = true;
        debug!(database = %self.database.name(), "transaction started");

        let res = with_tx_guard(f(self)).await;
        self.in_transaction = false;

        match res {
            Ok(v) => {
                self.inner
                    .commit_transaction()
                    .await
                    .map_err(DbError::from)
                    .map_err(E::from)?;
                debug!("transaction committed");
                Ok(v)
            }
            Err(e) => {
                if let Err(abort_err) = self.inner.abort_transaction().await {
                    warn!(error = %abort_err, "transaction abort failed");
                } else {
                    debug!("transaction aborted");
                }
                Err(e)
            }
        }
    }
}
