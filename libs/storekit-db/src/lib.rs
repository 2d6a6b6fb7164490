#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Polymorphic repository layer over a relational and a document store.
//!
//! A [`Repository`] binds one domain model to one [`BackendAdapter`]:
//! - [`relational::RelationalAdapter`] translates queries through `SeaORM`
//!   (`SQLite`, `PostgreSQL`, `MySQL` by feature)
//! - [`document::DocumentAdapter`] translates them into MongoDB filters
//!
//! Callers never touch connections directly. They open a read or write
//! scope on a [`Store`] ([`RelationalDb`] or [`DocumentDb`]) and pass the
//! yielded session to repository calls:
//!
//! ```rust,ignore
//! let repo = Arc::new(Repository::<Account, _>::new(accounts_adapter()));
//!
//! let created = db
//!     .write(move |s| Box::pin(async move { repo.create(s, fields).await }))
//!     .await?;
//! ```
//!
//! Write scopes commit on `Ok` and roll back on `Err`, returning the original
//! error. While a write scope is active, opening another top-level scope on
//! the same task fails with [`DbError::ScopeRequestedInsideTx`]; nested writes
//! must go through the session instead.
//!
//! # Features
//! - `pg`, `mysql`, `sqlite`: enable `SQLx` drivers behind `SeaORM`
//! - `integration`: container-backed tests

#![cfg_attr(
    not(any(feature = "pg", feature = "mysql", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

pub mod adapter;
pub mod config;
pub mod document;
pub mod events;
pub mod identity;
pub mod relational;
pub mod repository;
pub mod schema;
pub mod scope;
pub mod tx_config;

mod guard;
mod pool_opts;

pub use adapter::{Backend, BackendAdapter};
pub use config::{
    DocumentConfig, PoolCfg, RelationalConfig, StoreConfig, expand_env_vars,
    redact_credentials_in_dsn,
};
pub use document::{DocumentAdapter, DocumentDb, DocumentSession};
pub use events::{RecordEvents, TracingEvents};
pub use identity::{IdInput, IdentityCodec, IntegerId, ObjectIdIdentity};
pub use relational::{DbEngine, FieldKind, FieldMap, RelationalAdapter, RelationalDb, RelationalSession};
pub use repository::{FromRecord, Repository, UnknownFieldPolicy};
pub use scope::{ScopeFuture, Store};
pub use tx_config::{TxAccessMode, TxConfig, TxIsolationLevel};

pub use storekit_query as query;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Infrastructure failure reported by a backend driver.
#[derive(Debug, Error)]
pub enum BackendFailure {
    #[error(transparent)]
    Relational(#[from] sea_orm::DbErr),

    #[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
    #[error(transparent)]
    Sqlx(#[from] sea_orm::sqlx::Error),

    #[error(transparent)]
    Document(#[from] mongodb::error::Error),
}

/// Typed error for stores, adapters and repositories.
#[derive(Debug, Error)]
pub enum DbError {
    /// Malformed query input, unknown field or malformed identity.
    #[error("validation failed: {0}")]
    Validation(#[from] storekit_query::Error),

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("expected a single {entity}, found {count} or more")]
    MultipleResults { entity: String, count: usize },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] BackendFailure),

    #[error("cannot map {entity} record: {message}")]
    Mapping { entity: String, message: String },

    #[error("store scope requested inside an active write scope")]
    ScopeRequestedInsideTx,

    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    #[must_use]
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    #[must_use]
    pub fn mapping(entity: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Mapping {
            entity: entity.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sea_orm::DbErr> for DbError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::BackendUnavailable(e.into())
    }
}

#[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
impl From<sea_orm::sqlx::Error> for DbError {
    fn from(e: sea_orm::sqlx::Error) -> Self {
        Self::BackendUnavailable(e.into())
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::BackendUnavailable(e.into())
    }
}
