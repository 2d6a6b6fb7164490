//! Transaction settings for relational write scopes.
//!
//! Document write scopes ignore these: MongoDB transactions run with the
//! client's default read and write concerns.

use sea_orm::{AccessMode, DbBackend, IsolationLevel};
use serde::{Deserialize, Serialize};

/// Isolation requested when a write scope begins.
///
/// `SQLite` is serializable regardless and never receives a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxIsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl TxIsolationLevel {
    fn sea(self) -> IsolationLevel {
        match self {
            Self::ReadUncommitted => IsolationLevel::ReadUncommitted,
            Self::ReadCommitted => IsolationLevel::ReadCommitted,
            Self::RepeatableRead => IsolationLevel::RepeatableRead,
            Self::Serializable => IsolationLevel::Serializable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxAccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

impl TxAccessMode {
    fn sea(self) -> AccessMode {
        match self {
            Self::ReadOnly => AccessMode::ReadOnly,
            Self::ReadWrite => AccessMode::ReadWrite,
        }
    }
}

/// The `transaction:` block of a relational store section.
///
/// A `None` field leaves the choice to the database server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TxConfig {
    #[serde(default)]
    pub isolation: Option<TxIsolationLevel>,
    #[serde(default)]
    pub access_mode: Option<TxAccessMode>,
}

impl TxConfig {
    #[must_use]
    pub fn with_isolation(isolation: TxIsolationLevel) -> Self {
        Self {
            isolation: Some(isolation),
            ..Self::default()
        }
    }

    /// What write scopes use when the section says nothing: `READ COMMITTED`.
    #[must_use]
    pub fn write_default() -> Self {
        Self::with_isolation(TxIsolationLevel::default())
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.access_mode = Some(TxAccessMode::ReadOnly);
        self
    }

    /// Settings actually sent to `backend` by `begin_with_config`.
    pub(crate) fn for_backend(
        &self,
        backend: DbBackend,
    ) -> (Option<IsolationLevel>, Option<AccessMode>) {
        if backend == DbBackend::Sqlite {
            // sqlx rejects SET TRANSACTION on SQLite.
            return (None, None);
        }
        (
            self.isolation.map(TxIsolationLevel::sea),
            self.access_mode.map(TxAccessMode::sea),
        )
    }
}
