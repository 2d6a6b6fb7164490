//! Read / write session scopes.
//!
//! A scope acquires a session, hands it to the closure, and releases it on
//! every exit path. Write scopes additionally wrap the closure in a
//! transaction: `Ok` commits, `Err` rolls back and returns the original error.
//! Dropping a scope future mid-flight drops the session, which rolls back any
//! open transaction.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::DbError;

/// Boxed future returned by scope closures.
pub type ScopeFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A backend handle able to open sessions.
///
/// Closures receive `&mut Self::Session` and must not let it escape.
/// Infrastructure failures (acquire, begin, commit) are converted into the
/// closure's error type through `E: From<DbError>`, so services can return
/// their own domain errors.
#[async_trait]
pub trait Store: Send + Sync {
    type Session: Send;

    /// Run `f` on a non-transactional session.
    ///
    /// Relational read sessions hold the pool, not a connection: each
    /// statement checks one out, so an acquisition failure surfaces on the
    /// first statement and consecutive statements may run on different
    /// connections. Nothing gives repeatable reads across statements.
    ///
    /// # Errors
    /// Session acquisition failures, [`DbError::ScopeRequestedInsideTx`] when
    /// called inside a write scope, or whatever `f` returns.
    async fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static;

    /// Run `f` inside a transaction.
    ///
    /// # Errors
    /// Begin / commit failures, [`DbError::ScopeRequestedInsideTx`] when
    /// called inside another write scope, or whatever `f` returns (after
    /// rolling back).
    async fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut Self::Session) -> ScopeFuture<'a, T, E> + Send + 'static;
}
