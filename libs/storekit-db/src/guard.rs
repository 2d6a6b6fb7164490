//! Task-local write-scope marker.
//!
//! While a write scope runs its closure, `IN_TX` is `true` for the task.
//! Store handles consult it before opening a new top-level scope, so code
//! holding a store handle cannot step outside the active transaction.

use std::cell::Cell;
use std::future::Future;

use crate::DbError;

tokio::task_local! {
    static IN_TX: Cell<bool>;
}

/// Returns `true` if a write scope is active in the current task.
pub(crate) fn is_in_transaction() -> bool {
    IN_TX.try_with(Cell::get).unwrap_or(false)
}

/// Fail with `ScopeRequestedInsideTx` when a write scope is active.
pub(crate) fn ensure_top_level() -> Result<(), DbError> {
    if is_in_transaction() {
        tracing::warn!("store scope requested inside an active write scope");
        return Err(DbError::ScopeRequestedInsideTx);
    }
    Ok(())
}

/// Run `f` with the write-scope marker set.
pub(crate) async fn with_tx_guard<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    IN_TX.scope(Cell::new(true), f).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_is_scoped_to_the_future() {
        assert!(!is_in_transaction());
        let inside = with_tx_guard(async { is_in_transaction() }).await;
        assert!(inside);
        assert!(!is_in_transaction());
    }

    #[tokio::test]
    async fn test_ensure_top_level_inside_guard() {
        assert!(ensure_top_level().is_ok());
        let res = with_tx_guard(async { ensure_top_level() }).await;
        assert!(matches!(res, Err(DbError::ScopeRequestedInsideTx)));
    }

    #[tokio::test]
    async fn test_guard_does_not_leak_to_spawned_tasks() {
        let spawned = with_tx_guard(async { tokio::spawn(async { is_in_transaction() }).await })
            .await
            .unwrap();
        assert!(!spawned);
    }
}
