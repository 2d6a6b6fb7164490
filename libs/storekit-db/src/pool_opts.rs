//! Pool settings application shared by every driver.

use crate::config::PoolCfg;

/// Apply [`PoolCfg`] to a driver-specific pool builder.
pub(crate) trait ApplyPoolOpts {
    fn apply(self, opts: &PoolCfg) -> Self;
}

#[cfg(any(feature = "pg", feature = "mysql", feature = "sqlite"))]
impl<DB: sea_orm::sqlx::Database> ApplyPoolOpts for sea_orm::sqlx::pool::PoolOptions<DB> {
    fn apply(mut self, opts: &PoolCfg) -> Self {
        if let Some(n) = opts.max_conns {
            self = self.max_connections(n);
        }
        if let Some(n) = opts.min_conns {
            self = self.min_connections(n);
        }
        if let Some(t) = opts.acquire_timeout {
            self = self.acquire_timeout(t);
        }
        if let Some(t) = opts.idle_timeout {
            self = self.idle_timeout(t);
        }
        if let Some(t) = opts.max_lifetime {
            self = self.max_lifetime(t);
        }
        if opts.test_before_acquire {
            self = self.test_before_acquire(true);
        }
        self
    }
}

/// The MongoDB driver has no lifetime cap or pre-acquire ping; those knobs
/// are ignored. `acquire_timeout` bounds server selection, which is where
/// the driver waits for a usable connection.
impl ApplyPoolOpts for mongodb::options::ClientOptions {
    fn apply(mut self, opts: &PoolCfg) -> Self {
        if let Some(n) = opts.max_conns {
            self.max_pool_size = Some(n);
        }
        if let Some(n) = opts.min_conns {
            self.min_pool_size = Some(n);
        }
        if let Some(t) = opts.acquire_timeout {
            self.server_selection_timeout = Some(t);
        }
        if let Some(t) = opts.idle_timeout {
            self.max_idle_time = Some(t);
        }
        self
    }
}
