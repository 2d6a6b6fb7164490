//! Wiring: configuration in, ready-to-use [`AccountService`] out.

use std::sync::Arc;

use storekit_db::schema::{create_table_for, ensure_created_at_index};
use storekit_db::{DbError, DocumentDb, RelationalDb, Repository, StoreConfig, UnknownFieldPolicy};
use tracing::info;

use crate::domain::repo::AccountsRepository;
use crate::domain::service::{AccountService, ServiceConfig};
use crate::infra::storage::{COLLECTION, StoreAccounts, document_adapter, entity, relational_adapter};

/// Which configured store backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Relational,
    Document,
}

/// Connect the selected store, ensure its schema and build the service.
///
/// Undeclared write fields are rejected rather than dropped: the service
/// only ever sends fields it owns.
///
/// # Errors
/// `InvalidConfig` when the selected section is missing, otherwise any
/// connection or schema failure.
pub async fn build_service(
    config: &StoreConfig,
    kind: StoreKind,
    service_config: ServiceConfig,
) -> Result<AccountService, DbError> {
    let repo: Arc<dyn AccountsRepository> = match kind {
        StoreKind::Relational => {
            let cfg = config
                .relational
                .as_ref()
                .ok_or_else(|| DbError::InvalidConfig("missing store.relational section".into()))?;
            let db = RelationalDb::connect(cfg).await?;
            create_table_for(&db, entity::Entity).await?;
            info!(engine = %db.engine(), "accounts using relational store");
            let repo = Repository::new(relational_adapter())
                .with_unknown_fields(UnknownFieldPolicy::Reject);
            Arc::new(StoreAccounts::new(db, repo))
        }
        StoreKind::Document => {
            let cfg = config
                .document
                .as_ref()
                .ok_or_else(|| DbError::InvalidConfig("missing store.document section".into()))?;
            let db = DocumentDb::connect(cfg).await?;
            ensure_created_at_index(&db, COLLECTION).await?;
            info!(database = %cfg.database, "accounts using document store");
            let repo = Repository::new(document_adapter())
                .with_unknown_fields(UnknownFieldPolicy::Reject);
            Arc::new(StoreAccounts::new(db, repo))
        }
    };
    Ok(AccountService::new(repo, service_config))
}
