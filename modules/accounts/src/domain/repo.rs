use async_trait::async_trait;
use storekit_db::IdInput;
use storekit_db::query::{Fields, Page, QueryDescriptor};

use crate::domain::model::AccountView;

/// Persistence port for accounts.
///
/// Each call runs in its own store scope. `update` and `delete` return the
/// number of affected records; zero means the id did not match.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    async fn create(&self, fields: Fields) -> storekit_db::Result<AccountView>;

    async fn get(&self, id: IdInput) -> storekit_db::Result<AccountView>;

    /// Apply `fields` and re-read the record in the same write scope.
    async fn update(&self, id: IdInput, fields: Fields) -> storekit_db::Result<Option<AccountView>>;

    async fn delete(&self, id: IdInput) -> storekit_db::Result<u64>;

    async fn search(&self, query: QueryDescriptor) -> storekit_db::Result<Page<AccountView>>;
}
