use std::sync::Arc;

use async_trait::async_trait;
use storekit_db::query::{Fields, Page, QueryDescriptor};
use storekit_db::{BackendAdapter, FromRecord, IdInput, Repository, Store};

use crate::domain::model::AccountView;
use crate::domain::repo::AccountsRepository;

/// [`AccountsRepository`] over any store / adapter pair.
///
/// Each port call opens exactly one scope on `store`.
pub struct StoreAccounts<S, A> {
    store: S,
    repo: Arc<Repository<AccountView, A>>,
}

impl<S, A> StoreAccounts<S, A>
where
    S: Store<Session = A::Session> + 'static,
    A: BackendAdapter + 'static,
    AccountView: FromRecord<A::Record>,
{
    #[must_use]
    pub fn new(store: S, repo: Repository<AccountView, A>) -> Self {
        Self {
            store,
            repo: Arc::new(repo),
        }
    }
}

#[async_trait]
impl<S, A> AccountsRepository for StoreAccounts<S, A>
where
    S: Store<Session = A::Session> + 'static,
    A: BackendAdapter + 'static,
    AccountView: FromRecord<A::Record>,
{
    async fn create(&self, fields: Fields) -> storekit_db::Result<AccountView> {
        let repo = Arc::clone(&self.repo);
        self.store
            .write(move |s| Box::pin(async move { repo.create(s, fields).await }))
            .await
    }

    async fn get(&self, id: IdInput) -> storekit_db::Result<AccountView> {
        let repo = Arc::clone(&self.repo);
        self.store
            .read(move |s| Box::pin(async move { repo.get(s, id).await }))
            .await
    }

    async fn update(
        &self,
        id: IdInput,
        fields: Fields,
    ) -> storekit_db::Result<Option<AccountView>> {
        let repo = Arc::clone(&self.repo);
        self.store
            .write(move |s| {
                Box::pin(async move {
                    if repo.update(s, id.clone(), fields).await? == 0 {
                        return Ok(None);
                    }
                    repo.get(s, id).await.map(Some)
                })
            })
            .await
    }

    async fn delete(&self, id: IdInput) -> storekit_db::Result<u64> {
        let repo = Arc::clone(&self.repo);
        self.store
            .write(move |s| Box::pin(async move { repo.delete(s, id).await }))
            .await
    }

    async fn search(&self, query: QueryDescriptor) -> storekit_db::Result<Page<AccountView>> {
        let repo = Arc::clone(&self.repo);
        self.store
            .read(move |s| Box::pin(async move { repo.get_paginated(s, &query).await }))
            .await
    }
}
