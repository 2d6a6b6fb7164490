#[cfg(test)]
mod tests {
    use super::super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};
    use storekit_db::query::{Fields, Page, Pagination, QueryDescriptor, RawQuery, Value};
    use storekit_db::{DbError, IdInput};

    use error::DomainError;
    use model::{AccountPatch, AccountStatus, AccountView, NewAccount};

    // In-memory repository keyed by the decimal id.
    #[derive(Default)]
    struct MockRepository {
        rows: Mutex<Vec<AccountView>>,
        searched: Mutex<Option<QueryDescriptor>>,
    }

    fn apply(view: &mut AccountView, fields: &Fields) {
        if let Some(Value::String(name)) = fields.get("fullname") {
            view.fullname.clone_from(name);
        }
        if let Some(Value::String(status)) = fields.get("status") {
            view.status = status.parse().unwrap();
        }
    }

    #[async_trait]
    impl repo::AccountsRepository for MockRepository {
        async fn create(&self, fields: Fields) -> storekit_db::Result<AccountView> {
            let mut rows = self.rows.lock().unwrap();
            let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let mut view = AccountView {
                id: (rows.len() + 1).to_string(),
                fullname: String::new(),
                status: AccountStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            apply(&mut view, &fields);
            rows.push(view.clone());
            Ok(view)
        }

        async fn get(&self, id: IdInput) -> storekit_db::Result<AccountView> {
            let id = id.to_string();
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id == id)
                .cloned()
                .ok_or_else(|| DbError::not_found("account"))
        }

        async fn update(
            &self,
            id: IdInput,
            fields: Fields,
        ) -> storekit_db::Result<Option<AccountView>> {
            let id = id.to_string();
            let mut rows = self.rows.lock().unwrap();
            Ok(rows.iter_mut().find(|v| v.id == id).map(|v| {
                apply(v, &fields);
                v.clone()
            }))
        }

        async fn delete(&self, id: IdInput) -> storekit_db::Result<u64> {
            let id = id.to_string();
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|v| v.id != id);
            Ok(u64::try_from(before - rows.len()).unwrap())
        }

        async fn search(&self, query: QueryDescriptor) -> storekit_db::Result<Page<AccountView>> {
            let rows = self.rows.lock().unwrap().clone();
            let total = u64::try_from(rows.len()).unwrap();
            let pagination: Pagination = query.pagination();
            *self.searched.lock().unwrap() = Some(query);
            Ok(Page::new(rows, total, pagination))
        }
    }

    fn service_with(repo: Arc<MockRepository>) -> service::AccountService {
        service::AccountService::new(repo, service::ServiceConfig::default())
    }

    fn alice() -> NewAccount {
        NewAccount {
            fullname: "Alice Liddell".to_owned(),
            status: AccountStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_account() {
        let service = service_with(Arc::new(MockRepository::default()));

        let created = service.create_account(alice()).await.unwrap();
        assert_eq!(created.fullname, "Alice Liddell");
        assert_eq!(created.status, AccountStatus::Active);

        let fetched = service.get_account(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let service = service_with(Arc::new(MockRepository::default()));
        let err = service
            .create_account(NewAccount {
                fullname: "   ".to_owned(),
                status: AccountStatus::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "fullname"));
    }

    #[tokio::test]
    async fn test_create_rejects_long_name() {
        let repo = Arc::new(MockRepository::default());
        let service = service::AccountService::new(
            repo,
            service::ServiceConfig {
                max_fullname_length: 5,
                ..Default::default()
            },
        );
        let err = service.create_account(alice()).await.unwrap_err();
        match err {
            DomainError::Validation { field, message } => {
                assert_eq!(field, "fullname");
                assert!(message.contains("maximum length of 5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_missing_account_is_not_found() {
        let service = service_with(Arc::new(MockRepository::default()));
        let err = service.get_account("42").await.unwrap_err();
        assert!(matches!(err, DomainError::AccountNotFound { ref id } if id == "42"));
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let service = service_with(Arc::new(MockRepository::default()));
        let created = service.create_account(alice()).await.unwrap();

        let updated = service
            .update_account(
                &created.id,
                AccountPatch {
                    status: Some(AccountStatus::Suspended),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Suspended);
        assert_eq!(updated.fullname, created.fullname);
    }

    #[tokio::test]
    async fn test_update_empty_patch_and_missing_account() {
        let service = service_with(Arc::new(MockRepository::default()));

        let err = service
            .update_account("1", AccountPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        let err = service
            .update_account(
                "7",
                AccountPatch {
                    fullname: Some("Bob".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let service = service_with(Arc::new(MockRepository::default()));
        let created = service.create_account(alice()).await.unwrap();

        service.delete_account(&created.id).await.unwrap();
        let err = service.delete_account(&created.id).await.unwrap_err();
        assert!(matches!(err, DomainError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_validates_raw_query() {
        let repo = Arc::new(MockRepository::default());
        let service = service_with(Arc::clone(&repo));

        let raw = RawQuery::from_json(
            r#"{"pagination": {"limit": 10, "page": 2}}"#,
        )
        .unwrap();
        let err = service.search_accounts(raw).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuery(_)));

        let raw = RawQuery::from_json(
            r#"{"filters": [{"field": "status", "value": ["active", "pending"]}],
                "sorting": [{"field": "fullname", "type": "desc"}],
                "pagination": {"page": 2, "size": 5}}"#,
        )
        .unwrap();
        let page = service.search_accounts(raw).await.unwrap();
        assert_eq!(page.limit, 5);
        assert_eq!(page.offset, 5);

        let seen = repo.searched.lock().unwrap().clone().unwrap();
        assert_eq!(seen.filters().len(), 1);
        assert_eq!(seen.sorting()[0].field, "fullname");
    }

    #[test]
    fn test_storage_validation_maps_to_invalid_query() {
        let err: DomainError =
            DbError::Validation(storekit_db::query::Error::InvalidIdentity("x".to_owned())).into();
        assert!(matches!(err, DomainError::InvalidQuery(_)));
        let err: DomainError = DbError::not_found("account").into();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
