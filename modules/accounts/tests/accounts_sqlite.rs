#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "sqlite")]

use accounts::{
    AccountPatch, AccountService, AccountStatus, DomainError, NewAccount, ServiceConfig,
    StoreKind, build_service,
};
use storekit_db::query::RawQuery;
use storekit_db::{RelationalConfig, StoreConfig};

async fn service() -> AccountService {
    let config = StoreConfig {
        relational: Some(RelationalConfig::sqlite_memory()),
        document: None,
    };
    build_service(&config, StoreKind::Relational, ServiceConfig::default())
        .await
        .expect("build service")
}

fn new_account(name: &str, status: AccountStatus) -> NewAccount {
    NewAccount {
        fullname: name.to_owned(),
        status,
    }
}

#[tokio::test]
async fn account_lifecycle() {
    let service = service().await;

    let created = service
        .create_account(new_account("Alice", AccountStatus::Pending))
        .await
        .unwrap();
    assert_eq!(created.id, "1");
    assert_eq!(created.created_at, created.updated_at);

    let updated = service
        .update_account(
            &created.id,
            AccountPatch {
                status: Some(AccountStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AccountStatus::Active);
    assert_eq!(updated.fullname, "Alice");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    service.delete_account(&created.id).await.unwrap();
    let err = service.get_account(&created.id).await.unwrap_err();
    assert!(matches!(err, DomainError::AccountNotFound { .. }));
}

#[tokio::test]
async fn malformed_id_is_invalid_query() {
    let service = service().await;
    let err = service.get_account("abc").await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidQuery(_)));
}

#[tokio::test]
async fn update_of_missing_account_is_not_found() {
    let service = service().await;
    let err = service
        .update_account(
            "99",
            AccountPatch {
                fullname: Some("Nobody".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::AccountNotFound { ref id } if id == "99"));
}

#[tokio::test]
async fn search_filters_sorts_and_pages() {
    let service = service().await;
    for (name, status) in [
        ("Carol", AccountStatus::Active),
        ("Alice", AccountStatus::Active),
        ("Bob", AccountStatus::Suspended),
        ("Dave", AccountStatus::Pending),
    ] {
        service
            .create_account(new_account(name, status))
            .await
            .unwrap();
    }

    let raw = RawQuery::from_json(
        r#"{
            "filters": [{"field": "status", "value": ["active", "pending"]}],
            "sorting": [{"field": "fullname", "type": "desc"}],
            "pagination": {"limit": 2}
        }"#,
    )
    .unwrap();
    let page = service.search_accounts(raw).await.unwrap();
    let names: Vec<_> = page.items.iter().map(|a| a.fullname.as_str()).collect();
    assert_eq!(names, ["Dave", "Carol"]);
    assert_eq!(page.total, 3);
    assert!(page.has_more());

    let raw = RawQuery::from_json(r#"{"sorting": [{"field": "nickname"}]}"#).unwrap();
    let err = service.search_accounts(raw).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidQuery(_)));
}
