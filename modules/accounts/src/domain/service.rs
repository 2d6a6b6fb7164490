use std::sync::Arc;

use storekit_db::IdInput;
use storekit_db::query::{Page, QueryLimits, RawQuery};
use tracing::{debug, info};

use super::error::DomainError;
use super::model::{AccountPatch, AccountView, NewAccount, fields};
use super::repo::AccountsRepository;

pub struct ServiceConfig {
    pub max_fullname_length: usize,
    pub query_limits: QueryLimits,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_fullname_length: 100,
            query_limits: QueryLimits::default(),
        }
    }
}

pub struct AccountService {
    repo: Arc<dyn AccountsRepository>,
    config: ServiceConfig,
}

impl AccountService {
    #[must_use]
    pub fn new(repo: Arc<dyn AccountsRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// # Errors
    /// `Validation` for a blank or oversized name, `Storage` on backend failure.
    pub async fn create_account(&self, new: NewAccount) -> Result<AccountView, DomainError> {
        self.validate_fullname(&new.fullname)?;
        let account = self.repo.create(new.into_fields()).await?;
        info!(id = %account.id, "account created");
        Ok(account)
    }

    /// # Errors
    /// `AccountNotFound` when no account has `id`; `InvalidQuery` for a
    /// malformed id.
    pub async fn get_account(&self, id: &str) -> Result<AccountView, DomainError> {
        self.repo
            .get(IdInput::from(id))
            .await
            .map_err(|e| not_found_as(e, id))
    }

    /// # Errors
    /// `Validation` for an empty patch or an invalid name, `AccountNotFound`
    /// when nothing matched.
    pub async fn update_account(
        &self,
        id: &str,
        patch: AccountPatch,
    ) -> Result<AccountView, DomainError> {
        if patch.is_empty() {
            return Err(DomainError::validation("patch", "nothing to update"));
        }
        if let Some(ref name) = patch.fullname {
            self.validate_fullname(name)?;
        }

        let updated = self
            .repo
            .update(IdInput::from(id), patch.into_fields())
            .await
            .map_err(|e| not_found_as(e, id))?;
        updated.ok_or_else(|| DomainError::not_found(id))
    }

    /// # Errors
    /// `AccountNotFound` when nothing was deleted.
    pub async fn delete_account(&self, id: &str) -> Result<(), DomainError> {
        let deleted = self.repo.delete(IdInput::from(id)).await?;
        if deleted == 0 {
            return Err(DomainError::not_found(id));
        }
        debug!(id, deleted, "account deleted");
        Ok(())
    }

    /// # Errors
    /// `InvalidQuery` for malformed filters, sorting or pagination.
    pub async fn search_accounts(&self, raw: RawQuery) -> Result<Page<AccountView>, DomainError> {
        let query = raw
            .into_descriptor(&self.config.query_limits)
            .map_err(|e| DomainError::InvalidQuery(e.to_string()))?;
        Ok(self.repo.search(query).await?)
    }

    fn validate_fullname(&self, value: &str) -> Result<(), DomainError> {
        if value.trim().is_empty() {
            return Err(DomainError::validation(fields::FULLNAME, "must not be blank"));
        }
        if value.chars().count() > self.config.max_fullname_length {
            return Err(DomainError::validation(
                fields::FULLNAME,
                format!("exceeds maximum length of {}", self.config.max_fullname_length),
            ));
        }
        Ok(())
    }
}

fn not_found_as(e: storekit_db::DbError, id: &str) -> DomainError {
    if e.is_not_found() {
        DomainError::not_found(id)
    } else {
        e.into()
    }
}
