//! Model-bound repositories.
//!
//! A [`Repository`] pairs one domain model with one [`BackendAdapter`]. It is
//! the only place that knows the identity codec and primary-key name, which
//! come from the adapter type. Every operation takes the session yielded by
//! the enclosing scope; the repository never opens scopes itself.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use storekit_query::{Error as QueryError, Fields, Filter, Operand, Page, QueryDescriptor, Value};
use tracing::{debug, warn};

use crate::adapter::{Backend, BackendAdapter};
use crate::events::{RecordEvents, TracingEvents};
use crate::identity::{IdInput, IdentityCodec};
use crate::{DbError, Result};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Materialize a domain model from a backend record.
pub trait FromRecord<R>: Sized {
    /// # Errors
    /// `DbError::Mapping` when the record cannot be represented.
    fn orm(record: R) -> Result<Self>;
}

/// What to do with write fields the model does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFieldPolicy {
    /// Drop them and log each at `warn`.
    #[default]
    Drop,
    /// Fail with `Validation(UnknownField)` before touching the backend.
    Reject,
}

pub struct Repository<M, A> {
    adapter: A,
    policy: UnknownFieldPolicy,
    events: Arc<dyn RecordEvents>,
    _model: PhantomData<fn() -> M>,
}

impl<M, A> std::fmt::Debug for Repository<M, A>
where
    A: BackendAdapter,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.adapter.entity_name())
            .field("backend", &A::BACKEND)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<M, A> Repository<M, A>
where
    A: BackendAdapter,
    M: FromRecord<A::Record> + Send,
{
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            policy: UnknownFieldPolicy::default(),
            events: Arc::new(TracingEvents),
            _model: PhantomData,
        }
    }

    #[must_use]
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn RecordEvents>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        A::BACKEND
    }

    /// Primary-key field name for this backend.
    #[must_use]
    pub fn primary_key(&self) -> &'static str {
        <A::Identity as IdentityCodec>::PK
    }

    fn id_value(id: &IdInput) -> Result<Value> {
        let native = <A::Identity as IdentityCodec>::parse(id)?;
        Ok(<A::Identity as IdentityCodec>::to_value(&native))
    }

    fn map(&self, record: A::Record) -> Result<M> {
        M::orm(record).map_err(|e| {
            if matches!(e, DbError::Mapping { .. }) {
                e
            } else {
                DbError::mapping(self.adapter.entity_name(), e)
            }
        })
    }

    fn ensure_declared<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.adapter.is_declared(name) {
                return Err(QueryError::UnknownField(name.to_owned()).into());
            }
        }
        Ok(())
    }

    /// Apply the unknown-field policy to a write payload.
    fn declared_only(&self, fields: Fields) -> Result<Fields> {
        let mut kept = Fields::new();
        for (name, value) in fields {
            if self.adapter.is_declared(&name) {
                kept.insert(name, value);
                continue;
            }
            match self.policy {
                UnknownFieldPolicy::Reject => {
                    return Err(QueryError::UnknownField(name).into());
                }
                UnknownFieldPolicy::Drop => {
                    warn!(entity = %self.adapter.entity_name(), field = %name, "dropping undeclared field");
                }
            }
        }
        Ok(kept)
    }

    fn stamp(&self, fields: &mut Fields, name: &str, now: DateTime<Utc>, overwrite: bool) {
        if !self.adapter.is_declared(name) {
            return;
        }
        if overwrite || !fields.contains_key(name) {
            fields.insert(name.to_owned(), Value::DateTime(now));
        }
    }

    /// # Errors
    /// `Validation` for a malformed id, `NotFound` when absent.
    pub async fn get(&self, session: &mut A::Session, id: impl Into<IdInput> + Send) -> Result<M> {
        let value = Self::id_value(&id.into())?;
        let record = self.adapter.get(session, self.primary_key(), value).await?;
        self.map(record)
    }

    /// Models for every id that exists; missing ids are omitted.
    ///
    /// # Errors
    /// `Validation` if any id is malformed.
    pub async fn get_list_by_ids(&self, session: &mut A::Session, ids: &[IdInput]) -> Result<Vec<M>> {
        let values = ids.iter().map(Self::id_value).collect::<Result<Vec<_>>>()?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let records = self
            .adapter
            .get_list(session, self.primary_key(), Operand::In(values))
            .await?;
        records.into_iter().map(|r| self.map(r)).collect()
    }

    /// # Errors
    /// `Validation` for undeclared fields, `NotFound` / `MultipleResults`
    /// unless exactly one record matches.
    pub async fn get_by_attributes(&self, session: &mut A::Session, filters: &[Filter]) -> Result<M> {
        self.ensure_declared(filters.iter().map(|f| f.field.as_str()))?;
        let record = self.adapter.get_by_attributes(session, filters).await?;
        self.map(record)
    }

    /// # Errors
    /// `Validation` for undeclared filter or sort fields.
    pub async fn get_paginated(&self, session: &mut A::Session, query: &QueryDescriptor) -> Result<Page<M>> {
        query.ensure_known_fields(|f| self.adapter.is_declared(f))?;
        let (records, total) = self.adapter.get_paginated(session, query).await?;
        debug!(
            entity = %self.adapter.entity_name(),
            returned = records.len(),
            total,
            "page fetched"
        );
        Page::new(records, total, query.pagination()).try_map(|r| self.map(r))
    }

    /// Persist `fields` and return the stored model.
    ///
    /// `created_at` / `updated_at` are stamped when declared and not supplied.
    ///
    /// # Errors
    /// `Validation` for undeclared fields under [`UnknownFieldPolicy::Reject`]
    /// or for values of the wrong kind.
    pub async fn create(&self, session: &mut A::Session, fields: Fields) -> Result<M> {
        let mut fields = self.declared_only(fields)?;
        let now = Utc::now();
        self.stamp(&mut fields, CREATED_AT, now, false);
        self.stamp(&mut fields, UPDATED_AT, now, false);

        let record = self.adapter.create(session, fields.clone()).await?;
        self.events.record_created(self.adapter.entity_name(), &fields);
        self.map(record)
    }

    /// Apply `changes` to the record with `id` and stamp `updated_at`.
    /// Returns the number of matched records (0 or 1).
    ///
    /// # Errors
    /// `Validation` for a malformed id or undeclared fields under
    /// [`UnknownFieldPolicy::Reject`].
    pub async fn update(
        &self,
        session: &mut A::Session,
        id: impl Into<IdInput> + Send,
        changes: Fields,
    ) -> Result<u64> {
        let value = Self::id_value(&id.into())?;
        let mut changes = self.declared_only(changes)?;
        self.stamp(&mut changes, UPDATED_AT, Utc::now(), true);
        self.adapter
            .update(session, self.primary_key(), value, changes)
            .await
    }

    /// Delete the record with `id`. Returns the number of deleted records.
    ///
    /// # Errors
    /// `Validation` for a malformed id.
    pub async fn delete(&self, session: &mut A::Session, id: impl Into<IdInput> + Send) -> Result<u64> {
        let value = Self::id_value(&id.into())?;
        self.adapter.delete(session, self.primary_key(), value).await
    }
}
