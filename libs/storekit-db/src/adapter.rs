//! Backend adapter seam.
//!
//! One trait, two implementations ([`RelationalAdapter`] and
//! [`DocumentAdapter`]). A [`Repository`] is generic over it, so backend
//! family, identity codec and primary-key name are fixed at compile time.
//!
//! [`RelationalAdapter`]: crate::relational::RelationalAdapter
//! [`DocumentAdapter`]: crate::document::DocumentAdapter
//! [`Repository`]: crate::repository::Repository

use std::fmt;

use async_trait::async_trait;
use storekit_query::{Fields, Filter, Operand, QueryDescriptor, Value};

use crate::Result;
use crate::identity::IdentityCodec;

/// Storage technology family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Relational,
    Document,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Relational => f.write_str("relational"),
            Backend::Document => f.write_str("document"),
        }
    }
}

/// Translates backend-agnostic operations into native queries.
///
/// Field names reaching an adapter are expected to be declared; the
/// repository validates them first. Adapters still reject unknown names
/// with `Validation` rather than ignoring them.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    type Session: Send;
    type Record: Send;
    type Identity: IdentityCodec;

    const BACKEND: Backend;

    /// Entity name used in errors and logs.
    fn entity_name(&self) -> &str;

    /// Whether `field` is part of the model's declared schema.
    fn is_declared(&self, field: &str) -> bool;

    /// Single record where `field == value`.
    ///
    /// # Errors
    /// `NotFound` on zero matches, `MultipleResults` on more than one.
    async fn get(&self, session: &mut Self::Session, field: &str, value: Value)
    -> Result<Self::Record>;

    /// Single record matching every filter.
    ///
    /// # Errors
    /// Same as [`BackendAdapter::get`].
    async fn get_by_attributes(
        &self,
        session: &mut Self::Session,
        filters: &[Filter],
    ) -> Result<Self::Record>;

    /// All records where `field` matches `operand`. Unbounded.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn get_list(
        &self,
        session: &mut Self::Session,
        field: &str,
        operand: Operand,
    ) -> Result<Vec<Self::Record>>;

    /// Number of records matching every filter, ignoring any window.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn count(&self, session: &mut Self::Session, filters: &[Filter]) -> Result<u64>;

    /// The ordered, windowed fetch of `query`.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn find_page(
        &self,
        session: &mut Self::Session,
        query: &QueryDescriptor,
    ) -> Result<Vec<Self::Record>>;

    /// One page plus the total match count: [`count`] then [`find_page`].
    ///
    /// The two reads are not atomic. A write committed between them can make
    /// `total` disagree with the fetched window.
    ///
    /// [`count`]: BackendAdapter::count
    /// [`find_page`]: BackendAdapter::find_page
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn get_paginated(
        &self,
        session: &mut Self::Session,
        query: &QueryDescriptor,
    ) -> Result<(Vec<Self::Record>, u64)> {
        let total = self.count(session, query.filters()).await?;
        let records = self.find_page(session, query).await?;
        Ok((records, total))
    }

    /// Persist declared fields and return the stored record.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn create(&self, session: &mut Self::Session, fields: Fields) -> Result<Self::Record>;

    /// Apply `changes` to every record where `field == value`. Returns the
    /// number of matched records.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn update(
        &self,
        session: &mut Self::Session,
        field: &str,
        value: Value,
        changes: Fields,
    ) -> Result<u64>;

    /// Delete every record where `field == value`. Zero matches is not an
    /// error.
    ///
    /// # Errors
    /// `Validation` or `BackendUnavailable`.
    async fn delete(&self, session: &mut Self::Session, field: &str, value: Value) -> Result<u64>;
}
