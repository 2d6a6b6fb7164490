use std::collections::BTreeSet;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use mongodb::{ClientSession, SessionCursor};
use storekit_query::{
    DEFAULT_SORT_FIELD, Error as QueryError, Fields, Filter, Operand, QueryDescriptor, SortDir,
    Value,
};
use tracing::debug;

use super::DocumentSession;
use crate::adapter::{Backend, BackendAdapter};
use crate::identity::{IdentityCodec, ObjectIdIdentity};
use crate::{DbError, Result};

/// Scalar to BSON, without field-specific rules.
#[must_use]
pub fn to_bson(v: &Value) -> Bson {
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::DateTime(dt) => Bson::DateTime(bson::DateTime::from_chrono(*dt)),
    }
}

/// Scalar to BSON for `field`. Strings for `_id` are parsed as `ObjectId`.
///
/// # Errors
/// `InvalidIdentity` for an `_id` string that is not 24 hex characters.
pub fn coerce(field: &str, v: &Value) -> std::result::Result<Bson, QueryError> {
    match v {
        Value::String(s) if field == ObjectIdIdentity::PK => ObjectId::parse_str(s)
            .map(Bson::ObjectId)
            .map_err(|_| QueryError::InvalidIdentity(s.clone())),
        _ => Ok(to_bson(v)),
    }
}

fn predicate(f: &Filter) -> std::result::Result<Document, QueryError> {
    let rhs = match &f.operand {
        Operand::Eq(v) => coerce(&f.field, v)?,
        Operand::In(vs) => {
            let items = vs
                .iter()
                .map(|v| coerce(&f.field, v))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Bson::Document(doc! { "$in": items })
        }
    };
    let mut d = Document::new();
    d.insert(f.field.clone(), rhs);
    Ok(d)
}

/// Filter conjunction as a MongoDB query document.
///
/// `{field: v}` for equality, `{field: {$in: [...]}}` for membership, and
/// `$and` when there is more than one filter so repeated fields are kept.
///
/// # Errors
/// `InvalidIdentity` for malformed `_id` values.
pub fn build_filter(filters: &[Filter]) -> std::result::Result<Document, QueryError> {
    let mut parts = filters
        .iter()
        .map(predicate)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(match parts.len() {
        0 => Document::new(),
        1 => parts.pop().unwrap_or_default(),
        _ => doc! { "$and": parts },
    })
}

/// Sort document for `query`. The implicit `created_at` key is skipped when
/// `is_declared` rejects it.
#[must_use]
pub fn build_sort(query: &QueryDescriptor, is_declared: impl Fn(&str) -> bool) -> Document {
    let implicit = query.sorting().is_empty();
    let mut sort = Document::new();
    for key in query.effective_sorting().iter() {
        if implicit && key.field == DEFAULT_SORT_FIELD && !is_declared(&key.field) {
            continue;
        }
        let dir = match key.dir {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        };
        sort.insert(key.field.clone(), dir);
    }
    sort
}

async fn collect(mut cursor: SessionCursor<Document>, session: &mut ClientSession) -> Result<Vec<Document>> {
    let mut out = Vec::new();
    while let Some(doc) = cursor.next(session).await {
        out.push(doc?);
    }
    Ok(out)
}

/// MongoDB adapter for one collection.
///
/// `_id` is always declared. Writes keep only declared fields.
#[derive(Clone, Debug)]
pub struct DocumentAdapter {
    collection: String,
    fields: BTreeSet<String>,
}

impl DocumentAdapter {
    pub fn new<I, S>(collection: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        fields.insert(ObjectIdIdentity::PK.to_owned());
        Self {
            collection: collection.into(),
            fields,
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn check_fields<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.fields.contains(name) {
                return Err(QueryError::UnknownField(name.to_owned()).into());
            }
        }
        Ok(())
    }

    fn filter_for(&self, filters: &[Filter]) -> Result<Document> {
        self.check_fields(filters.iter().map(|f| f.field.as_str()))?;
        Ok(build_filter(filters)?)
    }

    /// Declared fields of `fields` as a document. `_id` is dropped unless
    /// `keep_id`.
    fn declared_doc(&self, fields: &Fields, keep_id: bool) -> Result<Document> {
        let mut d = Document::new();
        for (name, v) in fields {
            if !self.fields.contains(name) || (!keep_id && name == ObjectIdIdentity::PK) {
                debug!(collection = %self.collection, field = %name, "skipping field");
                continue;
            }
            d.insert(name.clone(), coerce(name, v)?);
        }
        Ok(d)
    }

    fn single(&self, mut docs: Vec<Document>) -> Result<Document> {
        match docs.len() {
            0 => Err(DbError::not_found(&self.collection)),
            1 => docs.pop().ok_or_else(|| DbError::not_found(&self.collection)),
            count => Err(DbError::MultipleResults {
                entity: self.collection.clone(),
                count,
            }),
        }
    }

    async fn find_unique(&self, session: &mut DocumentSession, filter: Document) -> Result<Document> {
        let (db, s) = session.parts();
        let cursor = db
            .collection::<Document>(&self.collection)
            .find(filter)
            .limit(2)
            .session(&mut *s)
            .await?;
        let docs = collect(cursor, s).await?;
        self.single(docs)
    }
}

#[async_trait]
impl BackendAdapter for DocumentAdapter {
    type Session = DocumentSession;
    type Record = Document;
    type Identity = ObjectIdIdentity;

    const BACKEND: Backend = Backend::Document;

    fn entity_name(&self) -> &str {
        &self.collection
    }

    fn is_declared(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    async fn get(&self, session: &mut DocumentSession, field: &str, value: Value) -> Result<Document> {
        let filter = self.filter_for(&[Filter::eq(field, value)])?;
        debug!(collection = %self.collection, ?filter, "get");
        self.find_unique(session, filter).await
    }

    async fn get_by_attributes(&self, session: &mut DocumentSession, filters: &[Filter]) -> Result<Document> {
        let filter = self.filter_for(filters)?;
        debug!(collection = %self.collection, ?filter, "get_by_attributes");
        self.find_unique(session, filter).await
    }

    async fn get_list(
        &self,
        session: &mut DocumentSession,
        field: &str,
        operand: Operand,
    ) -> Result<Vec<Document>> {
        let filter = self.filter_for(&[Filter {
            field: field.to_owned(),
            operand,
        }])?;
        debug!(collection = %self.collection, ?filter, "get_list");
        let (db, s) = session.parts();
        let cursor = db
            .collection::<Document>(&self.collection)
            .find(filter)
            .session(&mut *s)
            .await?;
        collect(cursor, s).await
    }

    async fn count(&self, session: &mut DocumentSession, filters: &[Filter]) -> Result<u64> {
        let filter = self.filter_for(filters)?;
        let (db, s) = session.parts();
        Ok(db
            .collection::<Document>(&self.collection)
            .count_documents(filter)
            .session(&mut *s)
            .await?)
    }

    async fn find_page(
        &self,
        session: &mut DocumentSession,
        query: &QueryDescriptor,
    ) -> Result<Vec<Document>> {
        let filter = self.filter_for(query.filters())?;
        self.check_fields(query.sorting().iter().map(|k| k.field.as_str()))?;
        let sort = build_sort(query, |f| self.fields.contains(f));
        let page = query.pagination();
        debug!(
            collection = %self.collection,
            ?filter,
            ?sort,
            limit = page.limit(),
            offset = page.offset(),
            "find_page"
        );

        let (db, s) = session.parts();
        let cursor = db
            .collection::<Document>(&self.collection)
            .find(filter)
            .sort(sort)
            .skip(page.offset())
            .limit(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .session(&mut *s)
            .await?;
        collect(cursor, s).await
    }

    async fn create(&self, session: &mut DocumentSession, fields: Fields) -> Result<Document> {
        let doc = self.declared_doc(&fields, true)?;
        debug!(collection = %self.collection, "create");
        let inserted_id = {
            let (db, s) = session.parts();
            db.collection::<Document>(&self.collection)
                .insert_one(doc)
                .session(&mut *s)
                .await?
                .inserted_id
        };
        self.find_unique(session, doc! { "_id": inserted_id }).await
    }

    async fn update(
        &self,
        session: &mut DocumentSession,
        field: &str,
        value: Value,
        changes: Fields,
    ) -> Result<u64> {
        let filter = self.filter_for(&[Filter::eq(field, value)])?;
        let set = self.declared_doc(&changes, false)?;
        debug!(collection = %self.collection, ?filter, columns = set.len(), "update");

        let (db, s) = session.parts();
        let coll = db.collection::<Document>(&self.collection);
        if set.is_empty() {
            return Ok(coll.count_documents(filter).session(&mut *s).await?);
        }
        let res = coll
            .update_many(filter, doc! { "$set": set })
            .session(&mut *s)
            .await?;
        Ok(res.matched_count)
    }

    async fn delete(&self, session: &mut DocumentSession, field: &str, value: Value) -> Result<u64> {
        let filter = self.filter_for(&[Filter::eq(field, value)])?;
        debug!(collection = %self.collection, ?filter, "delete");
        let (db, s) = session.parts();
        let res = db
            .collection::<Document>(&self.collection)
            .delete_many(filter)
            .session(&mut *s)
            .await?;
        Ok(res.deleted_count)
    }
}
