//! Record-to-domain mapping for both storage layouts.

use bson::Document;
use storekit_db::{
    DbError, DocumentAdapter, FieldKind, FieldMap, FromRecord, RelationalAdapter,
};

use super::entity;
use crate::domain::model::{AccountStatus, AccountView, fields};

pub const COLLECTION: &str = "accounts";
const ENTITY: &str = "account";

fn status(raw: &str) -> Result<AccountStatus, DbError> {
    raw.parse().map_err(|e| DbError::mapping(ENTITY, e))
}

impl FromRecord<entity::Model> for AccountView {
    fn orm(m: entity::Model) -> Result<Self, DbError> {
        Ok(Self {
            id: m.id.to_string(),
            status: status(&m.status)?,
            fullname: m.fullname,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

impl FromRecord<Document> for AccountView {
    fn orm(doc: Document) -> Result<Self, DbError> {
        let err = |e: bson::document::ValueAccessError| DbError::mapping(ENTITY, e);
        Ok(Self {
            id: doc.get_object_id("_id").map_err(err)?.to_hex(),
            fullname: doc.get_str(fields::FULLNAME).map_err(err)?.to_owned(),
            status: status(doc.get_str(fields::STATUS).map_err(err)?)?,
            created_at: doc.get_datetime(fields::CREATED_AT).map_err(err)?.to_chrono(),
            updated_at: doc.get_datetime(fields::UPDATED_AT).map_err(err)?.to_chrono(),
        })
    }
}

#[must_use]
pub fn relational_adapter() -> RelationalAdapter<entity::Entity> {
    RelationalAdapter::new(
        ENTITY,
        FieldMap::new()
            .insert("id", entity::Column::Id, FieldKind::I64)
            .insert(fields::FULLNAME, entity::Column::Fullname, FieldKind::String)
            .insert(fields::STATUS, entity::Column::Status, FieldKind::String)
            .insert(fields::CREATED_AT, entity::Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert(fields::UPDATED_AT, entity::Column::UpdatedAt, FieldKind::DateTimeUtc),
    )
}

#[must_use]
pub fn document_adapter() -> DocumentAdapter {
    DocumentAdapter::new(
        COLLECTION,
        [
            fields::FULLNAME,
            fields::STATUS,
            fields::CREATED_AT,
            fields::UPDATED_AT,
        ],
    )
}
