#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use storekit_db::query::{Fields, Value};
use storekit_db::{DbError, FieldKind, FieldMap, FromRecord, RelationalAdapter};

pub mod note {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "notes")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub title: String,
        pub status: Option<String>,
        pub priority: i64,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub status: Option<String>,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRecord<note::Model> for Note {
    fn orm(m: note::Model) -> Result<Self, DbError> {
        Ok(Self {
            id: m.id,
            title: m.title,
            status: m.status,
            priority: m.priority,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

#[must_use]
pub fn note_adapter() -> RelationalAdapter<note::Entity> {
    RelationalAdapter::new(
        "note",
        FieldMap::new()
            .insert("id", note::Column::Id, FieldKind::I64)
            .insert("title", note::Column::Title, FieldKind::String)
            .insert("status", note::Column::Status, FieldKind::String)
            .insert("priority", note::Column::Priority, FieldKind::I64)
            .insert("created_at", note::Column::CreatedAt, FieldKind::DateTimeUtc)
            .insert("updated_at", note::Column::UpdatedAt, FieldKind::DateTimeUtc),
    )
}

/// Build a field map from `(name, value)` pairs.
#[must_use]
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

/// Fixed base instant plus `secs` seconds.
#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}
