//! Schema bootstrap helpers.

use bson::doc;
use mongodb::IndexModel;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};
use tracing::info;

use crate::Result;
use crate::document::DocumentDb;
use crate::relational::RelationalDb;

/// Create the table for `entity` if it does not exist.
///
/// # Errors
/// `BackendUnavailable` if the statement fails.
pub async fn create_table_for<E>(db: &RelationalDb, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let table = entity.table_name().to_owned();
    let conn = db.connection();
    let backend = conn.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    info!(%table, "table ensured");
    Ok(())
}

/// Ascending `created_at` index backing the default sort order.
///
/// # Errors
/// `BackendUnavailable` if index creation fails.
pub async fn ensure_created_at_index(db: &DocumentDb, collection: &str) -> Result<()> {
    let index = IndexModel::builder().keys(doc! { "created_at": 1 }).build();
    db.database()
        .collection::<bson::Document>(collection)
        .create_index(index)
        .await?;
    info!(collection, "created_at index ensured");
    Ok(())
}
