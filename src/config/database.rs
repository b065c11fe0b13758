//! Database configuration module for the ledger's record store.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent and safe to run on
//! every start.

use crate::entities::{Record, RecordRevision, RecordRevisionColumn};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to record store at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the `records` and `record_revisions` tables, plus the key index used by
/// history replay, if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut record_table = schema.create_table_from_entity(Record);
    record_table.if_not_exists();
    let mut revision_table = schema.create_table_from_entity(RecordRevision);
    revision_table.if_not_exists();
    let revision_key_index = Index::create()
        .if_not_exists()
        .name("idx_record_revisions_key")
        .table(RecordRevision)
        .col(RecordRevisionColumn::Key)
        .to_owned();

    db.execute(builder.build(&record_table)).await?;
    db.execute(builder.build(&revision_table)).await?;
    db.execute(builder.build(&revision_key_index)).await?;

    info!("Record store tables ensured");
    Ok(())
}
