//! Record entity - The current state of every document in the ledger.
//!
//! One row per live key. The `body` column holds the document's native JSON encoding;
//! `doc_type` and `owner` are projections of the body kept in their own columns so that
//! document-type and owner predicates can be answered by SQL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Encoded record key (composite or flat)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Document-type discriminator (e.g. `"ASSET"`, `"MANUFACTURER"`)
    pub doc_type: String,
    /// Owner projection, `None` for documents without an owner
    pub owner: Option<String>,
    /// Document JSON as written
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Starts at 1 and increases by one on every write
    pub version: i64,
    /// Transaction that produced this version
    pub tx_id: String,
    /// When this version was written
    pub updated_at: DateTimeUtc,
}

/// Revisions are matched by key value and outlive a deleted record.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
