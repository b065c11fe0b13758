//! Record revision entity - The append-only write log behind history replay.
//!
//! Every committed write or delete of a key appends one revision. A tombstone has no body
//! and `is_delete` set. Revisions are never updated once their invocation commits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Record revision database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "record_revisions")]
pub struct Model {
    /// Monotonic revision id, gives the replay order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Encoded record key this revision belongs to
    pub key: String,
    /// Record version after this revision
    pub version: i64,
    /// Transaction that wrote the revision
    pub tx_id: String,
    /// Document JSON, `None` for a tombstone
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    /// Whether this revision deleted the key
    pub is_delete: bool,
    /// Transaction timestamp
    pub timestamp: DateTimeUtc,
}

/// `RecordRevision` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
