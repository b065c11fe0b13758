//! Entity module - Contains the SeaORM entity definitions backing the record store.
//! `records` holds the current document per key; `record_revisions` holds the write log.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod record;
pub mod record_revision;

// Re-export specific types to avoid conflicts
pub use record::{Column as RecordColumn, Entity as Record, Model as RecordModel};
pub use record_revision::{
    Column as RecordRevisionColumn, Entity as RecordRevision, Model as RecordRevisionModel,
};
