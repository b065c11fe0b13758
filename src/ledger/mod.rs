//! Record store adapter.
//!
//! The ledger platform's keyed store is reached only through [`RecordStore`]. Keys are
//! typed ([`RecordKey`]) and mapped to the native key scheme here; documents are decoded into
//! the closed [`Document`] variant set; predicates are expressed as [`Selector`]s.
//! [`Invocation`] is the `SQLite`/`SeaORM` realisation with per-invocation atomicity.

pub mod document;
pub mod key;
pub mod selector;
pub mod store;

pub use document::Document;
pub use key::RecordKey;
pub use selector::Selector;
pub use store::{Invocation, QueryRecord, RecordStore, Revision};
