//! The record store contract and its `SeaORM` implementation.
//!
//! One [`Invocation`] is one logical unit of work: every write made through it becomes
//! visible on [`Invocation::commit`] or not at all. Reads record the version they observed;
//! a later write to the same key fails with [`Error::Conflict`] if that version moved.

use crate::{
    entities::{Record, RecordColumn, RecordRevision, RecordRevisionColumn, record, record_revision},
    errors::{Error, Result},
    ledger::{Document, RecordKey, Selector},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, DbErr, QueryOrder, Set, TransactionTrait, prelude::*,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

/// One row returned by a predicate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    /// Encoded key of the record
    pub key: String,
    /// Document JSON as stored
    pub body: String,
}

/// One entry of a key's revision log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Document JSON, `None` for a tombstone
    pub body: Option<String>,
    /// Transaction that wrote the revision
    pub tx_id: String,
    /// Transaction timestamp
    pub timestamp: DateTime<Utc>,
    /// Whether the revision deleted the key
    pub is_delete: bool,
}

/// Keyed document store with predicate queries and per-key revision history.
///
/// Implementations scope every call to one invocation with a unique transaction id.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Unique id of the current invocation.
    fn tx_id(&self) -> &str;

    /// Timestamp of the current invocation.
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Reads the document stored under `key`.
    async fn get(&self, key: &RecordKey) -> Result<Option<String>>;

    /// Writes `body` under `key`. The body must be a JSON object carrying `docType`.
    async fn put(&self, key: &RecordKey, body: String) -> Result<()>;

    /// Removes `key`, leaving a tombstone in its history.
    async fn delete(&self, key: &RecordKey) -> Result<()>;

    /// Returns every record matching `selector`, including this invocation's own writes.
    async fn query(&self, selector: &Selector) -> Result<Vec<QueryRecord>>;

    /// Returns every committed revision of `key`, oldest first.
    async fn history(&self, key: &RecordKey) -> Result<Vec<Revision>>;

    /// Reads and decodes the document stored under `key`.
    async fn get_document(&self, key: &RecordKey) -> Result<Option<Document>> {
        self.get(key)
            .await?
            .map(|body| Document::decode(&body))
            .transpose()
    }

    /// Encodes and writes `document` under `key`.
    async fn put_document(&self, key: &RecordKey, document: &Document) -> Result<()> {
        self.put(key, document.encode()?).await
    }

    /// Whether anything is stored under `key`.
    async fn exists(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// A record store invocation backed by a `SeaORM` database transaction.
///
/// Dropping an invocation without committing rolls every write back.
pub struct Invocation {
    txn: DatabaseTransaction,
    tx_id: String,
    timestamp: DateTime<Utc>,
    read_versions: Mutex<HashMap<String, i64>>,
}

impl Invocation {
    /// Starts a new invocation with a fresh transaction id.
    pub async fn begin(db: &DatabaseConnection) -> Result<Self> {
        let txn = db.begin().await?;
        let tx_id = Uuid::new_v4().simple().to_string();
        debug!(%tx_id, "Invocation started");
        Ok(Self {
            txn,
            tx_id,
            timestamp: Utc::now(),
            read_versions: Mutex::new(HashMap::new()),
        })
    }

    /// Commits every write made through this invocation.
    pub async fn commit(self) -> Result<()> {
        let tx_id = self.tx_id;
        self.txn.commit().await?;
        debug!(%tx_id, "Invocation committed");
        Ok(())
    }

    fn observe(&self, key: &str, version: i64) -> Result<()> {
        self.read_versions
            .lock()
            .map_err(|_| Error::Store(DbErr::Custom("read-set lock poisoned".to_string())))?
            .entry(key.to_string())
            .or_insert(version);
        Ok(())
    }

    fn record_write(&self, key: &str, version: i64) -> Result<()> {
        self.read_versions
            .lock()
            .map_err(|_| Error::Store(DbErr::Custom("read-set lock poisoned".to_string())))?
            .insert(key.to_string(), version);
        Ok(())
    }

    /// Fails if `key` was read earlier in this invocation at a different version.
    fn check_version(&self, key: &str, current: Option<i64>) -> Result<()> {
        let expected = self
            .read_versions
            .lock()
            .map_err(|_| Error::Store(DbErr::Custom("read-set lock poisoned".to_string())))?
            .get(key)
            .copied();
        match expected {
            Some(expected) if Some(expected) != current => Err(Error::Conflict {
                key: key.to_string(),
                expected,
                found: current.unwrap_or(0),
            }),
            _ => Ok(()),
        }
    }

    async fn current(&self, encoded: &str) -> Result<Option<record::Model>> {
        Record::find_by_id(encoded.to_string())
            .one(&self.txn)
            .await
            .map_err(Into::into)
    }

    /// Appends the revision for `key`, or replaces this invocation's earlier revision of it.
    async fn append_revision(
        &self,
        key: &str,
        version: i64,
        body: Option<String>,
    ) -> Result<()> {
        let is_delete = body.is_none();
        let earlier = RecordRevision::find()
            .filter(RecordRevisionColumn::Key.eq(key))
            .filter(RecordRevisionColumn::TxId.eq(self.tx_id.as_str()))
            .one(&self.txn)
            .await?;

        if let Some(earlier) = earlier {
            let mut revision: record_revision::ActiveModel = earlier.into();
            revision.version = Set(version);
            revision.body = Set(body);
            revision.is_delete = Set(is_delete);
            revision.update(&self.txn).await?;
        } else {
            let revision = record_revision::ActiveModel {
                key: Set(key.to_string()),
                version: Set(version),
                tx_id: Set(self.tx_id.clone()),
                body: Set(body),
                is_delete: Set(is_delete),
                timestamp: Set(self.timestamp),
                ..Default::default()
            };
            revision.insert(&self.txn).await?;
        }
        Ok(())
    }
}

/// Extracts the `docType` and `owner` projections from a document body.
fn project(body: &str) -> Result<(String, Option<String>)> {
    let value: Value = serde_json::from_str(body)?;
    let doc_type = value
        .get("docType")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Decode {
            message: "document has no docType discriminator".to_string(),
        })?
        .to_string();
    let owner = value
        .get("owner")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((doc_type, owner))
}

impl RecordStore for Invocation {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[instrument(skip(self), fields(tx_id = %self.tx_id))]
    async fn get(&self, key: &RecordKey) -> Result<Option<String>> {
        let encoded = key.encode();
        let Some(current) = self.current(&encoded).await? else {
            trace!("Key absent");
            return Ok(None);
        };
        self.observe(&encoded, current.version)?;
        Ok(Some(current.body))
    }

    #[instrument(skip(self, body), fields(tx_id = %self.tx_id))]
    async fn put(&self, key: &RecordKey, body: String) -> Result<()> {
        let (doc_type, owner) = project(&body)?;
        let encoded = key.encode();
        let current = self.current(&encoded).await?;
        self.check_version(&encoded, current.as_ref().map(|r| r.version))?;

        let version = match current {
            Some(existing) => {
                let version = existing.version + 1;
                let mut active: record::ActiveModel = existing.into();
                active.doc_type = Set(doc_type);
                active.owner = Set(owner);
                active.body = Set(body.clone());
                active.version = Set(version);
                active.tx_id = Set(self.tx_id.clone());
                active.updated_at = Set(self.timestamp);
                active.update(&self.txn).await?;
                version
            }
            None => {
                let active = record::ActiveModel {
                    key: Set(encoded.clone()),
                    doc_type: Set(doc_type),
                    owner: Set(owner),
                    body: Set(body.clone()),
                    version: Set(1),
                    tx_id: Set(self.tx_id.clone()),
                    updated_at: Set(self.timestamp),
                };
                active.insert(&self.txn).await?;
                1
            }
        };

        self.record_write(&encoded, version)?;
        self.append_revision(&encoded, version, Some(body)).await?;
        trace!(version, "Record written");
        Ok(())
    }

    #[instrument(skip(self), fields(tx_id = %self.tx_id))]
    async fn delete(&self, key: &RecordKey) -> Result<()> {
        let encoded = key.encode();
        let current = self
            .current(&encoded)
            .await?
            .ok_or_else(|| Error::NotFound {
                id: key.to_string(),
                doc_type: "record".to_string(),
            })?;
        self.check_version(&encoded, Some(current.version))?;

        let version = current.version + 1;
        current.delete(&self.txn).await?;
        self.record_write(&encoded, version)?;
        self.append_revision(&encoded, version, None).await
    }

    #[instrument(skip(self, selector), fields(tx_id = %self.tx_id, selector = %selector))]
    async fn query(&self, selector: &Selector) -> Result<Vec<QueryRecord>> {
        let mut finder = Record::find();
        if let Some(doc_type) = selector.doc_type() {
            finder = finder.filter(RecordColumn::DocType.eq(doc_type.as_str()));
        }
        if let Some(owner) = selector.owner() {
            finder = finder.filter(RecordColumn::Owner.eq(owner));
        }
        let rows = finder
            .order_by_asc(RecordColumn::Key)
            .all(&self.txn)
            .await?;

        let mut matched = Vec::new();
        for row in rows {
            let value: Value = serde_json::from_str(&row.body)?;
            if selector.matches_fields(&value) {
                self.observe(&row.key, row.version)?;
                matched.push(QueryRecord {
                    key: row.key,
                    body: row.body,
                });
            }
        }
        debug!(matches = matched.len(), "Query evaluated");
        Ok(matched)
    }

    #[instrument(skip(self), fields(tx_id = %self.tx_id))]
    async fn history(&self, key: &RecordKey) -> Result<Vec<Revision>> {
        let revisions = RecordRevision::find()
            .filter(RecordRevisionColumn::Key.eq(key.encode()))
            .order_by_asc(RecordRevisionColumn::Id)
            .all(&self.txn)
            .await?;

        Ok(revisions
            .into_iter()
            .map(|revision| Revision {
                body: revision.body,
                tx_id: revision.tx_id,
                timestamp: revision.timestamp,
                is_delete: revision.is_delete,
            })
            .collect())
    }
}
