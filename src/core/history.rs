//! Custody history of a unit, replayed from the store's revision log.

use crate::{
    errors::{Error, Result},
    ledger::{RecordKey, RecordStore},
    models::{DocType, HistoryEntry, Unit},
};
use serde_json::Value;
use tracing::{debug, instrument};

/// Replays every revision of `unit_id`, oldest first.
///
/// Tombstones appear as entries with no owner or status. A key with no revisions yields an
/// empty trail. Reading the trail never writes anything.
///
/// Only the first live revision must be a unit. Later revisions are reported with whatever
/// `id`, `owner` and `status` fields their body carries.
///
/// # Errors
/// [`Error::NotAnAsset`] if the first live revision under the key is not a unit document.
#[instrument(skip(store))]
pub async fn track_unit<S: RecordStore>(store: &S, unit_id: &str) -> Result<Vec<HistoryEntry>> {
    let revisions = store.history(&RecordKey::unit(unit_id)).await?;

    let mut first_live_checked = false;
    let mut trail = Vec::with_capacity(revisions.len());
    for revision in revisions {
        let entry = match (revision.is_delete, revision.body) {
            (false, Some(body)) => {
                let value: Value = serde_json::from_str(&body)?;
                if !first_live_checked {
                    if value.get("docType").and_then(Value::as_str) != Some(DocType::Asset.as_str())
                    {
                        return Err(Error::NotAnAsset {
                            key: unit_id.to_string(),
                        });
                    }
                    first_live_checked = true;
                }
                match serde_json::from_value::<Unit>(value.clone()) {
                    Ok(unit) => HistoryEntry {
                        id: unit.id,
                        owner: Some(unit.owner),
                        status: Some(unit.status),
                        tx_id: revision.tx_id,
                        timestamp: revision.timestamp,
                        is_delete: false,
                    },
                    Err(_) => HistoryEntry {
                        id: value
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or(unit_id)
                            .to_string(),
                        owner: value.get("owner").and_then(Value::as_str).map(str::to_string),
                        status: value
                            .get("status")
                            .and_then(|status| serde_json::from_value(status.clone()).ok()),
                        tx_id: revision.tx_id,
                        timestamp: revision.timestamp,
                        is_delete: false,
                    },
                }
            }
            _ => HistoryEntry {
                id: unit_id.to_string(),
                owner: None,
                status: None,
                tx_id: revision.tx_id,
                timestamp: revision.timestamp,
                is_delete: true,
            },
        };
        trail.push(entry);
    }

    debug!(revisions = trail.len(), "History replayed");
    Ok(trail)
}
