//! Batch creation and unit generation.
//!
//! One batch submission fans out into `cartonQnty × cartonCapacity` units with hierarchical
//! ids `<manufacturer>_<batch>_C<carton>_P<packet>`. The units and the manufacturer's
//! incremented batch counter are written in the same invocation.

use crate::{
    core::catalog::get_active_product,
    core::identity::Capability,
    core::registry::Profile,
    core::validation::{validate_batch_dates, validate_batch_size},
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore},
    models::{Batch, DocType, Unit, UnitStatus},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A manufacturer's batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Product id within the caller's catalog
    pub product_id: String,
    /// Unix timestamp of manufacture
    pub manufacturing_date: i64,
    /// Unix timestamp of expiry
    pub expiry_date: i64,
    /// Number of cartons produced
    pub carton_qnty: u32,
}

/// Carton id for `carton` (1-based) of `batch_id`.
#[must_use]
pub fn carton_id(batch_id: &str, carton: u32) -> String {
    format!("{batch_id}_C{carton}")
}

/// Unit id for `packet` (1-based) of a carton.
#[must_use]
pub fn unit_id(manufacturer_id: &str, carton_id: &str, packet: u32) -> String {
    format!("{manufacturer_id}_{carton_id}_P{packet}")
}

/// Synthesizes every unit of `batch`, carton by carton, in packet order.
pub fn generate_units(batch: &Batch, carton_capacity: u32) -> impl Iterator<Item = Unit> + '_ {
    (1..=batch.carton_qnty).flat_map(move |carton| {
        let carton = carton_id(&batch.id, carton);
        (1..=carton_capacity).map(move |packet| Unit {
            id: unit_id(&batch.owner, &carton, packet),
            batch_id: batch.id.clone(),
            carton_id: carton.clone(),
            owner: batch.owner.clone(),
            status: UnitStatus::ReadyForDistribution,
            product_id: batch.product_id.clone(),
            manufacturer_id: batch.owner.clone(),
            manufacturing_date: batch.manufacturing_date,
            expiry_date: batch.expiry_date,
            doc_type: DocType::Asset,
        })
    })
}

/// Creates a batch for the calling manufacturer and generates its units.
///
/// The batch id is `B` followed by the manufacturer's batch counter before the increment.
///
/// # Errors
/// [`Error::PermissionDenied`] for non-manufacturers, [`Error::Validation`] for bad dates
/// or a batch larger than [`crate::core::validation::MAX_UNITS_PER_BATCH`] units,
/// [`Error::NotFound`] / [`Error::NotActive`] for a missing or withdrawn product.
pub async fn create_batch<S: RecordStore>(
    store: &S,
    caller: &Profile,
    request: BatchRequest,
) -> Result<Batch> {
    Capability::CreateBatch.authorize(caller.role)?;
    validate_batch_dates(
        &request.product_id,
        request.manufacturing_date,
        request.expiry_date,
    )?;
    let product = get_active_product(store, &request.product_id, caller.id()).await?;
    validate_batch_size(request.carton_qnty, product.carton_capacity)?;

    let mut manufacturer = caller.party.clone();
    let batch = Batch {
        id: format!("B{}", manufacturer.batch_count),
        owner: manufacturer.id.clone(),
        product_id: product.id,
        manufacturing_date: request.manufacturing_date,
        expiry_date: request.expiry_date,
        carton_qnty: request.carton_qnty,
        doc_type: DocType::Batch,
    };
    let batch_key = RecordKey::batch(&batch.owner, &batch.id);
    if store.exists(&batch_key).await? {
        return Err(Error::AlreadyExists {
            id: batch.id,
            doc_type: DocType::Batch.to_string(),
        });
    }
    store
        .put_document(&batch_key, &Document::Batch(batch.clone()))
        .await?;

    let mut generated = 0_u64;
    for unit in generate_units(&batch, product.carton_capacity) {
        store
            .put_document(&RecordKey::unit(&unit.id), &Document::Unit(unit))
            .await?;
        generated += 1;
    }
    debug!(batch = %batch.id, generated, "Units generated");

    manufacturer.batch_count += 1;
    store
        .put_document(
            &RecordKey::party(&manufacturer.id, manufacturer.doc_type),
            &Document::Party(manufacturer),
        )
        .await?;

    info!(
        batch = %batch.id,
        manufacturer = %batch.owner,
        product = %batch.product_id,
        units = generated,
        "Batch created"
    );
    Ok(batch)
}
