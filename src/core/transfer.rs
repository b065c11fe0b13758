//! Ownership transfer pipeline.
//!
//! Every transfer moves the units matched by an equality predicate one step along
//! `ReadyForDistribution -> ReceivedAtDistributor -> ChemistInventoryReceived -> SoldToCustomer`,
//! hands them to the counterparty, issues a receipt and produces an audit notification.
//! The whole transfer runs inside the caller's invocation, so it commits or fails as a unit.

use crate::{
    core::catalog::get_active_product,
    core::events::{AuditEvent, AuditNotification},
    core::identity::Capability,
    core::receipt::{ReceiptTerms, issue_receipt},
    core::registry::{Profile, get_active_party},
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore, Selector},
    models::{DocType, Receipt, Unit, UnitStatus},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// The three custody transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStep {
    /// Manufacturer ships a whole carton to a distributor
    ToDistributor,
    /// Distributor ships one unit to a chemist
    ToChemist,
    /// Chemist sells one unit to a customer
    ToCustomer,
}

impl TransferStep {
    /// Capability the supplier needs.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::ToDistributor => Capability::ShipToDistributor,
            Self::ToChemist => Capability::ShipToChemist,
            Self::ToCustomer => Capability::SellToCustomer,
        }
    }

    /// Status the units must be in before the transfer.
    #[must_use]
    pub const fn from_status(self) -> UnitStatus {
        match self {
            Self::ToDistributor => UnitStatus::ReadyForDistribution,
            Self::ToChemist => UnitStatus::ReceivedAtDistributor,
            Self::ToCustomer => UnitStatus::ChemistInventoryReceived,
        }
    }

    /// Status the units are in after the transfer.
    #[must_use]
    pub const fn to_status(self) -> UnitStatus {
        match self {
            Self::ToDistributor => UnitStatus::ReceivedAtDistributor,
            Self::ToChemist => UnitStatus::ChemistInventoryReceived,
            Self::ToCustomer => UnitStatus::SoldToCustomer,
        }
    }

    /// Role tag the counterparty must be registered under. Customers are not registered.
    #[must_use]
    pub const fn counterparty(self) -> Option<DocType> {
        match self {
            Self::ToDistributor => Some(DocType::Distributor),
            Self::ToChemist => Some(DocType::Chemist),
            Self::ToCustomer => None,
        }
    }

    /// Unit field the bundle id is matched against.
    #[must_use]
    pub const fn bundle_field(self) -> &'static str {
        match self {
            Self::ToDistributor => "cartonId",
            Self::ToChemist | Self::ToCustomer => "id",
        }
    }

    /// Name of the audit event the transfer emits.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::ToDistributor => "Distributor Shipment Alert",
            Self::ToChemist => "Chemist Shipment Alert",
            Self::ToCustomer => "Customer Selling Alert",
        }
    }
}

/// Manufacturer to distributor shipment of one carton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributorShipment {
    /// Receiving distributor
    pub customer_id: String,
    /// Carton to ship
    pub carton_id: String,
    /// Unix timestamp of the shipment
    pub transaction_date: i64,
    /// Agreed price per unit
    pub per_unit_selling_price: u32,
}

/// Distributor to chemist shipment of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemistShipment {
    /// Receiving chemist
    pub customer_id: String,
    /// Unit to ship
    pub packet_id: String,
    /// Unix timestamp of the shipment
    pub transaction_date: i64,
    /// Agreed price per unit
    pub per_unit_selling_price: u32,
}

/// Chemist to customer sale of one unit, always at catalog price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSale {
    /// Buying customer
    pub customer_id: String,
    /// Unit sold
    pub packet_id: String,
    /// Unix timestamp of the sale
    pub transaction_date: i64,
}

/// Everything a successful transfer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Receipt written for the transfer
    pub receipt: Receipt,
    /// Audit notification to publish once the invocation commits
    pub notification: AuditNotification,
    /// The transferred units as written
    pub units: Vec<Unit>,
}

struct TransferOrder<'a> {
    step: TransferStep,
    customer_id: &'a str,
    bundle_id: &'a str,
    transaction_date: i64,
    unit_price: Option<u32>,
}

/// Ships a carton from the calling manufacturer to a distributor.
///
/// # Errors
/// See [`TransferStep`]: the counterparty must be an active distributor and the caller must
/// hold at least one unit of the carton in `ReadyForDistribution`.
pub async fn ship_to_distributor<S: RecordStore>(
    store: &S,
    caller: &Profile,
    shipment: DistributorShipment,
) -> Result<TransferOutcome> {
    execute(
        store,
        caller,
        TransferOrder {
            step: TransferStep::ToDistributor,
            customer_id: &shipment.customer_id,
            bundle_id: &shipment.carton_id,
            transaction_date: shipment.transaction_date,
            unit_price: Some(shipment.per_unit_selling_price),
        },
    )
    .await
}

/// Ships a unit from the calling distributor to a chemist.
///
/// # Errors
/// The counterparty must be an active chemist and the caller must hold the unit in
/// `ReceivedAtDistributor`.
pub async fn ship_to_chemist<S: RecordStore>(
    store: &S,
    caller: &Profile,
    shipment: ChemistShipment,
) -> Result<TransferOutcome> {
    execute(
        store,
        caller,
        TransferOrder {
            step: TransferStep::ToChemist,
            customer_id: &shipment.customer_id,
            bundle_id: &shipment.packet_id,
            transaction_date: shipment.transaction_date,
            unit_price: Some(shipment.per_unit_selling_price),
        },
    )
    .await
}

/// Sells a unit held by the calling chemist to a customer at catalog price.
///
/// # Errors
/// The caller must hold the unit in `ChemistInventoryReceived`.
pub async fn sell_to_customer<S: RecordStore>(
    store: &S,
    caller: &Profile,
    sale: CustomerSale,
) -> Result<TransferOutcome> {
    execute(
        store,
        caller,
        TransferOrder {
            step: TransferStep::ToCustomer,
            customer_id: &sale.customer_id,
            bundle_id: &sale.packet_id,
            transaction_date: sale.transaction_date,
            unit_price: None,
        },
    )
    .await
}

/// Bill for `units` transferred units at `price` with packaging multiplier `packet_capacity`.
///
/// Only the carton shipment is billed per unit moved; single-unit steps bill one unit.
///
/// # Errors
/// [`Error::Validation`] if the amount overflows.
pub fn bill_amount(step: TransferStep, price: u32, packet_capacity: u32, units: u64) -> Result<u64> {
    let per_unit = u64::from(price).checked_mul(u64::from(packet_capacity));
    let bill = match step {
        TransferStep::ToDistributor => per_unit.and_then(|amount| amount.checked_mul(units)),
        TransferStep::ToChemist | TransferStep::ToCustomer => per_unit,
    };
    bill.ok_or_else(|| Error::Validation {
        fields: vec!["billAmount".to_string()],
    })
}

#[instrument(
    skip(store, caller, order),
    fields(step = ?order.step, supplier = %caller.id(), bundle = %order.bundle_id)
)]
async fn execute<S: RecordStore>(
    store: &S,
    caller: &Profile,
    order: TransferOrder<'_>,
) -> Result<TransferOutcome> {
    let step = order.step;
    step.capability().authorize(caller.role)?;
    if !RecordKey::is_valid_attribute(order.customer_id) {
        return Err(Error::Validation {
            fields: vec!["customerId".to_string()],
        });
    }
    if let Some(role_tag) = step.counterparty() {
        get_active_party(store, order.customer_id, role_tag).await?;
    }

    let selector = Selector::of_type(DocType::Asset)
        .owned_by(caller.id())
        .with_field(step.bundle_field(), order.bundle_id)
        .with_field("status", step.from_status().as_str());
    let matched = store.query(&selector).await?;

    let mut units = Vec::with_capacity(matched.len());
    let mut moved = 0_u64;
    for row in matched {
        let mut unit = Document::decode(&row.body)?.into_unit()?;
        unit.owner = order.customer_id.to_string();
        unit.status = step.to_status();
        store
            .put_document(&RecordKey::decode(&row.key)?, &Document::Unit(unit.clone()))
            .await?;
        units.push(unit);
        moved += 1;
    }
    let Some(first) = units.first() else {
        return Err(Error::NoMatchingUnits {
            selector: selector.to_string(),
        });
    };
    debug!(moved, "Units transferred");

    let product = get_active_product(store, &first.product_id, &first.manufacturer_id).await?;
    let price = order.unit_price.unwrap_or(product.price);
    let bill = bill_amount(step, price, product.packet_capacity, moved)?;

    let receipt = issue_receipt(
        store,
        ReceiptTerms {
            bundle_id: order.bundle_id.to_string(),
            supplier_id: caller.id().to_string(),
            customer_id: order.customer_id.to_string(),
            product_id: product.id.clone(),
            transaction_date: order.transaction_date,
            bill_amount: bill,
        },
    )
    .await?;

    let notification = AuditNotification {
        name: step.event_name().to_string(),
        event: AuditEvent {
            supplier_id: caller.id().to_string(),
            customer_id: order.customer_id.to_string(),
            transaction_date: order.transaction_date,
            per_unit_selling_price: price,
            manufacturer_id: product.owner,
            product_id: product.id,
            total_parcel_units: moved,
            total_bill: bill,
        },
    };

    info!(
        customer = %order.customer_id,
        units = moved,
        bill,
        receipt = %receipt.id,
        "Transfer completed"
    );
    Ok(TransferOutcome {
        receipt,
        notification,
        units,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::history::track_unit;
    use crate::core::registry::get_profile;
    use crate::ledger::Invocation;
    use crate::test_utils::*;

    fn carton_to(distributor: &str, carton: &str) -> DistributorShipment {
        DistributorShipment {
            customer_id: distributor.to_string(),
            carton_id: carton.to_string(),
            transaction_date: 1_700_000_000,
            per_unit_selling_price: 7,
        }
    }

    fn packet_to(chemist: &str, packet: &str) -> ChemistShipment {
        ChemistShipment {
            customer_id: chemist.to_string(),
            packet_id: packet.to_string(),
            transaction_date: 1_700_000_100,
            per_unit_selling_price: 9,
        }
    }

    #[test]
    fn test_step_table_is_linear() {
        for step in [
            TransferStep::ToDistributor,
            TransferStep::ToChemist,
            TransferStep::ToCustomer,
        ] {
            assert_eq!(step.from_status().next(), Some(step.to_status()));
        }
    }

    #[test]
    fn test_bill_amount_formulas() {
        assert_eq!(bill_amount(TransferStep::ToDistributor, 7, 3, 2).unwrap(), 42);
        assert_eq!(bill_amount(TransferStep::ToChemist, 9, 3, 1).unwrap(), 27);
        assert_eq!(bill_amount(TransferStep::ToCustomer, 5, 3, 1).unwrap(), 15);

        let overflow = bill_amount(TransferStep::ToDistributor, u32::MAX, u32::MAX, 4);
        assert!(matches!(overflow.unwrap_err(), Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_carton_shipment_moves_every_unit() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 2).await?;

        let outcome =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C1")).await?;

        assert_eq!(outcome.units.len(), 2);
        assert!(outcome.units.iter().all(|unit| unit.owner == "D1"
            && unit.status == UnitStatus::ReceivedAtDistributor
            && unit.carton_id == "B0_C1"));

        assert_eq!(outcome.receipt.id, invocation.tx_id());
        assert_eq!(outcome.receipt.bundle_id, "B0_C1");
        assert_eq!(
            outcome.receipt.bill_amount,
            u64::from(7 * TEST_PACKET_CAPACITY * 2)
        );

        assert_eq!(outcome.notification.name, "Distributor Shipment Alert");
        assert_eq!(outcome.notification.event.total_parcel_units, 2);
        assert_eq!(outcome.notification.event.manufacturer_id, "M1");

        // The other carton stays with the manufacturer
        let remaining = invocation
            .query(&Selector::of_type(DocType::Asset).owned_by("M1"))
            .await?;
        assert_eq!(remaining.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_custody_chain() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C1")).await?;
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        let shipped =
            ship_to_chemist(&invocation, &chain.distributor, packet_to("C1", "M1_B0_C1_P2"))
                .await?;
        assert_eq!(shipped.units.len(), 1);
        assert_eq!(
            shipped.receipt.bill_amount,
            u64::from(9 * TEST_PACKET_CAPACITY)
        );
        assert_eq!(shipped.notification.name, "Chemist Shipment Alert");
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        let sold = sell_to_customer(
            &invocation,
            &chain.chemist,
            CustomerSale {
                customer_id: "walk-in".to_string(),
                packet_id: "M1_B0_C1_P2".to_string(),
                transaction_date: 1_700_000_200,
            },
        )
        .await?;
        assert_eq!(sold.units[0].status, UnitStatus::SoldToCustomer);
        assert_eq!(sold.units[0].owner, "walk-in");
        assert_eq!(
            sold.receipt.bill_amount,
            u64::from(TEST_PRICE * TEST_PACKET_CAPACITY)
        );
        assert_eq!(sold.notification.event.per_unit_selling_price, TEST_PRICE);
        assert_eq!(sold.notification.name, "Customer Selling Alert");
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        let trail = track_unit(&invocation, "M1_B0_C1_P2").await?;
        let statuses: Vec<UnitStatus> = trail.iter().filter_map(|entry| entry.status).collect();
        assert_eq!(statuses, UnitStatus::SEQUENCE);
        Ok(())
    }

    #[tokio::test]
    async fn test_counterparty_must_be_active_with_expected_role() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;

        let unknown =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D9", "B0_C1")).await;
        assert!(matches!(unknown.unwrap_err(), Error::NotFound { .. }));

        // A chemist is not registered under the distributor role tag
        let wrong_role =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("C1", "B0_C1")).await;
        assert!(matches!(wrong_role.unwrap_err(), Error::NotFound { .. }));

        suspend(&invocation, "D1", DocType::Distributor).await?;
        let suspended =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C1")).await;
        assert!(matches!(suspended.unwrap_err(), Error::NotActive { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_matched_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;

        let wrong_carton =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C7")).await;
        assert!(matches!(
            wrong_carton.unwrap_err(),
            Error::NoMatchingUnits { .. }
        ));

        ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C1")).await?;
        let twice =
            ship_to_distributor(&invocation, &chain.manufacturer, carton_to("D1", "B0_C1")).await;
        assert!(matches!(twice.unwrap_err(), Error::NoMatchingUnits { .. }));

        // The distributor holds the unit but cannot skip the chemist
        let skipped = sell_to_customer(
            &invocation,
            &chain.distributor,
            CustomerSale {
                customer_id: "walk-in".to_string(),
                packet_id: "M1_B0_C1_P1".to_string(),
                transaction_date: 0,
            },
        )
        .await;
        assert!(matches!(skipped.unwrap_err(), Error::PermissionDenied { .. }));

        // The chemist does not hold the unit yet
        let not_held = sell_to_customer(
            &invocation,
            &chain.chemist,
            CustomerSale {
                customer_id: "walk-in".to_string(),
                packet_id: "M1_B0_C1_P1".to_string(),
                transaction_date: 0,
            },
        )
        .await;
        assert!(matches!(not_held.unwrap_err(), Error::NoMatchingUnits { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_transfer_rolls_back_with_invocation() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        seed_chain(&invocation, 1).await?;
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        let manufacturer = get_profile(&invocation, &manufacturer_identity("M1")).await?;
        ship_to_distributor(&invocation, &manufacturer, carton_to("D1", "B0_C1")).await?;
        drop(invocation);

        let invocation = Invocation::begin(&db).await?;
        let held = invocation
            .query(&Selector::of_type(DocType::Asset).owned_by("M1"))
            .await?;
        assert_eq!(held.len(), 2);
        let receipts = invocation
            .query(&Selector::of_type(DocType::Receipt))
            .await?;
        assert!(receipts.is_empty());
        Ok(())
    }
}
