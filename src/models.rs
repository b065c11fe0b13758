//! Ledger documents.
//!
//! These are the records stored in the ledger, serialized as JSON with camelCase field
//! names. Every document carries a `docType` discriminator.

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator tag identifying which record variant a stored document represents.
///
/// The four party tags double as role tags in composite party keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    /// Supply-chain administrator party
    #[serde(rename = "VACCINE_CHAIN_ADMIN")]
    Admin,
    /// Manufacturer party
    #[serde(rename = "MANUFACTURER")]
    Manufacturer,
    /// Distributor party
    #[serde(rename = "DISTRIBUTER")]
    Distributor,
    /// Chemist party
    #[serde(rename = "CHEMIST")]
    Chemist,
    /// Product definition
    #[serde(rename = "ITEM")]
    Item,
    /// Manufacturing batch
    #[serde(rename = "BATCH")]
    Batch,
    /// Physically trackable unit
    #[serde(rename = "ASSET")]
    Asset,
    /// Transfer receipt
    #[serde(rename = "RECEIPT")]
    Receipt,
}

impl DocType {
    /// Wire tag of this document type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "VACCINE_CHAIN_ADMIN",
            Self::Manufacturer => "MANUFACTURER",
            Self::Distributor => "DISTRIBUTER",
            Self::Chemist => "CHEMIST",
            Self::Item => "ITEM",
            Self::Batch => "BATCH",
            Self::Asset => "ASSET",
            Self::Receipt => "RECEIPT",
        }
    }

    /// Whether documents of this type are party records.
    #[must_use]
    pub const fn is_party(self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Manufacturer | Self::Distributor | Self::Chemist
        )
    }

    const fn item() -> Self {
        Self::Item
    }

    const fn batch() -> Self {
        Self::Batch
    }

    const fn asset() -> Self {
        Self::Asset
    }

    const fn receipt() -> Self {
        Self::Receipt
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "VACCINE_CHAIN_ADMIN" => Ok(Self::Admin),
            "MANUFACTURER" => Ok(Self::Manufacturer),
            "DISTRIBUTER" => Ok(Self::Distributor),
            "CHEMIST" => Ok(Self::Chemist),
            "ITEM" => Ok(Self::Item),
            "BATCH" => Ok(Self::Batch),
            "ASSET" => Ok(Self::Asset),
            "RECEIPT" => Ok(Self::Receipt),
            other => Err(Error::Decode {
                message: format!("unknown docType discriminator: {other}"),
            }),
        }
    }
}

/// Custody state of a unit. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Initial state, set at generation time
    ReadyForDistribution,
    /// Held by a distributor
    ReceivedAtDistributor,
    /// Held by a chemist
    ChemistInventoryReceived,
    /// Sold to a customer; terminal
    SoldToCustomer,
}

impl UnitStatus {
    /// The full custody sequence in order.
    pub const SEQUENCE: [Self; 4] = [
        Self::ReadyForDistribution,
        Self::ReceivedAtDistributor,
        Self::ChemistInventoryReceived,
        Self::SoldToCustomer,
    ];

    /// The state that follows this one, `None` for the terminal state.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::ReadyForDistribution => Some(Self::ReceivedAtDistributor),
            Self::ReceivedAtDistributor => Some(Self::ChemistInventoryReceived),
            Self::ChemistInventoryReceived => Some(Self::SoldToCustomer),
            Self::SoldToCustomer => None,
        }
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadyForDistribution => "ReadyForDistribution",
            Self::ReceivedAtDistributor => "ReceivedAtDistributor",
            Self::ChemistInventoryReceived => "ChemistInventoryReceived",
            Self::SoldToCustomer => "SoldToCustomer",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered party: administrator, manufacturer, distributor or chemist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Identifier, unique within the role tag
    pub id: String,
    /// Legal name (letters and spaces)
    pub name: String,
    /// License number
    pub license_no: String,
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Name of the business owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// Identity document of the business owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_identity: Option<String>,
    /// Address of the business owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    /// Contact number (digits only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    /// Whether the party is suspended
    #[serde(default)]
    pub suspended: bool,
    /// Batches created so far; only ever incremented, manufacturers only
    #[serde(default)]
    pub batch_count: u64,
    /// Role tag
    pub doc_type: DocType,
}

/// A manufacturer-scoped product definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Identifier, unique per manufacturer
    pub id: String,
    /// Product name (letters and spaces)
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub desc: String,
    /// Free-form product type
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Catalog price per unit
    pub price: u32,
    /// Units per carton
    pub carton_capacity: u32,
    /// Packet equivalent per unit, used as the billing multiplier
    pub packet_capacity: u32,
    /// Always [`DocType::Item`]
    #[serde(default = "DocType::item")]
    pub doc_type: DocType,
    /// Whether the product is withdrawn
    #[serde(default)]
    pub suspended: bool,
    /// Owning manufacturer id
    #[serde(default)]
    pub owner: String,
}

/// One manufacturing run, the template units are generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// `B<sequence>`
    pub id: String,
    /// Manufacturer id
    pub owner: String,
    /// Product id within the manufacturer's catalog
    pub product_id: String,
    /// Unix timestamp of manufacture
    pub manufacturing_date: i64,
    /// Unix timestamp of expiry, strictly after manufacture
    pub expiry_date: i64,
    /// Number of cartons produced
    pub carton_qnty: u32,
    /// Always [`DocType::Batch`]
    #[serde(default = "DocType::batch")]
    pub doc_type: DocType,
}

/// One physically trackable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// `<manufacturerId>_<batchId>_C<carton>_P<packet>`
    pub id: String,
    /// Batch the unit was generated from
    pub batch_id: String,
    /// `<batchId>_C<carton>`
    pub carton_id: String,
    /// Current custodian
    pub owner: String,
    /// Current custody state
    pub status: UnitStatus,
    /// Product id within the manufacturer's catalog
    pub product_id: String,
    /// Manufacturer id
    pub manufacturer_id: String,
    /// Unix timestamp of manufacture
    pub manufacturing_date: i64,
    /// Unix timestamp of expiry
    pub expiry_date: i64,
    /// Always [`DocType::Asset`]
    #[serde(default = "DocType::asset")]
    pub doc_type: DocType,
}

/// Immutable record of one custody transfer or sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Id of the transaction that issued the receipt
    pub id: String,
    /// Carton id or unit id that was transferred
    pub bundle_id: String,
    /// Always [`DocType::Receipt`]
    #[serde(default = "DocType::receipt")]
    pub doc_type: DocType,
    /// Selling party
    pub supplier_id: String,
    /// Buying party
    pub customer_id: String,
    /// Product id within the manufacturer's catalog
    pub product_id: String,
    /// Unix timestamp supplied with the transfer
    pub transaction_date: i64,
    /// Computed bill
    pub bill_amount: u64,
}

/// One step of a unit's reconstructed custody trail. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unit id (the tracked key for tombstones)
    pub id: String,
    /// Custodian at this revision, `None` for a tombstone
    pub owner: Option<String>,
    /// Status at this revision, `None` for a tombstone
    pub status: Option<UnitStatus>,
    /// Transaction that wrote the revision
    pub tx_id: String,
    /// Commit timestamp of the revision
    pub timestamp: DateTime<Utc>,
    /// Whether the revision deleted the unit
    pub is_delete: bool,
}
