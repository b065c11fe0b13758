//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating parties, products and batches with sensible defaults.

use crate::{
    core::batch::{BatchRequest, create_batch},
    core::catalog::register_product,
    core::identity::{Role, StaticIdentity},
    core::registry::{Profile, find_party, get_profile},
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore},
    models::{DocType, Party, Product},
};
use sea_orm::DatabaseConnection;

/// Super-administrator identity used throughout the tests.
pub const SUPER_ADMIN: &str = "root";

/// Catalog price of [`test_product`].
pub const TEST_PRICE: u32 = 5;

/// Packet capacity of [`test_product`].
pub const TEST_PACKET_CAPACITY: u32 = 3;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A valid party record with the given id and role tag.
pub fn test_party(id: &str, doc_type: DocType) -> Party {
    Party {
        id: id.to_string(),
        name: "Test Party".to_string(),
        license_no: format!("LIC-{id}"),
        address: Some("1 Test Road".to_string()),
        owner_name: Some("Pat Tester".to_string()),
        owner_identity: None,
        owner_address: None,
        contact_no: Some("5550100".to_string()),
        email_id: Some("ops@example.test".to_string()),
        suspended: false,
        batch_count: 0,
        doc_type,
    }
}

/// A valid product with the given id and carton capacity.
///
/// # Defaults
/// * price: [`TEST_PRICE`]
/// * packet capacity: [`TEST_PACKET_CAPACITY`]
pub fn test_product(id: &str, carton_capacity: u32) -> Product {
    Product {
        id: id.to_string(),
        name: "Polio Vaccine".to_string(),
        desc: "Oral polio vaccine".to_string(),
        kind: "oral".to_string(),
        price: TEST_PRICE,
        carton_capacity,
        packet_capacity: TEST_PACKET_CAPACITY,
        doc_type: DocType::Item,
        suspended: false,
        owner: String::new(),
    }
}

/// A batch request for `product_id` with valid dates.
pub fn batch_request(product_id: &str, carton_qnty: u32) -> BatchRequest {
    BatchRequest {
        product_id: product_id.to_string(),
        manufacturing_date: 1_700_000_000,
        expiry_date: 1_760_000_000,
        carton_qnty,
    }
}

/// Identity of an administrator.
pub fn admin_identity(id: &str) -> StaticIdentity {
    StaticIdentity::with_role(id, Role::ChainAdmin)
}

/// Identity of a manufacturer.
pub fn manufacturer_identity(id: &str) -> StaticIdentity {
    StaticIdentity::with_role(id, Role::Manufacturer)
}

/// Writes a party record directly and returns its resolved profile.
pub async fn onboard<S: RecordStore>(store: &S, id: &str, doc_type: DocType) -> Result<Profile> {
    let role = Role::from_doc_type(doc_type)
        .ok_or_else(|| Error::permission_denied(format!("{doc_type} is not a party role")))?;
    store
        .put_document(
            &RecordKey::party(id, doc_type),
            &Document::Party(test_party(id, doc_type)),
        )
        .await?;
    get_profile(store, &StaticIdentity::with_role(id, role)).await
}

/// Marks a stored party as suspended.
pub async fn suspend<S: RecordStore>(store: &S, id: &str, doc_type: DocType) -> Result<()> {
    let mut party = find_party(store, id, doc_type)
        .await?
        .ok_or_else(|| Error::not_found(id, doc_type))?;
    party.suspended = true;
    store
        .put_document(&RecordKey::party(id, doc_type), &Document::Party(party))
        .await
}

/// Profiles of one participant per supply-chain role.
pub struct Chain {
    /// Manufacturer `M1`, refreshed after its batch was created
    pub manufacturer: Profile,
    /// Distributor `D1`
    pub distributor: Profile,
    /// Chemist `C1`
    pub chemist: Profile,
}

/// Onboards `M1`, `D1` and `C1`, registers product `P1` (carton capacity 2) under `M1`
/// and creates batch `B0` with `carton_qnty` cartons.
pub async fn seed_chain<S: RecordStore>(store: &S, carton_qnty: u32) -> Result<Chain> {
    let manufacturer = onboard(store, "M1", DocType::Manufacturer).await?;
    let distributor = onboard(store, "D1", DocType::Distributor).await?;
    let chemist = onboard(store, "C1", DocType::Chemist).await?;

    register_product(store, &manufacturer, test_product("P1", 2)).await?;
    create_batch(store, &manufacturer, batch_request("P1", carton_qnty)).await?;

    Ok(Chain {
        manufacturer: get_profile(store, &manufacturer_identity("M1")).await?,
        distributor,
        chemist,
    })
}
