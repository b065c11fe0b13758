//! Product catalog - Manufacturer-scoped product definitions.

use crate::{
    core::identity::Capability,
    core::registry::Profile,
    core::validation::validate_product,
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore},
    models::{DocType, Product},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Request to withdraw or reinstate one of the caller's products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatusChange {
    /// Product id within the caller's catalog
    pub product_id: String,
    /// `true` to reinstate, `false` to withdraw
    pub active: bool,
}

/// Loads a product by its id and owning manufacturer.
pub async fn find_product<S: RecordStore>(
    store: &S,
    product_id: &str,
    manufacturer_id: &str,
) -> Result<Option<Product>> {
    store
        .get_document(&RecordKey::product(product_id, manufacturer_id))
        .await?
        .map(Document::into_product)
        .transpose()
}

/// Loads a product and requires it to be active.
///
/// # Errors
/// [`Error::NotFound`] if absent, [`Error::NotActive`] if withdrawn.
pub async fn get_active_product<S: RecordStore>(
    store: &S,
    product_id: &str,
    manufacturer_id: &str,
) -> Result<Product> {
    let product = find_product(store, product_id, manufacturer_id)
        .await?
        .ok_or_else(|| Error::not_found(product_id, DocType::Item))?;
    if product.suspended {
        return Err(Error::NotActive {
            id: product_id.to_string(),
            doc_type: DocType::Item.to_string(),
        });
    }
    Ok(product)
}

/// Adds a product to the calling manufacturer's catalog. The owner is always the caller.
///
/// # Errors
/// [`Error::PermissionDenied`] for non-manufacturers, [`Error::Validation`] for a malformed
/// product, [`Error::AlreadyExists`] if the caller already has a product with that id.
pub async fn register_product<S: RecordStore>(
    store: &S,
    caller: &Profile,
    mut product: Product,
) -> Result<Product> {
    Capability::RegisterProduct.authorize(caller.role)?;
    validate_product(&product)?;

    product.owner = caller.id().to_string();
    product.suspended = false;
    let key = RecordKey::product(&product.id, &product.owner);
    if store.exists(&key).await? {
        return Err(Error::AlreadyExists {
            id: product.id,
            doc_type: DocType::Item.to_string(),
        });
    }

    store
        .put_document(&key, &Document::Product(product.clone()))
        .await?;
    info!(id = %product.id, manufacturer = %product.owner, "Product registered");
    Ok(product)
}

/// Withdraws or reinstates one of the caller's products.
///
/// # Errors
/// [`Error::NotFound`] if the caller has no such product, [`Error::NoOp`] if the product
/// already has the requested status.
pub async fn set_product_active<S: RecordStore>(
    store: &S,
    caller: &Profile,
    change: ProductStatusChange,
) -> Result<Product> {
    Capability::SetProductStatus.authorize(caller.role)?;

    let mut product = find_product(store, &change.product_id, caller.id())
        .await?
        .ok_or_else(|| Error::not_found(&change.product_id, DocType::Item))?;
    if product.suspended != change.active {
        return Err(Error::NoOp {
            status: if change.active { "active" } else { "suspended" }.to_string(),
        });
    }

    product.suspended = !change.active;
    store
        .put_document(
            &RecordKey::product(&product.id, &product.owner),
            &Document::Product(product.clone()),
        )
        .await?;
    info!(id = %product.id, active = change.active, "Product status changed");
    Ok(product)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ledger::Invocation;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_product_forces_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let manufacturer = onboard(&invocation, "M1", DocType::Manufacturer).await?;

        let mut submitted = test_product("P1", 2);
        submitted.owner = "someone else".to_string();
        let stored = register_product(&invocation, &manufacturer, submitted).await?;
        assert_eq!(stored.owner, "M1");
        assert!(!stored.suspended);

        let loaded = get_active_product(&invocation, "P1", "M1").await?;
        assert_eq!(loaded, stored);
        assert!(find_product(&invocation, "P1", "M2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_product_ids_are_scoped_per_manufacturer() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let first = onboard(&invocation, "M1", DocType::Manufacturer).await?;
        let second = onboard(&invocation, "M2", DocType::Manufacturer).await?;

        register_product(&invocation, &first, test_product("P1", 2)).await?;
        register_product(&invocation, &second, test_product("P1", 4)).await?;

        let duplicate = register_product(&invocation, &first, test_product("P1", 2)).await;
        assert!(matches!(duplicate.unwrap_err(), Error::AlreadyExists { .. }));
        assert_eq!(
            get_active_product(&invocation, "P1", "M2")
                .await?
                .carton_capacity,
            4
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_only_manufacturers_register_products() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let distributor = onboard(&invocation, "D1", DocType::Distributor).await?;
        let result = register_product(&invocation, &distributor, test_product("P1", 2)).await;
        assert!(matches!(result.unwrap_err(), Error::PermissionDenied { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_withdrawn_product_is_not_active() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let manufacturer = onboard(&invocation, "M1", DocType::Manufacturer).await?;
        register_product(&invocation, &manufacturer, test_product("P1", 2)).await?;

        let withdraw = ProductStatusChange {
            product_id: "P1".to_string(),
            active: false,
        };
        set_product_active(&invocation, &manufacturer, withdraw.clone()).await?;
        let result = get_active_product(&invocation, "P1", "M1").await;
        assert!(matches!(result.unwrap_err(), Error::NotActive { .. }));

        let again = set_product_active(&invocation, &manufacturer, withdraw).await;
        assert!(matches!(again.unwrap_err(), Error::NoOp { .. }));

        let missing = set_product_active(
            &invocation,
            &manufacturer,
            ProductStatusChange {
                product_id: "P9".to_string(),
                active: true,
            },
        )
        .await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
