//! Transfer receipts.
//!
//! A receipt is keyed by the id of the invocation that issued it, so one transfer yields
//! exactly one receipt and a receipt is never overwritten.

use crate::{
    core::identity::Capability,
    core::registry::Profile,
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore},
    models::{DocType, Receipt},
};
use tracing::info;

/// Commercial terms of a transfer, before a receipt id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptTerms {
    /// Carton id or unit id that was transferred
    pub bundle_id: String,
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

/// Writes the receipt of the current invocation.
///
/// # Errors
/// [`Error::AlreadyExists`] if this invocation already issued a receipt.
pub async fn issue_receipt<S: RecordStore>(store: &S, terms: ReceiptTerms) -> Result<Receipt> {
    let key = RecordKey::receipt(store.tx_id());
    if store.exists(&key).await? {
        return Err(Error::AlreadyExists {
            id: store.tx_id().to_string(),
            doc_type: DocType::Receipt.to_string(),
        });
    }

    let receipt = Receipt {
        id: store.tx_id().to_string(),
        bundle_id: terms.bundle_id,
        doc_type: DocType::Receipt,
        supplier_id: terms.supplier_id,
        customer_id: terms.customer_id,
        product_id: terms.product_id,
        transaction_date: terms.transaction_date,
        bill_amount: terms.bill_amount,
    };
    store
        .put_document(&key, &Document::Receipt(receipt.clone()))
        .await?;
    info!(
        receipt = %receipt.id,
        bundle = %receipt.bundle_id,
        bill = receipt.bill_amount,
        "Receipt issued"
    );
    Ok(receipt)
}

/// Returns the stored receipt JSON if the caller is its supplier or customer.
///
/// # Errors
/// [`Error::NotFound`] for an unknown id or one naming another document, [`Error::NotAuthorized`] for any other caller.
pub async fn view_receipt<S: RecordStore>(
    store: &S,
    caller: &Profile,
    receipt_id: &str,
) -> Result<String> {
    Capability::ViewReceipt.authorize(caller.role)?;

    let body = store
        .get(&RecordKey::receipt(receipt_id))
        .await?
        .ok_or_else(|| Error::not_found(receipt_id, DocType::Receipt))?;
    let Document::Receipt(receipt) = Document::decode(&body)? else {
        return Err(Error::not_found(receipt_id, DocType::Receipt));
    };
    if receipt.supplier_id != caller.id() && receipt.customer_id != caller.id() {
        return Err(Error::NotAuthorized {
            receipt_id: receipt_id.to_string(),
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ledger::Invocation;
    use crate::test_utils::*;

    fn terms() -> ReceiptTerms {
        ReceiptTerms {
            bundle_id: "B0_C1".to_string(),
            supplier_id: "M1".to_string(),
            customer_id: "D1".to_string(),
            product_id: "P1".to_string(),
            transaction_date: 1_700_000_000,
            bill_amount: 60,
        }
    }

    #[tokio::test]
    async fn test_receipt_is_keyed_by_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let receipt = issue_receipt(&invocation, terms()).await?;
        assert_eq!(receipt.id, invocation.tx_id());

        let second = issue_receipt(&invocation, terms()).await;
        assert!(matches!(second.unwrap_err(), Error::AlreadyExists { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_only_named_parties_can_view() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let receipt = issue_receipt(&invocation, terms()).await?;
        invocation.commit().await?;

        let invocation = Invocation::begin(&db).await?;
        let supplier = onboard(&invocation, "M1", DocType::Manufacturer).await?;
        let customer = onboard(&invocation, "D1", DocType::Distributor).await?;
        let outsider = onboard(&invocation, "D2", DocType::Distributor).await?;

        let body = view_receipt(&invocation, &supplier, &receipt.id).await?;
        let decoded = Document::decode(&body)?.into_receipt()?;
        assert_eq!(decoded, receipt);
        view_receipt(&invocation, &customer, &receipt.id).await?;

        let denied = view_receipt(&invocation, &outsider, &receipt.id).await;
        assert!(matches!(denied.unwrap_err(), Error::NotAuthorized { .. }));

        let missing = view_receipt(&invocation, &supplier, "nope").await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_unit_id_is_not_a_receipt() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;

        let result = view_receipt(&invocation, &chain.manufacturer, "M1_B0_C1_P1").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
