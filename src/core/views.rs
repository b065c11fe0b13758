//! Read-only views scoped to the caller.
//!
//! List views return a JSON array of the stored documents exactly as they were written.

use crate::{
    core::identity::Capability,
    core::registry::Profile,
    errors::Result,
    ledger::{QueryRecord, RecordStore, Selector},
    models::DocType,
};

fn json_array(rows: Vec<QueryRecord>) -> String {
    let bodies: Vec<String> = rows.into_iter().map(|row| row.body).collect();
    format!("[{}]", bodies.join(","))
}

/// Every product in the calling manufacturer's catalog.
///
/// # Errors
/// [`crate::errors::Error::PermissionDenied`] for non-manufacturers.
pub async fn products_by_manufacturer<S: RecordStore>(store: &S, caller: &Profile) -> Result<String> {
    Capability::ViewProducts.authorize(caller.role)?;
    let rows = store
        .query(&Selector::of_type(DocType::Item).owned_by(caller.id()))
        .await?;
    Ok(json_array(rows))
}

/// Every unit the caller currently holds.
///
/// # Errors
/// [`crate::errors::Error::PermissionDenied`] for administrators.
pub async fn units_by_owner<S: RecordStore>(store: &S, caller: &Profile) -> Result<String> {
    Capability::ViewUnits.authorize(caller.role)?;
    let rows = store
        .query(&Selector::of_type(DocType::Asset).owned_by(caller.id()))
        .await?;
    Ok(json_array(rows))
}

/// The caller's own party record.
pub fn view_profile(caller: &Profile) -> Result<String> {
    Ok(serde_json::to_string(&caller.party)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::register_product;
    use crate::errors::Error;
    use crate::ledger::Invocation;
    use crate::test_utils::*;
    use serde_json::Value;

    #[tokio::test]
    async fn test_products_are_scoped_to_caller() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;
        let other = onboard(&invocation, "M2", DocType::Manufacturer).await?;
        register_product(&invocation, &other, test_product("P7", 1)).await?;

        let listed: Value = serde_json::from_str(
            &products_by_manufacturer(&invocation, &chain.manufacturer).await?,
        )
        .unwrap();
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], "P1");
        assert_eq!(listed[0]["docType"], "ITEM");

        let denied = products_by_manufacturer(&invocation, &chain.chemist).await;
        assert!(matches!(denied.unwrap_err(), Error::PermissionDenied { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_units_by_owner_preserves_stored_documents() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 1).await?;

        let listed = units_by_owner(&invocation, &chain.manufacturer).await?;
        let stored = invocation
            .get(&crate::ledger::RecordKey::unit("M1_B0_C1_P1"))
            .await?
            .unwrap();
        assert!(listed.starts_with(&format!("[{stored},")));

        assert_eq!(units_by_owner(&invocation, &chain.distributor).await?, "[]");
        Ok(())
    }

    #[tokio::test]
    async fn test_view_profile_renders_party() -> Result<()> {
        let db = setup_test_db().await?;
        let invocation = Invocation::begin(&db).await?;
        let chain = seed_chain(&invocation, 0).await?;

        let rendered: Value = serde_json::from_str(&view_profile(&chain.distributor)?).unwrap();
        assert_eq!(rendered["id"], "D1");
        assert_eq!(rendered["docType"], "DISTRIBUTER");
        assert_eq!(rendered["suspended"], false);
        Ok(())
    }
}
