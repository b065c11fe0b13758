//! The supply-chain ledger service.
//!
//! [`SupplyChain`] is the entry point for every public operation. Each call runs in its own
//! [`Invocation`]: the caller is resolved, the business logic runs, the invocation commits,
//! and only then are audit notifications published.

use crate::{
    config::database::{create_connection, create_tables},
    config::settings::Settings,
    core::batch::{self, BatchRequest},
    core::catalog::{self, ProductStatusChange},
    core::events::{AuditNotification, EventBus},
    core::history,
    core::identity::IdentityResolver,
    core::receipt,
    core::registry::{self, Profile, ProfileUpdate, StatusChange},
    core::transfer::{self, ChemistShipment, CustomerSale, DistributorShipment, TransferOutcome},
    core::views,
    errors::Result,
    ledger::Invocation,
    models::{Batch, HistoryEntry, Party, Product, Receipt},
};
use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;
use tracing::{info, instrument};

/// The vaccine supply-chain ledger.
#[derive(Debug)]
pub struct SupplyChain {
    db: DatabaseConnection,
    super_admin_id: String,
    events: EventBus,
}

impl SupplyChain {
    /// Wraps an existing connection whose tables are already created.
    pub fn new(db: DatabaseConnection, super_admin_id: impl Into<String>, event_capacity: usize) -> Self {
        Self {
            db,
            super_admin_id: super_admin_id.into(),
            events: EventBus::with_capacity(event_capacity),
        }
    }

    /// Connects to the configured record store and ensures its tables exist.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let db = create_connection(&settings.database_url).await?;
        create_tables(&db).await?;
        info!(super_admin = %settings.super_admin_id, "Supply chain ledger ready");
        Ok(Self::new(
            db,
            settings.super_admin_id.clone(),
            settings.event_capacity,
        ))
    }

    /// Registers a listener for audit notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuditNotification> {
        self.events.subscribe()
    }

    /// The audit event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    async fn open(&self) -> Result<Invocation> {
        Invocation::begin(&self.db).await
    }

    async fn open_as<I: IdentityResolver>(&self, identity: &I) -> Result<(Invocation, Profile)> {
        let invocation = self.open().await?;
        let profile = registry::get_profile(&invocation, identity).await?;
        Ok((invocation, profile))
    }

    async fn finish_transfer(
        &self,
        invocation: Invocation,
        outcome: TransferOutcome,
    ) -> Result<Receipt> {
        invocation.commit().await?;
        self.events.publish(outcome.notification);
        Ok(outcome.receipt)
    }

    /// Onboards a supply-chain administrator. Super-administrator only.
    #[instrument(skip(self, identity, admin), fields(id = %admin.id))]
    pub async fn register_admin<I: IdentityResolver>(
        &self,
        identity: &I,
        admin: Party,
    ) -> Result<Party> {
        let invocation = self.open().await?;
        let admin =
            registry::register_admin(&invocation, identity, &self.super_admin_id, admin).await?;
        invocation.commit().await?;
        Ok(admin)
    }

    /// Onboards a manufacturer, distributor or chemist. Administrators only.
    #[instrument(skip(self, identity, party), fields(id = %party.id, role = %party.doc_type))]
    pub async fn register_party<I: IdentityResolver>(
        &self,
        identity: &I,
        party: Party,
    ) -> Result<Party> {
        let (invocation, caller) = self.open_as(identity).await?;
        let party = registry::register_party(&invocation, &caller, party).await?;
        invocation.commit().await?;
        Ok(party)
    }

    /// Suspends or reinstates a party.
    #[instrument(skip(self, identity))]
    pub async fn set_active<I: IdentityResolver>(
        &self,
        identity: &I,
        change: StatusChange,
    ) -> Result<Party> {
        let invocation = self.open().await?;
        let party =
            registry::set_active(&invocation, identity, &self.super_admin_id, change).await?;
        invocation.commit().await?;
        Ok(party)
    }

    /// Resolves the caller's active profile.
    #[instrument(skip(self, identity))]
    pub async fn get_profile<I: IdentityResolver>(&self, identity: &I) -> Result<Profile> {
        let (invocation, profile) = self.open_as(identity).await?;
        invocation.commit().await?;
        Ok(profile)
    }

    /// The caller's party record as JSON.
    #[instrument(skip(self, identity))]
    pub async fn view_profile<I: IdentityResolver>(&self, identity: &I) -> Result<String> {
        views::view_profile(&self.get_profile(identity).await?)
    }

    /// Edits the caller's own contact fields.
    #[instrument(skip(self, identity, update))]
    pub async fn update_profile<I: IdentityResolver>(
        &self,
        identity: &I,
        update: ProfileUpdate,
    ) -> Result<Party> {
        let (invocation, caller) = self.open_as(identity).await?;
        let party = registry::update_profile(&invocation, &caller, update).await?;
        invocation.commit().await?;
        Ok(party)
    }

    /// Adds a product to the calling manufacturer's catalog.
    #[instrument(skip(self, identity, product), fields(id = %product.id))]
    pub async fn register_product<I: IdentityResolver>(
        &self,
        identity: &I,
        product: Product,
    ) -> Result<Product> {
        let (invocation, caller) = self.open_as(identity).await?;
        let product = catalog::register_product(&invocation, &caller, product).await?;
        invocation.commit().await?;
        Ok(product)
    }

    /// Withdraws or reinstates one of the caller's products.
    #[instrument(skip(self, identity))]
    pub async fn set_product_active<I: IdentityResolver>(
        &self,
        identity: &I,
        change: ProductStatusChange,
    ) -> Result<Product> {
        let (invocation, caller) = self.open_as(identity).await?;
        let product = catalog::set_product_active(&invocation, &caller, change).await?;
        invocation.commit().await?;
        Ok(product)
    }

    /// Creates a batch and generates its units.
    #[instrument(skip(self, identity))]
    pub async fn create_batch<I: IdentityResolver>(
        &self,
        identity: &I,
        request: BatchRequest,
    ) -> Result<Batch> {
        let (invocation, caller) = self.open_as(identity).await?;
        let batch = batch::create_batch(&invocation, &caller, request).await?;
        invocation.commit().await?;
        Ok(batch)
    }

    /// Ships a carton from the calling manufacturer to a distributor.
    #[instrument(skip(self, identity))]
    pub async fn ship_to_distributor<I: IdentityResolver>(
        &self,
        identity: &I,
        shipment: DistributorShipment,
    ) -> Result<Receipt> {
        let (invocation, caller) = self.open_as(identity).await?;
        let outcome = transfer::ship_to_distributor(&invocation, &caller, shipment).await?;
        self.finish_transfer(invocation, outcome).await
    }

    /// Ships a unit from the calling distributor to a chemist.
    #[instrument(skip(self, identity))]
    pub async fn ship_to_chemist<I: IdentityResolver>(
        &self,
        identity: &I,
        shipment: ChemistShipment,
    ) -> Result<Receipt> {
        let (invocation, caller) = self.open_as(identity).await?;
        let outcome = transfer::ship_to_chemist(&invocation, &caller, shipment).await?;
        self.finish_transfer(invocation, outcome).await
    }

    /// Sells a unit held by the calling chemist to a customer.
    #[instrument(skip(self, identity))]
    pub async fn sell_to_customer<I: IdentityResolver>(
        &self,
        identity: &I,
        sale: CustomerSale,
    ) -> Result<Receipt> {
        let (invocation, caller) = self.open_as(identity).await?;
        let outcome = transfer::sell_to_customer(&invocation, &caller, sale).await?;
        self.finish_transfer(invocation, outcome).await
    }

    /// Custody trail of a unit. Open to any caller.
    #[instrument(skip(self))]
    pub async fn track_unit(&self, unit_id: &str) -> Result<Vec<HistoryEntry>> {
        let invocation = self.open().await?;
        let trail = history::track_unit(&invocation, unit_id).await?;
        invocation.commit().await?;
        Ok(trail)
    }

    /// The calling manufacturer's catalog as a JSON array.
    #[instrument(skip(self, identity))]
    pub async fn products_by_manufacturer<I: IdentityResolver>(
        &self,
        identity: &I,
    ) -> Result<String> {
        let (invocation, caller) = self.open_as(identity).await?;
        let products = views::products_by_manufacturer(&invocation, &caller).await?;
        invocation.commit().await?;
        Ok(products)
    }

    /// The units the caller holds as a JSON array.
    #[instrument(skip(self, identity))]
    pub async fn units_by_owner<I: IdentityResolver>(&self, identity: &I) -> Result<String> {
        let (invocation, caller) = self.open_as(identity).await?;
        let units = views::units_by_owner(&invocation, &caller).await?;
        invocation.commit().await?;
        Ok(units)
    }

    /// A receipt the caller is party to, as stored.
    #[instrument(skip(self, identity))]
    pub async fn view_receipt<I: IdentityResolver>(
        &self,
        identity: &I,
        receipt_id: &str,
    ) -> Result<String> {
        let (invocation, caller) = self.open_as(identity).await?;
        let body = receipt::view_receipt(&invocation, &caller, receipt_id).await?;
        invocation.commit().await?;
        Ok(body)
    }
}
