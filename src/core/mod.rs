/// Batch creation and unit generation
pub mod batch;
/// Manufacturer-scoped product catalog
pub mod catalog;
/// Audit notifications and their broadcast bus
pub mod events;
/// Custody history replay
pub mod history;
/// Caller identity, roles and capabilities
pub mod identity;
/// Transfer receipts
pub mod receipt;
/// Party onboarding, suspension and profiles
pub mod registry;
/// The custody transfer state machine
pub mod transfer;
/// Field validation rules
pub mod validation;
/// Caller-scoped read views
pub mod views;
