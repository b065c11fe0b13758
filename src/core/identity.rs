//! Caller identity, roles and the capability table.
//!
//! The identity provider is an external collaborator reached through [`IdentityResolver`].
//! Roles form a closed set; every public operation names the [`Capability`] it needs and is
//! checked once at entry against [`Capability::permitted_roles`].

use crate::errors::{Error, Result};
use crate::models::DocType;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Name of the certificate attribute carrying the caller's role claim.
pub const USER_ROLE_ATTRIBUTE: &str = "userRole";

/// Authenticates the caller of the current invocation.
pub trait IdentityResolver {
    /// The caller's identity name.
    fn caller_id(&self) -> Result<String>;

    /// The requested attributes that the caller's credential carries.
    fn caller_attributes(&self, names: &[&str]) -> Result<HashMap<String, String>>;
}

/// An identity fixed at construction, for the command line front-end and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    id: String,
    attributes: HashMap<String, String>,
}

impl StaticIdentity {
    /// An identity with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// An identity carrying a `userRole` claim for `role`.
    pub fn with_role(id: impl Into<String>, role: Role) -> Self {
        Self::new(id).with_attribute(USER_ROLE_ATTRIBUTE, role.as_str())
    }

    /// Adds an attribute to the identity.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl IdentityResolver for StaticIdentity {
    fn caller_id(&self) -> Result<String> {
        Ok(self.id.clone())
    }

    fn caller_attributes(&self, names: &[&str]) -> Result<HashMap<String, String>> {
        Ok(names
            .iter()
            .filter_map(|name| {
                self.attributes
                    .get(*name)
                    .map(|value| ((*name).to_string(), value.clone()))
            })
            .collect())
    }
}

/// Every role the system recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The distinguished identity that onboards administrators; has no stored record
    SuperAdmin,
    /// Supply-chain administrator
    ChainAdmin,
    /// Manufacturer
    Manufacturer,
    /// Distributor
    Distributor,
    /// Chemist
    Chemist,
}

impl Role {
    /// The role tag party records of this role are stored under.
    #[must_use]
    pub const fn doc_type(self) -> Option<DocType> {
        match self {
            Self::SuperAdmin => None,
            Self::ChainAdmin => Some(DocType::Admin),
            Self::Manufacturer => Some(DocType::Manufacturer),
            Self::Distributor => Some(DocType::Distributor),
            Self::Chemist => Some(DocType::Chemist),
        }
    }

    /// The role whose party records use `doc_type` as their tag.
    #[must_use]
    pub const fn from_doc_type(doc_type: DocType) -> Option<Self> {
        match doc_type {
            DocType::Admin => Some(Self::ChainAdmin),
            DocType::Manufacturer => Some(Self::Manufacturer),
            DocType::Distributor => Some(Self::Distributor),
            DocType::Chemist => Some(Self::Chemist),
            DocType::Item | DocType::Batch | DocType::Asset | DocType::Receipt => None,
        }
    }

    /// Claim value of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::ChainAdmin => "VACCINE_CHAIN_ADMIN",
            Self::Manufacturer => "MANUFACTURER",
            Self::Distributor => "DISTRIBUTER",
            Self::Chemist => "CHEMIST",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "VACCINE_CHAIN_ADMIN" => Ok(Self::ChainAdmin),
            "MANUFACTURER" => Ok(Self::Manufacturer),
            "DISTRIBUTER" => Ok(Self::Distributor),
            "CHEMIST" => Ok(Self::Chemist),
            other => Err(Error::permission_denied(format!(
                "unrecognised role claim: {other}"
            ))),
        }
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Onboard a supply-chain administrator
    RegisterAdmin,
    /// Onboard a manufacturer, distributor or chemist
    RegisterParty,
    /// Suspend or reinstate an administrator
    SetAdminStatus,
    /// Suspend or reinstate a manufacturer, distributor or chemist
    SetPartyStatus,
    /// Edit one's own contact fields
    UpdateProfile,
    /// Define a product
    RegisterProduct,
    /// Withdraw or reinstate one's own product
    SetProductStatus,
    /// Create a batch and generate its units
    CreateBatch,
    /// Manufacturer to distributor transfer
    ShipToDistributor,
    /// Distributor to chemist transfer
    ShipToChemist,
    /// Chemist to customer sale
    SellToCustomer,
    /// List one's own products
    ViewProducts,
    /// List the units one holds
    ViewUnits,
    /// Read a receipt one is party to
    ViewReceipt,
}

impl Capability {
    /// The roles allowed to exercise this capability.
    #[must_use]
    pub const fn permitted_roles(self) -> &'static [Role] {
        match self {
            Self::RegisterAdmin | Self::SetAdminStatus => &[Role::SuperAdmin],
            Self::RegisterParty | Self::SetPartyStatus => &[Role::ChainAdmin],
            Self::UpdateProfile | Self::ViewReceipt => &[
                Role::ChainAdmin,
                Role::Manufacturer,
                Role::Distributor,
                Role::Chemist,
            ],
            Self::RegisterProduct
            | Self::SetProductStatus
            | Self::CreateBatch
            | Self::ShipToDistributor
            | Self::ViewProducts => &[Role::Manufacturer],
            Self::ShipToChemist => &[Role::Distributor],
            Self::SellToCustomer => &[Role::Chemist],
            Self::ViewUnits => &[Role::Manufacturer, Role::Distributor, Role::Chemist],
        }
    }

    /// Checks that `role` may exercise this capability.
    ///
    /// # Errors
    /// Returns [`Error::PermissionDenied`] otherwise.
    pub fn authorize(self, role: Role) -> Result<()> {
        if self.permitted_roles().contains(&role) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "{role} is not allowed to {self:?}"
            )))
        }
    }
}

/// Resolves the caller's role: the configured super-administrator identity, otherwise the
/// `userRole` claim.
///
/// # Errors
/// Returns [`Error::PermissionDenied`] if the claim is missing or unrecognised, or claims
/// the super-administrator role without being that identity.
pub fn resolve_role<I: IdentityResolver>(identity: &I, super_admin_id: &str) -> Result<Role> {
    if identity.caller_id()? == super_admin_id {
        return Ok(Role::SuperAdmin);
    }
    let attributes = identity.caller_attributes(&[USER_ROLE_ATTRIBUTE])?;
    let claim = attributes
        .get(USER_ROLE_ATTRIBUTE)
        .ok_or_else(|| Error::permission_denied("caller has no userRole claim"))?;
    match claim.parse()? {
        Role::SuperAdmin => Err(Error::permission_denied(
            "the super-administrator role cannot be claimed",
        )),
        role => Ok(role),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_role_doc_type_mapping() {
        for role in [
            Role::ChainAdmin,
            Role::Manufacturer,
            Role::Distributor,
            Role::Chemist,
        ] {
            let doc_type = role.doc_type().unwrap();
            assert_eq!(Role::from_doc_type(doc_type), Some(role));
            assert_eq!(role.as_str(), doc_type.as_str());
        }
        assert_eq!(Role::SuperAdmin.doc_type(), None);
        assert_eq!(Role::from_doc_type(DocType::Asset), None);
    }

    #[test]
    fn test_capability_table() {
        assert!(Capability::CreateBatch.authorize(Role::Manufacturer).is_ok());
        assert!(Capability::CreateBatch.authorize(Role::Distributor).is_err());
        assert!(Capability::RegisterParty.authorize(Role::ChainAdmin).is_ok());
        assert!(Capability::RegisterParty.authorize(Role::SuperAdmin).is_err());
        assert!(Capability::ShipToChemist.authorize(Role::Distributor).is_ok());
        assert!(Capability::SellToCustomer.authorize(Role::Manufacturer).is_err());

        let denied = Capability::ViewProducts.authorize(Role::Chemist);
        assert!(matches!(
            denied.unwrap_err(),
            Error::PermissionDenied { .. }
        ));
    }

    #[test]
    fn test_resolve_role() {
        let root = StaticIdentity::new("root");
        assert_eq!(resolve_role(&root, "root").unwrap(), Role::SuperAdmin);

        let chemist = StaticIdentity::with_role("C1", Role::Chemist);
        assert_eq!(resolve_role(&chemist, "root").unwrap(), Role::Chemist);

        let anonymous = StaticIdentity::new("nobody");
        assert!(resolve_role(&anonymous, "root").is_err());

        let impostor = StaticIdentity::with_role("mallory", Role::SuperAdmin);
        assert!(resolve_role(&impostor, "root").is_err());

        let garbage = StaticIdentity::new("x").with_attribute(USER_ROLE_ATTRIBUTE, "WIZARD");
        assert!(resolve_role(&garbage, "root").is_err());
    }
}
