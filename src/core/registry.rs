//! Entity registry - Onboarding and lifecycle of parties.
//!
//! Administrators are onboarded by the super-administrator; manufacturers, distributors and
//! chemists by an administrator. [`get_profile`] is the authorization primitive every other
//! operation starts from: it resolves the caller, loads the caller's party record and refuses
//! suspended or unknown callers.

use crate::{
    core::identity::{Capability, IdentityResolver, Role, USER_ROLE_ATTRIBUTE, resolve_role},
    core::validation::{FieldErrors, check_contact_fields, validate_party},
    errors::{Error, Result},
    ledger::{Document, RecordKey, RecordStore},
    models::{DocType, Party},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The resolved caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The caller's party record as stored
    pub party: Party,
    /// The caller's role
    pub role: Role,
}

impl Profile {
    /// The caller's party id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.party.id
    }
}

/// Request to suspend or reinstate a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// Target party id
    pub id: String,
    /// Target role tag
    pub doc_type: DocType,
    /// `true` to reinstate, `false` to suspend
    pub active: bool,
}

/// A party's edit of its own mutable contact fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New postal address
    #[serde(default)]
    pub address: Option<String>,
    /// New owner name
    #[serde(default)]
    pub owner_name: Option<String>,
    /// New owner identity document
    #[serde(default)]
    pub owner_identity: Option<String>,
    /// New owner address
    #[serde(default)]
    pub owner_address: Option<String>,
    /// New contact number
    #[serde(default)]
    pub contact_no: Option<String>,
    /// New email
    #[serde(default)]
    pub email_id: Option<String>,
}

/// Loads the party stored under `(id, role_tag)`.
pub async fn find_party<S: RecordStore>(
    store: &S,
    id: &str,
    role_tag: DocType,
) -> Result<Option<Party>> {
    store
        .get_document(&RecordKey::party(id, role_tag))
        .await?
        .map(Document::into_party)
        .transpose()
}

/// Loads the party stored under `(id, role_tag)` and requires it to be active.
///
/// # Errors
/// [`Error::NotFound`] if absent, [`Error::NotActive`] if suspended.
pub async fn get_active_party<S: RecordStore>(
    store: &S,
    id: &str,
    role_tag: DocType,
) -> Result<Party> {
    let party = find_party(store, id, role_tag)
        .await?
        .ok_or_else(|| Error::not_found(id, role_tag))?;
    if party.suspended {
        return Err(Error::NotActive {
            id: id.to_string(),
            doc_type: role_tag.to_string(),
        });
    }
    Ok(party)
}

/// Resolves the caller through the identity provider and loads its active party record.
///
/// # Errors
/// [`Error::PermissionDenied`] if the caller has no usable role claim, [`Error::NotFound`] if
/// no record exists for the caller under that role, [`Error::NotActive`] if it is suspended.
pub async fn get_profile<S: RecordStore, I: IdentityResolver>(
    store: &S,
    identity: &I,
) -> Result<Profile> {
    let caller_id = identity.caller_id()?;
    let attributes = identity.caller_attributes(&[USER_ROLE_ATTRIBUTE])?;
    let role: Role = attributes
        .get(USER_ROLE_ATTRIBUTE)
        .ok_or_else(|| Error::permission_denied("caller has no userRole claim"))?
        .parse()?;
    let role_tag = role
        .doc_type()
        .ok_or_else(|| Error::permission_denied(format!("{role} has no party record")))?;

    let party = get_active_party(store, &caller_id, role_tag).await?;
    debug!(caller = %caller_id, %role, "Profile resolved");
    Ok(Profile { party, role })
}

async fn insert_new_party<S: RecordStore>(store: &S, mut party: Party) -> Result<Party> {
    let key = RecordKey::party(&party.id, party.doc_type);
    if store.exists(&key).await? {
        return Err(Error::AlreadyExists {
            id: party.id,
            doc_type: party.doc_type.to_string(),
        });
    }
    party.suspended = false;
    party.batch_count = 0;
    store
        .put_document(&key, &Document::Party(party.clone()))
        .await?;
    info!(id = %party.id, role = %party.doc_type, "Party registered");
    Ok(party)
}

/// Onboards a supply-chain administrator. Only the super-administrator may call this.
///
/// # Errors
/// [`Error::PermissionDenied`] for any other caller, [`Error::Validation`] for a malformed
/// record or one not tagged as an administrator, [`Error::AlreadyExists`] for a duplicate.
pub async fn register_admin<S: RecordStore, I: IdentityResolver>(
    store: &S,
    identity: &I,
    super_admin_id: &str,
    admin: Party,
) -> Result<Party> {
    validate_party(&admin)?;
    let role = resolve_role(identity, super_admin_id)?;
    Capability::RegisterAdmin.authorize(role)?;
    if admin.doc_type != DocType::Admin {
        return Err(Error::Validation {
            fields: vec!["docType".to_string()],
        });
    }
    insert_new_party(store, admin).await
}

/// Onboards a manufacturer, distributor or chemist. Only an active administrator may call this.
///
/// # Errors
/// Errors of [`get_profile`], [`Error::PermissionDenied`] for non-administrators,
/// [`Error::Validation`] for a malformed record or a non supply-chain role tag,
/// [`Error::AlreadyExists`] for a duplicate.
pub async fn register_party<S: RecordStore>(
    store: &S,
    caller: &Profile,
    party: Party,
) -> Result<Party> {
    validate_party(&party)?;
    Capability::RegisterParty.authorize(caller.role)?;
    if party.doc_type == DocType::Admin {
        return Err(Error::Validation {
            fields: vec!["docType".to_string()],
        });
    }
    insert_new_party(store, party).await
}

/// Suspends or reinstates a party. Administrator targets need the super-administrator;
/// other targets need an active administrator.
///
/// # Errors
/// [`Error::PermissionDenied`] for an unauthorized caller, [`Error::NotFound`] for an absent
/// target, [`Error::NoOp`] if the target already has the requested status.
pub async fn set_active<S: RecordStore, I: IdentityResolver>(
    store: &S,
    identity: &I,
    super_admin_id: &str,
    change: StatusChange,
) -> Result<Party> {
    if !change.doc_type.is_party() {
        return Err(Error::Validation {
            fields: vec!["docType".to_string()],
        });
    }
    if change.doc_type == DocType::Admin {
        let role = resolve_role(identity, super_admin_id)?;
        Capability::SetAdminStatus.authorize(role)?;
    } else {
        let caller = get_profile(store, identity).await?;
        Capability::SetPartyStatus.authorize(caller.role)?;
    }

    let mut party = find_party(store, &change.id, change.doc_type)
        .await?
        .ok_or_else(|| Error::not_found(&change.id, change.doc_type))?;
    if party.suspended != change.active {
        return Err(Error::NoOp {
            status: if change.active { "active" } else { "suspended" }.to_string(),
        });
    }

    party.suspended = !change.active;
    store
        .put_document(
            &RecordKey::party(&party.id, party.doc_type),
            &Document::Party(party.clone()),
        )
        .await?;
    info!(id = %party.id, role = %party.doc_type, active = change.active, "Party status changed");
    Ok(party)
}

/// Applies a party's edit of its own contact fields.
///
/// # Errors
/// [`Error::Validation`] if a new contact number or email is malformed.
pub async fn update_profile<S: RecordStore>(
    store: &S,
    caller: &Profile,
    update: ProfileUpdate,
) -> Result<Party> {
    Capability::UpdateProfile.authorize(caller.role)?;

    let mut party = caller.party.clone();
    let ProfileUpdate {
        address,
        owner_name,
        owner_identity,
        owner_address,
        contact_no,
        email_id,
    } = update;
    party.address = address.or(party.address);
    party.owner_name = owner_name.or(party.owner_name);
    party.owner_identity = owner_identity.or(party.owner_identity);
    party.owner_address = owner_address.or(party.owner_address);
    party.contact_no = contact_no.or(party.contact_no);
    party.email_id = email_id.or(party.email_id);

    let mut errors = FieldErrors::default();
    check_contact_fields(&mut errors, &party);
    errors.finish()?;

    store
        .put_document(
            &RecordKey::party(&party.id, party.doc_type),
            &Document::Party(party.clone()),
        )
        .await?;
    info!(id = %party.id, "Profile updated");
    Ok(party)
}
