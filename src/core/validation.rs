//! Field-level validation of incoming documents.
//!
//! Each check collects every failing field so the caller sees all problems at once.

use crate::errors::{Error, Result};
use crate::ledger::RecordKey;
use crate::models::{DocType, Party, Product};

/// Letters and spaces only, at least one letter.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Digits only, at least one.
#[must_use]
pub fn is_valid_number(number: &str) -> bool {
    !number.is_empty() && number.chars().all(|c| c.is_ascii_digit())
}

/// `local@domain.tld` shape with no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !local.is_empty()
        && !host.is_empty()
        && !tld.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
}

/// Accumulates failing field names.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    /// Records `field` as failing unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str) -> &mut Self {
        if !ok {
            self.0.push(field.to_string());
        }
        self
    }

    /// `Ok(())` if nothing failed, otherwise [`Error::Validation`] listing the fields.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] when at least one field failed.
    pub fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { fields: self.0 })
        }
    }
}

/// Validates the contact fields a party may change after registration.
pub(crate) fn check_contact_fields(errors: &mut FieldErrors, party: &Party) {
    errors
        .check(
            party.contact_no.as_deref().is_none_or(is_valid_number),
            "contactNo",
        )
        .check(
            party.email_id.as_deref().is_none_or(is_valid_email),
            "emailId",
        );
}

/// Validates a party document.
///
/// # Errors
/// Returns [`Error::Validation`] naming every failing field.
pub fn validate_party(party: &Party) -> Result<()> {
    let mut errors = FieldErrors::default();
    errors
        .check(RecordKey::is_valid_attribute(&party.id), "id")
        .check(is_valid_name(&party.name), "name")
        .check(!party.license_no.trim().is_empty(), "licenseNo")
        .check(party.doc_type.is_party(), "docType");
    check_contact_fields(&mut errors, party);
    errors.finish()
}

/// Validates a product document.
///
/// # Errors
/// Returns [`Error::Validation`] naming every failing field.
pub fn validate_product(product: &Product) -> Result<()> {
    let mut errors = FieldErrors::default();
    errors
        .check(RecordKey::is_valid_attribute(&product.id), "id")
        .check(is_valid_name(&product.name), "name")
        .check(product.doc_type == DocType::Item, "docType");
    errors.finish()
}

/// Validates batch dates: expiry strictly after manufacture.
///
/// # Errors
/// Returns [`Error::Validation`] naming every failing field.
pub fn validate_batch_dates(product_id: &str, manufacturing_date: i64, expiry_date: i64) -> Result<()> {
    let mut errors = FieldErrors::default();
    errors
        .check(RecordKey::is_valid_attribute(product_id), "productId")
        .check(manufacturing_date != 0, "manufacturingDate")
        .check(expiry_date > manufacturing_date, "expiryDate");
    errors.finish()
}

/// Most units a single batch may generate.
pub const MAX_UNITS_PER_BATCH: u64 = 32_767;

/// Validates the number of units a batch would generate.
///
/// # Errors
/// Returns [`Error::Validation`] on `cartonQnty` when the batch exceeds
/// [`MAX_UNITS_PER_BATCH`].
pub fn validate_batch_size(carton_qnty: u32, carton_capacity: u32) -> Result<()> {
    let units = u64::from(carton_qnty) * u64::from(carton_capacity);
    let mut errors = FieldErrors::default();
    errors.check(units <= MAX_UNITS_PER_BATCH, "cartonQnty");
    errors.finish()
}
