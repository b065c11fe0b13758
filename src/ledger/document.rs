//! The closed set of stored document variants.
//!
//! Stored bytes are decoded by reading the `docType` discriminator first and then
//! deserializing into the matching variant. Unknown or missing discriminators are rejected.

use crate::errors::{Error, Result};
use crate::models::{Batch, DocType, Party, Product, Receipt, Unit};
use serde_json::Value;

/// A decoded ledger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    /// Administrator, manufacturer, distributor or chemist
    Party(Party),
    /// Product definition
    Product(Product),
    /// Manufacturing batch
    Batch(Batch),
    /// Trackable unit
    Unit(Unit),
    /// Transfer receipt
    Receipt(Receipt),
}

impl Document {
    /// Decodes a stored document, validating its discriminator.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the bytes are not JSON, the discriminator is missing or
    /// unknown, or the body does not match the variant the discriminator names.
    pub fn decode(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        let doc_type: DocType = value
            .get("docType")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Decode {
                message: "document has no docType discriminator".to_string(),
            })?
            .parse()?;

        let document = match doc_type {
            DocType::Admin | DocType::Manufacturer | DocType::Distributor | DocType::Chemist => {
                Self::Party(serde_json::from_value(value)?)
            }
            DocType::Item => Self::Product(serde_json::from_value(value)?),
            DocType::Batch => Self::Batch(serde_json::from_value(value)?),
            DocType::Asset => Self::Unit(serde_json::from_value(value)?),
            DocType::Receipt => Self::Receipt(serde_json::from_value(value)?),
        };
        Ok(document)
    }

    /// Encodes the document into its native JSON form.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        let body = match self {
            Self::Party(party) => serde_json::to_string(party)?,
            Self::Product(product) => serde_json::to_string(product)?,
            Self::Batch(batch) => serde_json::to_string(batch)?,
            Self::Unit(unit) => serde_json::to_string(unit)?,
            Self::Receipt(receipt) => serde_json::to_string(receipt)?,
        };
        Ok(body)
    }

    /// The document's discriminator.
    #[must_use]
    pub const fn doc_type(&self) -> DocType {
        match self {
            Self::Party(party) => party.doc_type,
            Self::Product(_) => DocType::Item,
            Self::Batch(_) => DocType::Batch,
            Self::Unit(_) => DocType::Asset,
            Self::Receipt(_) => DocType::Receipt,
        }
    }

    /// Unwraps a party document.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the document is another variant.
    pub fn into_party(self) -> Result<Party> {
        match self {
            Self::Party(party) => Ok(party),
            other => Err(unexpected("party", &other)),
        }
    }

    /// Unwraps a product document.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the document is another variant.
    pub fn into_product(self) -> Result<Product> {
        match self {
            Self::Product(product) => Ok(product),
            other => Err(unexpected("product", &other)),
        }
    }

    /// Unwraps a unit document.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the document is another variant.
    pub fn into_unit(self) -> Result<Unit> {
        match self {
            Self::Unit(unit) => Ok(unit),
            other => Err(unexpected("unit", &other)),
        }
    }

    /// Unwraps a receipt document.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the document is another variant.
    pub fn into_receipt(self) -> Result<Receipt> {
        match self {
            Self::Receipt(receipt) => Ok(receipt),
            other => Err(unexpected("receipt", &other)),
        }
    }
}

fn unexpected(wanted: &str, found: &Document) -> Error {
    Error::Decode {
        message: format!("expected a {wanted} document, found {}", found.doc_type()),
    }
}
