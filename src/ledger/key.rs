//! Record keys.
//!
//! Party, product and batch records live under composite keys built from a document type
//! and one or more attributes. Units and receipts use a flat key (their own id, or the
//! issuing transaction id).

use crate::errors::{Error, Result};
use crate::models::DocType;
use std::fmt;

/// Separator used in the encoded form of composite keys. Flat keys never start with it.
const SEPARATOR: char = '\u{1f}';

/// A typed record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// `(documentType, attributes...)`
    Composite {
        /// Document type the key indexes
        doc_type: DocType,
        /// Ordered key attributes
        attributes: Vec<String>,
    },
    /// A plain id
    Flat(String),
}

impl RecordKey {
    /// Key of a party record: `(role tag, id)`.
    pub fn party(id: impl Into<String>, role_tag: DocType) -> Self {
        Self::Composite {
            doc_type: role_tag,
            attributes: vec![id.into()],
        }
    }

    /// Key of a product record: `(ITEM, product id, manufacturer id)`.
    pub fn product(product_id: impl Into<String>, manufacturer_id: impl Into<String>) -> Self {
        Self::Composite {
            doc_type: DocType::Item,
            attributes: vec![product_id.into(), manufacturer_id.into()],
        }
    }

    /// Key of a batch record: `(BATCH, manufacturer id, batch id)`.
    pub fn batch(manufacturer_id: impl Into<String>, batch_id: impl Into<String>) -> Self {
        Self::Composite {
            doc_type: DocType::Batch,
            attributes: vec![manufacturer_id.into(), batch_id.into()],
        }
    }

    /// Key of a unit record: its own id.
    pub fn unit(unit_id: impl Into<String>) -> Self {
        Self::Flat(unit_id.into())
    }

    /// Key of a receipt record: the issuing transaction id.
    pub fn receipt(tx_id: impl Into<String>) -> Self {
        Self::Flat(tx_id.into())
    }

    /// Encodes the key into the store's native string key.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Composite {
                doc_type,
                attributes,
            } => {
                let mut encoded = String::new();
                encoded.push(SEPARATOR);
                encoded.push_str(doc_type.as_str());
                encoded.push(SEPARATOR);
                for attribute in attributes {
                    encoded.push_str(attribute);
                    encoded.push(SEPARATOR);
                }
                encoded
            }
            Self::Flat(id) => id.clone(),
        }
    }

    /// Parses a native string key produced by [`RecordKey::encode`].
    ///
    /// # Errors
    /// Returns [`Error::Decode`] for a malformed composite key.
    pub fn decode(encoded: &str) -> Result<Self> {
        let Some(rest) = encoded.strip_prefix(SEPARATOR) else {
            return Ok(Self::Flat(encoded.to_string()));
        };
        let malformed = || Error::Decode {
            message: format!("malformed composite key: {encoded:?}"),
        };
        let body = rest.strip_suffix(SEPARATOR).ok_or_else(malformed)?;
        let mut parts = body.split(SEPARATOR);
        let doc_type = parts.next().ok_or_else(malformed)?.parse()?;
        let attributes: Vec<String> = parts.map(str::to_string).collect();
        if attributes.is_empty() {
            return Err(malformed());
        }
        Ok(Self::Composite {
            doc_type,
            attributes,
        })
    }

    /// Whether `id` can be used as a key attribute or flat key.
    #[must_use]
    pub fn is_valid_attribute(id: &str) -> bool {
        !id.is_empty() && !id.chars().any(char::is_control)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite {
                doc_type,
                attributes,
            } => write!(f, "{doc_type}({})", attributes.join(", ")),
            Self::Flat(id) => f.write_str(id),
        }
    }
}
