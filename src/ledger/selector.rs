//! Equality predicates over stored documents.

use crate::models::DocType;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A conjunction of equality constraints on document fields.
///
/// `docType` and `owner` constraints are kept apart so the store can answer them from its
/// projected columns; every other field is compared against the decoded document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    doc_type: Option<DocType>,
    owner: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Selector {
    /// Matches every document of `doc_type`.
    #[must_use]
    pub fn of_type(doc_type: DocType) -> Self {
        Self {
            doc_type: Some(doc_type),
            ..Self::default()
        }
    }

    /// Adds an `owner == owner` constraint.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Adds a `field == value` constraint.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Document type constraint, if any.
    #[must_use]
    pub const fn doc_type(&self) -> Option<DocType> {
        self.doc_type
    }

    /// Owner constraint, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Checks the non-projected field constraints against a decoded document.
    #[must_use]
    pub fn matches_fields(&self, document: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Checks every constraint against a decoded document.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        let doc_type_ok = self
            .doc_type
            .is_none_or(|doc_type| document.get("docType") == Some(&Value::from(doc_type.as_str())));
        let owner_ok = self
            .owner
            .as_deref()
            .is_none_or(|owner| document.get("owner") == Some(&Value::from(owner)));
        doc_type_ok && owner_ok && self.matches_fields(document)
    }
}

impl fmt::Display for Selector {
    /// Renders the selector as a `{"selector":{...}}` query document.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut constraints = Map::new();
        if let Some(doc_type) = self.doc_type {
            constraints.insert("docType".to_string(), Value::from(doc_type.as_str()));
        }
        if let Some(owner) = &self.owner {
            constraints.insert("owner".to_string(), Value::from(owner.as_str()));
        }
        for (field, value) in &self.fields {
            constraints.insert(field.clone(), value.clone());
        }
        let mut query = Map::new();
        query.insert("selector".to_string(), Value::Object(constraints));
        write!(f, "{}", Value::Object(query))
    }
}
