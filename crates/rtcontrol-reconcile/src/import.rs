// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Composite import identifiers.
//!
//! An existing remote object is attached to by a comma separated identifier,
//! e.g. `"<app_id>,<rule_id>"` for a rule or `"<id>"` for an app. Each kind
//! supplies the ordered field names; parts are assigned positionally.

use thiserror::Error;

/// Separator between identifier parts.
pub const DELIMITER: char = ',';

/// Malformed import identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("'{identifier}' has {found} part(s), expected {expected} ({fields})")]
    Arity {
        identifier: String,
        expected: usize,
        found: usize,
        fields: String,
    },

    #[error("'{identifier}' has an empty value for '{field}'")]
    EmptyPart { identifier: String, field: String },
}

/// Field name to value mapping produced by [`parse`], in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFields {
    entries: Vec<(String, String)>,
}

impl ImportFields {
    /// Value of the named field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `identifier` on [`DELIMITER`] and pair the parts with `fields`.
pub fn parse(identifier: &str, fields: &[&str]) -> Result<ImportFields, ImportError> {
    let parts: Vec<&str> = identifier.split(DELIMITER).collect();

    if parts.len() != fields.len() {
        return Err(ImportError::Arity {
            identifier: identifier.to_string(),
            expected: fields.len(),
            found: parts.len(),
            fields: fields.join(","),
        });
    }

    if let Some((field, _)) = fields.iter().zip(&parts).find(|(_, part)| part.is_empty()) {
        return Err(ImportError::EmptyPart {
            identifier: identifier.to_string(),
            field: field.to_string(),
        });
    }

    Ok(ImportFields {
        entries: fields
            .iter()
            .zip(parts)
            .map(|(field, part)| (field.to_string(), part.to_string()))
            .collect(),
    })
}
