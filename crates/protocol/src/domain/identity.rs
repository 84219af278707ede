//! Identity Profile
//!
//! Immutable profile data released to the peer after proof of work. Loaded
//! once from a JSON file and shared read-only with the engine.

use crate::domain::command::IdentityField;
use crate::error::ProtocolViolation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sent for `SKYPE` when no account is configured
pub const SKYPE_NOT_AVAILABLE: &str = "N/A";

/// Identity loading errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to read identity file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid identity JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Identity field {field} is invalid: {reason}")]
    InvalidField { field: String, reason: &'static str },
}

/// Personal profile answered field by field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub skype: Option<String>,
    #[serde(with = "birthdate_format")]
    pub birthdate: NaiveDate,
    pub country: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
}

impl Identity {
    /// Read, parse and validate a JSON profile
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = Self::from_json(&raw)?;
        tracing::debug!(
            path = %path.display(),
            emails = identity.emails.len(),
            address_lines = identity.address_lines.len(),
            "Identity loaded"
        );
        Ok(identity)
    }

    pub fn from_json(raw: &str) -> Result<Self, IdentityError> {
        let identity: Identity = serde_json::from_str(raw)?;
        identity.validate()?;
        Ok(identity)
    }

    /// Every value goes out as part of one line, so none may contain a line break
    pub fn validate(&self) -> Result<(), IdentityError> {
        check_value("name", &self.name)?;
        check_value("country", &self.country)?;
        if let Some(skype) = &self.skype {
            check_value("skype", skype)?;
        }
        for (i, email) in self.emails.iter().enumerate() {
            check_value(&format!("emails[{i}]"), email)?;
        }
        for (i, line) in self.address_lines.iter().enumerate() {
            check_value(&format!("address_lines[{i}]"), line)?;
        }
        Ok(())
    }

    /// Value for a query field
    pub fn answer(&self, field: IdentityField) -> Result<String, ProtocolViolation> {
        let value = match field {
            IdentityField::Name => self.name.clone(),
            IdentityField::MailCount => self.emails.len().to_string(),
            IdentityField::Mail(index) => indexed(field, &self.emails, index)?.clone(),
            IdentityField::Skype => self
                .skype
                .clone()
                .unwrap_or_else(|| SKYPE_NOT_AVAILABLE.to_string()),
            IdentityField::Birthdate => self.birthdate.format(birthdate_format::FORMAT).to_string(),
            IdentityField::Country => self.country.clone(),
            IdentityField::AddressCount => self.address_lines.len().to_string(),
            IdentityField::AddressLine(index) => {
                indexed(field, &self.address_lines, index)?.clone()
            }
        };
        Ok(value)
    }
}

fn check_value(field: &str, value: &str) -> Result<(), IdentityError> {
    if value.contains(['\r', '\n']) {
        return Err(IdentityError::InvalidField {
            field: field.to_string(),
            reason: "contains a line terminator",
        });
    }
    Ok(())
}

/// 1-based lookup
fn indexed(
    field: IdentityField,
    values: &[String],
    index: usize,
) -> Result<&String, ProtocolViolation> {
    index
        .checked_sub(1)
        .and_then(|i| values.get(i))
        .ok_or_else(|| ProtocolViolation::IndexOutOfRange {
            command: field.to_string(),
            index,
            available: values.len(),
        })
}

/// `DD.MM.YYYY`
mod birthdate_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d.%m.%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
