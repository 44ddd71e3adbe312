// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common identifiers and catalog types shared by every crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BlacklabError;

/// A WhatsApp user, keyed by the sender's phone number as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

/// Provider-assigned message identifier (`wamid.*` for the Cloud API).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque catalog identifier of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageId {
    fn from(value: &str) -> Self {
        PackageId(value.to_string())
    }
}

/// The three kinds of bundle the reseller sells.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Data,
    Minutes,
    Sms,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Category; 3] = [Category::Data, Category::Minutes, Category::Sms];
}

/// A purchasable offer.
///
/// Prices are whole units of the configured currency (KSh by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub category: Category,
    pub title: String,
    pub price: u32,
}

impl Package {
    /// Builds a package, enforcing a non-empty title and a positive price.
    pub fn new(
        id: impl Into<String>,
        category: Category,
        title: impl Into<String>,
        price: u32,
    ) -> Result<Self, BlacklabError> {
        let package = Package {
            id: PackageId(id.into()),
            category,
            title: title.into(),
            price,
        };
        package.validate()?;
        Ok(package)
    }

    /// Checks the catalog invariants on an already-built record.
    pub fn validate(&self) -> Result<(), BlacklabError> {
        if self.id.0.trim().is_empty() {
            return Err(BlacklabError::InvalidPackage("id must not be empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(BlacklabError::InvalidPackage(format!(
                "package {} has an empty title",
                self.id
            )));
        }
        if self.price == 0 {
            return Err(BlacklabError::InvalidPackage(format!(
                "package {} must have a positive price",
                self.id
            )));
        }
        Ok(())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn category_display_and_parse_are_lowercase() {
        for category in Category::ALL {
            let s = category.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(Category::from_str(&s).unwrap(), category);
        }
        assert!(Category::from_str("airtime").is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Minutes).unwrap();
        assert_eq!(json, "\"minutes\"");
    }

    #[test]
    fn package_rejects_zero_price() {
        let err = Package::new("1", Category::Data, "1GB", 0).unwrap_err();
        assert!(matches!(err, BlacklabError::InvalidPackage(_)));
    }

    #[test]
    fn package_rejects_blank_title() {
        assert!(Package::new("1", Category::Data, "   ", 29).is_err());
    }

    #[test]
    fn package_accepts_valid_record() {
        let pkg = Package::new("3", Category::Data, "10GB • 30 Days", 179).unwrap();
        assert_eq!(pkg.id, PackageId::from("3"));
        assert_eq!(pkg.price, 179);
    }
}
