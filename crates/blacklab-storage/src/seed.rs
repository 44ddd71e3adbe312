// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starter catalog loaded by `blacklab catalog seed`.

use blacklab_core::{Category, Package, PackageId};

/// The default bundles a fresh deployment sells.
pub fn default_packages() -> Vec<Package> {
    [
        ("1", Category::Data, "1GB • 24hrs", 29),
        ("2", Category::Data, "3GB • 7 Days", 69),
        ("3", Category::Data, "10GB • 30 Days", 179),
        ("4", Category::Data, "Unlimited Night", 49),
        ("5", Category::Minutes, "100 Minutes", 50),
        ("6", Category::Sms, "500 SMS", 30),
    ]
    .into_iter()
    .map(|(id, category, title, price)| Package {
        id: PackageId::from(id),
        category,
        title: title.to_string(),
        price,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn defaults_are_valid_and_unique() {
        let packages = default_packages();
        assert_eq!(packages.len(), 6);
        let ids: HashSet<_> = packages.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), packages.len());
        for p in &packages {
            p.validate().unwrap();
        }
    }

    #[test]
    fn every_category_has_a_default() {
        let packages = default_packages();
        for category in Category::ALL {
            assert!(packages.iter().any(|p| p.category == category));
        }
    }
}
