// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kenyan mobile number validation and normalization.
//!
//! Accepted inputs (spaces, dashes and a leading `+` are ignored):
//! - local: `07` and eight more digits (`0712345678`)
//! - international: `2547` or `2541` and eight more digits
//!
//! Every accepted number is stored in the canonical twelve-digit `2547XXXXXXXX`
//! or `2541XXXXXXXX` form. Local `06` numbers have no canonical form and are
//! rejected.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static LOCAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0(7\d{8})$").unwrap());
static INTERNATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^254([17]\d{8})$").unwrap());

/// Why a phone number was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("no number was entered")]
    Empty,

    #[error("a phone number may only contain digits")]
    InvalidCharacters,

    #[error("expected 10 digits (07XXXXXXXX) or 12 digits (2547XXXXXXXX), got {len}")]
    WrongLength { len: usize },

    #[error("numbers must start with 07, 2547 or 2541")]
    UnknownPrefix,
}

/// A validated mobile number in canonical `254XXXXXXXXX` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validates free text typed by a user and normalizes it.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let compact: String = input
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '\u{a0}'))
            .collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacters);
        }

        let subscriber = LOCAL
            .captures(digits)
            .or_else(|| INTERNATIONAL.captures(digits))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());

        match subscriber {
            Some(rest) => Ok(PhoneNumber(format!("254{rest}"))),
            None if digits.len() != 10 && digits.len() != 12 => Err(PhoneError::WrongLength {
                len: digits.len(),
            }),
            None => Err(PhoneError::UnknownPrefix),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PhoneNumber::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn local_safaricom_number_normalizes() {
        let n = PhoneNumber::parse("0712345678").unwrap();
        assert_eq!(n.as_str(), "254712345678");
    }

    #[test]
    fn international_2541_number_is_kept() {
        let n = PhoneNumber::parse("254112345678").unwrap();
        assert_eq!(n.as_str(), "254112345678");
    }

    #[test]
    fn prefixes_without_a_canonical_form_are_rejected() {
        for input in ["0112345678", "0612345678", "254612345678"] {
            assert_eq!(PhoneNumber::parse(input), Err(PhoneError::UnknownPrefix), "{input}");
        }
    }

    #[test]
    fn international_with_plus_and_spaces() {
        let n = PhoneNumber::parse(" +254 798 765 432 ").unwrap();
        assert_eq!(n.as_str(), "254798765432");
    }

    #[test]
    fn dashes_are_ignored() {
        let n = PhoneNumber::parse("0712-345-678").unwrap();
        assert_eq!(n.as_str(), "254712345678");
    }

    #[test]
    fn letters_are_rejected() {
        assert_eq!(PhoneNumber::parse("abc"), Err(PhoneError::InvalidCharacters));
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneError::Empty));
    }

    #[test]
    fn short_number_reports_length() {
        assert_eq!(
            PhoneNumber::parse("07123"),
            Err(PhoneError::WrongLength { len: 5 })
        );
    }

    #[test]
    fn landline_prefix_is_rejected() {
        assert_eq!(PhoneNumber::parse("0201234567"), Err(PhoneError::UnknownPrefix));
        assert_eq!(PhoneNumber::parse("255712345678"), Err(PhoneError::UnknownPrefix));
    }

    #[test]
    fn serde_roundtrip_rejects_invalid() {
        let json = "\"0712345678\"";
        let n: PhoneNumber = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "\"254712345678\"");
        assert!(serde_json::from_str::<PhoneNumber>("\"12\"").is_err());
    }

    proptest! {
        #[test]
        fn accepted_local_numbers_are_canonical(rest in "[0-9]{8}") {
            let input = format!("07{rest}");
            let n = PhoneNumber::parse(&input).unwrap();
            prop_assert_eq!(n.as_str(), format!("2547{rest}"));
            // Canonical form parses to itself.
            prop_assert_eq!(PhoneNumber::parse(n.as_str()).unwrap(), n);
        }

        #[test]
        fn accepted_international_numbers_are_unchanged(prefix in "[17]", rest in "[0-9]{8}") {
            let input = format!("254{prefix}{rest}");
            let n = PhoneNumber::parse(&input).unwrap();
            prop_assert_eq!(n.as_str(), input.as_str());
        }

        #[test]
        fn other_prefixes_are_rejected(local in "0[0-689][0-9]{8}", intl in "254[02-689][0-9]{8}") {
            prop_assert_eq!(PhoneNumber::parse(&local), Err(PhoneError::UnknownPrefix));
            prop_assert_eq!(PhoneNumber::parse(&intl), Err(PhoneError::UnknownPrefix));
        }

        #[test]
        fn other_lengths_are_rejected(digits in "[0-9]{0,9}|[0-9]{11}|[0-9]{13,16}") {
            prop_assert!(PhoneNumber::parse(&digits).is_err());
        }

        #[test]
        fn canonical_form_is_always_twelve_digits(input in "\\PC{0,20}") {
            if let Ok(n) = PhoneNumber::parse(&input) {
                prop_assert_eq!(n.as_str().len(), 12);
                prop_assert!(n.as_str().starts_with("2547") || n.as_str().starts_with("2541"));
            }
        }
    }
}
