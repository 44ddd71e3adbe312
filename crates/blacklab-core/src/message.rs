// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound events and outbound message intents.
//!
//! The engine only ever sees [`InboundEvent`] and produces [`OutboundIntent`];
//! turning either into provider JSON is the channel adapter's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::phone::{PhoneError, PhoneNumber};
use crate::types::{Category, MessageId, Package, UserId};

/// The provider allows at most this many reply buttons per message.
pub const MAX_BUTTONS: usize = 3;

/// The provider allows at most this many rows per list message.
pub const MAX_LIST_ROWS: usize = 10;

/// Reply-button identifiers shared by the engine and the renderer.
pub mod ids {
    pub const SEE_PACKAGES: &str = "see_packages";
    pub const ABOUT: &str = "about";
    pub const SUPPORT: &str = "support";
    pub const CONFIRM: &str = "confirm";
    pub const CANCEL: &str = "cancel";

    /// List rows for packages are `pkg_<package id>`.
    pub const PACKAGE_PREFIX: &str = "pkg_";

    pub fn package_row(id: &crate::types::PackageId) -> String {
        format!("{PACKAGE_PREFIX}{id}")
    }
}

/// A normalized webhook message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub id: MessageId,
    pub from: UserId,
    /// Provider timestamp, when the payload carried one.
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundKind {
    ButtonReply { id: String },
    ListReply { id: String },
    FreeText { text: String },
    /// Images, stickers, locations and anything else the flow cannot act on.
    Unknown,
}

impl InboundKind {
    /// The reply id for button and list taps.
    pub fn reply_id(&self) -> Option<&str> {
        match self {
            InboundKind::ButtonReply { id } | InboundKind::ListReply { id } => Some(id),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            InboundKind::FreeText { text } => Some(text),
            _ => None,
        }
    }
}

/// Why the user is being asked for a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReason {
    PayerNumber,
    RecipientNumber,
    InvalidPayerNumber(PhoneError),
    InvalidRecipientNumber(PhoneError),
}

/// Something the bot wants to say, independent of wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundIntent {
    /// Welcome text with `see_packages`, `about` and `support` buttons.
    MainMenu,
    /// One button per [`Category`].
    CategoryMenu,
    /// One page of a category's packages, at most [`MAX_LIST_ROWS`] rows.
    PackageList {
        category: Category,
        packages: Vec<Package>,
        page: usize,
        pages: usize,
    },
    PhonePrompt(PromptReason),
    OrderSummary {
        package: Package,
        payer: PhoneNumber,
        recipient: PhoneNumber,
    },
    /// `confirm` / `cancel` buttons.
    ConfirmButtons,
    PlainText(String),
    /// Payment request notice for a freshly created order.
    OrderPlaced(Order),
    OrderCancelled,
    PackageUnavailable,
    CategoryEmpty(Category),
    About,
    Support,
}

impl OutboundIntent {
    /// Splits a category's packages into list pages that respect [`MAX_LIST_ROWS`].
    pub fn package_lists(category: Category, packages: &[Package]) -> Vec<OutboundIntent> {
        let pages = packages.len().div_ceil(MAX_LIST_ROWS);
        packages
            .chunks(MAX_LIST_ROWS)
            .enumerate()
            .map(|(i, chunk)| OutboundIntent::PackageList {
                category,
                packages: chunk.to_vec(),
                page: i + 1,
                pages,
            })
            .collect()
    }

    /// Number of reply buttons this intent renders to.
    pub fn button_count(&self) -> usize {
        match self {
            OutboundIntent::MainMenu => 3,
            OutboundIntent::CategoryMenu => Category::ALL.len(),
            OutboundIntent::ConfirmButtons => 2,
            _ => 0,
        }
    }

    /// Number of list rows this intent renders to.
    pub fn row_count(&self) -> usize {
        match self {
            OutboundIntent::PackageList { packages, .. } => packages.len(),
            _ => 0,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundIntent::MainMenu => "main_menu",
            OutboundIntent::CategoryMenu => "category_menu",
            OutboundIntent::PackageList { .. } => "package_list",
            OutboundIntent::PhonePrompt(_) => "phone_prompt",
            OutboundIntent::OrderSummary { .. } => "order_summary",
            OutboundIntent::ConfirmButtons => "confirm_buttons",
            OutboundIntent::PlainText(_) => "plain_text",
            OutboundIntent::OrderPlaced(_) => "order_placed",
            OutboundIntent::OrderCancelled => "order_cancelled",
            OutboundIntent::PackageUnavailable => "package_unavailable",
            OutboundIntent::CategoryEmpty(_) => "category_empty",
            OutboundIntent::About => "about",
            OutboundIntent::Support => "support",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(n: usize) -> Vec<Package> {
        (1..=n)
            .map(|i| Package::new(i.to_string(), Category::Data, format!("Bundle {i}"), 10).unwrap())
            .collect()
    }

    #[test]
    fn small_catalog_is_one_page() {
        let lists = OutboundIntent::package_lists(Category::Data, &packages(6));
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].row_count(), 6);
    }

    #[test]
    fn large_catalog_is_split() {
        let lists = OutboundIntent::package_lists(Category::Data, &packages(23));
        assert_eq!(lists.len(), 3);
        let rows: Vec<_> = lists.iter().map(OutboundIntent::row_count).collect();
        assert_eq!(rows, vec![10, 10, 3]);
        assert!(matches!(lists[2], OutboundIntent::PackageList { page: 3, pages: 3, .. }));
    }

    #[test]
    fn empty_catalog_has_no_pages() {
        assert!(OutboundIntent::package_lists(Category::Sms, &[]).is_empty());
    }

    #[test]
    fn button_intents_fit_provider_limit() {
        for intent in [
            OutboundIntent::MainMenu,
            OutboundIntent::CategoryMenu,
            OutboundIntent::ConfirmButtons,
        ] {
            assert!(intent.button_count() <= MAX_BUTTONS);
        }
    }

    #[test]
    fn reply_id_covers_buttons_and_lists() {
        assert_eq!(
            InboundKind::ListReply { id: "pkg_3".into() }.reply_id(),
            Some("pkg_3")
        );
        assert_eq!(InboundKind::FreeText { text: "hi".into() }.reply_id(), None);
        assert_eq!(InboundKind::Unknown.text(), None);
    }
}
