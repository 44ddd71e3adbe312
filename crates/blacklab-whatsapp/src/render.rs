// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns outbound intents into Graph API message bodies.
//!
//! Reply buttons and list rows carry the ids the flow matches on
//! (`see_packages`, category names, `pkg_<id>`, `confirm`, `cancel`).
//! Display strings are truncated to the provider's length limits.

use blacklab_config::model::BusinessConfig;
use blacklab_core::message::ids;
use blacklab_core::{Category, OutboundIntent, Package, PromptReason, UserId};
use serde_json::{Value, json};

const BUTTON_TITLE_MAX: usize = 20;
const ROW_TITLE_MAX: usize = 24;
const ROW_DESCRIPTION_MAX: usize = 72;
const SECTION_TITLE_MAX: usize = 24;
const HEADER_MAX: usize = 60;
const BODY_MAX: usize = 1024;
const FOOTER_MAX: usize = 60;

/// Renders intents using the configured business texts.
#[derive(Debug, Clone)]
pub struct Renderer {
    business: BusinessConfig,
}

impl Renderer {
    pub fn new(business: BusinessConfig) -> Self {
        Self { business }
    }

    /// Full request body for `POST /{phone_number_id}/messages`.
    pub fn render(&self, to: &UserId, intent: &OutboundIntent) -> Value {
        let mut message = match intent {
            OutboundIntent::MainMenu => self.buttons(
                &format!("Welcome to {}! Choose an option:", self.business.display_name),
                &[
                    (ids::SEE_PACKAGES, "View Packages"),
                    (ids::ABOUT, "About Us"),
                    (ids::SUPPORT, "Contact Support"),
                ],
            ),
            OutboundIntent::CategoryMenu => self.buttons(
                "What would you like to buy?",
                &Category::ALL.map(|c| (c.to_string(), category_label(c))),
            ),
            OutboundIntent::PackageList {
                category,
                packages,
                page,
                pages,
            } => self.package_list(*category, packages, *page, *pages),
            OutboundIntent::PhonePrompt(reason) => text(&self.phone_prompt(reason)),
            OutboundIntent::OrderSummary {
                package,
                payer,
                recipient,
            } => text(&format!(
                "*ORDER SUMMARY*\nPackage: {}\nPrice: {}\nPay from: {payer}\nRecipient: {recipient}\n\nConfirm to receive the M-PESA STK push.",
                package.title,
                self.price(package),
            )),
            OutboundIntent::ConfirmButtons => self.buttons(
                "Confirm purchase?",
                &[(ids::CONFIRM, "Yes, Pay Now"), (ids::CANCEL, "Cancel")],
            ),
            OutboundIntent::PlainText(body) => text(body),
            OutboundIntent::OrderPlaced(order) => text(&format!(
                "Sending STK Push for *{}* ({}) to {}...\n\nYou'll receive a prompt in seconds.\n\nBundle delivered instantly after payment!",
                order.package.title,
                self.price(&order.package),
                order.payer,
            )),
            OutboundIntent::OrderCancelled => {
                text("Order cancelled. Type *menu* to start again.")
            }
            OutboundIntent::PackageUnavailable => {
                text("Sorry, that package is no longer available. Please choose a category again.")
            }
            OutboundIntent::CategoryEmpty(category) => text(&format!(
                "No {} packages are available right now. Please try another category.",
                category_label(*category)
            )),
            OutboundIntent::About => text(&format!(
                "*ABOUT {}*\n\n{}\n\nType *menu* to go back",
                self.business.display_name.to_uppercase(),
                self.business.about_text,
            )),
            OutboundIntent::Support => text(&format!(
                "*SUPPORT*\n\nWhatsApp: {}\nEmail: {}\n\nType *menu* to go back",
                self.business.support_phone, self.business.support_email,
            )),
        };

        if let Value::Object(fields) = &mut message {
            fields.insert("messaging_product".into(), json!("whatsapp"));
            fields.insert("recipient_type".into(), json!("individual"));
            fields.insert("to".into(), json!(to.as_str()));
        }
        message
    }

    fn price(&self, package: &Package) -> String {
        format!("{} {}", self.business.currency, package.price)
    }

    fn phone_prompt(&self, reason: &PromptReason) -> String {
        const PAYER: &str = "Please send the *M-PESA number* that will pay (e.g. 07xx xxx xxx).";
        const RECIPIENT: &str =
            "Now send the *phone number to receive the bundle* (e.g. 07xx xxx xxx).";
        match reason {
            PromptReason::PayerNumber => PAYER.to_string(),
            PromptReason::RecipientNumber => RECIPIENT.to_string(),
            PromptReason::InvalidPayerNumber(e) => {
                format!("That number doesn't look right: {e}.\n\n{PAYER}")
            }
            PromptReason::InvalidRecipientNumber(e) => {
                format!("That number doesn't look right: {e}.\n\n{RECIPIENT}")
            }
        }
    }

    fn buttons<I: AsRef<str>>(&self, body: &str, buttons: &[(I, &str)]) -> Value {
        let buttons: Vec<Value> = buttons
            .iter()
            .map(|(id, title)| {
                json!({
                    "type": "reply",
                    "reply": { "id": id.as_ref(), "title": truncate(title, BUTTON_TITLE_MAX) }
                })
            })
            .collect();
        json!({
            "type": "interactive",
            "interactive": {
                "type": "button",
                "body": { "text": truncate(body, BODY_MAX) },
                "footer": { "text": truncate(&self.business.footer, FOOTER_MAX) },
                "action": { "buttons": buttons }
            }
        })
    }

    fn package_list(
        &self,
        category: Category,
        packages: &[Package],
        page: usize,
        pages: usize,
    ) -> Value {
        let rows: Vec<Value> = packages
            .iter()
            .map(|p| {
                json!({
                    "id": ids::package_row(&p.id),
                    "title": truncate(&p.title, ROW_TITLE_MAX),
                    "description": truncate(&self.price(p), ROW_DESCRIPTION_MAX),
                })
            })
            .collect();
        let mut body = format!("Tap a {} package to buy instantly.", category_label(category));
        if pages > 1 {
            body.push_str(&format!(" (page {page} of {pages})"));
        }
        json!({
            "type": "interactive",
            "interactive": {
                "type": "list",
                "header": {
                    "type": "text",
                    "text": truncate(&format!("{} Packages", self.business.display_name), HEADER_MAX)
                },
                "body": { "text": body },
                "footer": { "text": truncate(&self.business.footer, FOOTER_MAX) },
                "action": {
                    "button": "Select Package",
                    "sections": [{
                        "title": truncate(category_label(category), SECTION_TITLE_MAX),
                        "rows": rows
                    }]
                }
            }
        })
    }
}

fn text(body: &str) -> Value {
    json!({
        "type": "text",
        "text": { "preview_url": false, "body": truncate(body, 4096) }
    })
}

fn category_label(category: Category) -> &'static str {
    match category {
        Category::Data => "Data Bundles",
        Category::Minutes => "Minutes",
        Category::Sms => "SMS",
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use blacklab_core::{Order, PhoneError, PhoneNumber};
    use chrono::Utc;

    use super::*;

    fn renderer() -> Renderer {
        Renderer::new(BusinessConfig::default())
    }

    fn to() -> UserId {
        UserId::from("254712345678")
    }

    fn package(id: &str, title: &str, price: u32) -> Package {
        Package::new(id, Category::Data, title, price).unwrap()
    }

    fn button_ids(v: &Value) -> Vec<String> {
        v["interactive"]["action"]["buttons"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["reply"]["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn envelope_is_addressed() {
        let v = renderer().render(&to(), &OutboundIntent::OrderCancelled);
        assert_eq!(v["messaging_product"], "whatsapp");
        assert_eq!(v["to"], "254712345678");
        assert_eq!(v["type"], "text");
        assert_eq!(v["text"]["body"], "Order cancelled. Type *menu* to start again.");
    }

    #[test]
    fn main_menu_has_three_flow_buttons() {
        let v = renderer().render(&to(), &OutboundIntent::MainMenu);
        assert_eq!(v["interactive"]["type"], "button");
        assert_eq!(button_ids(&v), vec!["see_packages", "about", "support"]);
        assert_eq!(v["interactive"]["footer"]["text"], "Instant Delivery • 24/7");
    }

    #[test]
    fn category_menu_ids_parse_as_categories() {
        let v = renderer().render(&to(), &OutboundIntent::CategoryMenu);
        let ids = button_ids(&v);
        assert_eq!(ids, vec!["data", "minutes", "sms"]);
        for id in ids {
            assert!(id.parse::<Category>().is_ok());
        }
    }

    #[test]
    fn package_list_rows_use_pkg_ids_and_limits() {
        let packages = vec![
            package("2", "3GB • 7 Days", 69),
            package("9", "A package title that is far too long for a row", 1500),
        ];
        let v = renderer().render(
            &to(),
            &OutboundIntent::PackageList {
                category: Category::Data,
                packages,
                page: 1,
                pages: 1,
            },
        );
        let interactive = &v["interactive"];
        assert_eq!(interactive["type"], "list");
        assert_eq!(interactive["header"]["text"], "BlackLab Packages");
        let rows = interactive["action"]["sections"][0]["rows"].as_array().unwrap();
        assert_eq!(rows[0]["id"], "pkg_2");
        assert_eq!(rows[0]["title"], "3GB • 7 Days");
        assert_eq!(rows[0]["description"], "KSh 69");
        let long = rows[1]["title"].as_str().unwrap();
        assert_eq!(long.chars().count(), ROW_TITLE_MAX);
        assert!(long.ends_with('…'));
        assert!(!interactive["body"]["text"].as_str().unwrap().contains("page"));
    }

    #[test]
    fn paged_lists_say_which_page() {
        let v = renderer().render(
            &to(),
            &OutboundIntent::PackageList {
                category: Category::Sms,
                packages: vec![package("1", "500 SMS", 30)],
                page: 2,
                pages: 3,
            },
        );
        let body = v["interactive"]["body"]["text"].as_str().unwrap();
        assert!(body.ends_with("(page 2 of 3)"));
    }

    #[test]
    fn invalid_number_prompt_explains_the_problem() {
        let v = renderer().render(
            &to(),
            &OutboundIntent::PhonePrompt(PromptReason::InvalidRecipientNumber(
                PhoneError::UnknownPrefix,
            )),
        );
        let body = v["text"]["body"].as_str().unwrap();
        assert!(body.contains("numbers must start with 07, 2547 or 2541"));
        assert!(body.contains("receive the bundle"));
    }

    #[test]
    fn order_texts_use_configured_currency() {
        let business = BusinessConfig {
            currency: "KES".into(),
            ..BusinessConfig::default()
        };
        let order = Order::pending(
            to(),
            package("1", "1GB • 24hrs", 29),
            PhoneNumber::parse("0712345678").unwrap(),
            PhoneNumber::parse("0798765432").unwrap(),
            Utc::now(),
        );
        let v = Renderer::new(business).render(&to(), &OutboundIntent::OrderPlaced(order));
        let body = v["text"]["body"].as_str().unwrap();
        assert!(body.contains("*1GB • 24hrs* (KES 29) to 254712345678"));
    }

    #[test]
    fn confirm_buttons_carry_flow_ids() {
        let v = renderer().render(&to(), &OutboundIntent::ConfirmButtons);
        assert_eq!(button_ids(&v), vec!["confirm", "cancel"]);
    }

    #[test]
    fn about_and_support_use_business_texts() {
        let business = BusinessConfig::default();
        let r = Renderer::new(business.clone());
        let about = r.render(&to(), &OutboundIntent::About);
        assert!(about["text"]["body"].as_str().unwrap().contains(&business.about_text));
        let support = r.render(&to(), &OutboundIntent::Support);
        let body = support["text"]["body"].as_str().unwrap();
        assert!(body.contains(&business.support_phone));
        assert!(body.contains(&business.support_email));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("•••••", 5), "•••••");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
