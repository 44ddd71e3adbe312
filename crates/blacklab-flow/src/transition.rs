// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ordering flow as a pure function.
//!
//! Catalog reads are the only input the flow needs from outside. The engine
//! asks [`lookup_for`] what to fetch, performs the read, and hands the answer
//! to [`transition`], which never does I/O.

use blacklab_core::message::ids;
use blacklab_core::{
    Category, FlowState, InboundKind, Order, OutboundIntent, Package, PackageId, PhoneNumber,
    PromptReason, UserId,
};
use chrono::{DateTime, Utc};

/// Texts that restart the conversation from any state.
const RESET_KEYWORDS: &[&str] = &["menu", "hi", "hello"];

/// Work the engine performs after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist a new order. Runs before any message about it is sent.
    PlaceOrder(Order),
    Send(OutboundIntent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: FlowState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: FlowState) -> Self {
        Self {
            new_state: state,
            effects: Vec::new(),
        }
    }

    pub fn send(mut self, intent: OutboundIntent) -> Self {
        self.effects.push(Effect::Send(intent));
        self
    }

    pub fn send_all(mut self, intents: impl IntoIterator<Item = OutboundIntent>) -> Self {
        self.effects.extend(intents.into_iter().map(Effect::Send));
        self
    }

    pub fn place_order(mut self, order: Order) -> Self {
        self.effects.push(Effect::PlaceOrder(order));
        self
    }

    /// Outbound intents in send order.
    pub fn intents(&self) -> impl Iterator<Item = &OutboundIntent> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Send(intent) => Some(intent),
            Effect::PlaceOrder(_) => None,
        })
    }

    pub fn order(&self) -> Option<&Order> {
        self.effects.iter().find_map(|e| match e {
            Effect::PlaceOrder(order) => Some(order),
            Effect::Send(_) => None,
        })
    }
}

/// A catalog read the transition depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Category(Category),
    Package(PackageId),
}

/// The result of a [`Lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogAnswer {
    Packages(Vec<Package>),
    Package(Option<Package>),
}

/// Who the event is from and when it is being processed.
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub user: UserId,
    pub now: DateTime<Utc>,
}

/// What the user meant, independent of state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input<'a> {
    Reset,
    Reply(&'a str),
    Text(&'a str),
    Other,
}

fn classify(kind: &InboundKind) -> Input<'_> {
    match kind {
        InboundKind::FreeText { text } => {
            let normalized = text.trim().to_lowercase();
            if RESET_KEYWORDS.contains(&normalized.as_str()) {
                Input::Reset
            } else {
                Input::Text(text)
            }
        }
        InboundKind::ButtonReply { id } | InboundKind::ListReply { id } => Input::Reply(id),
        InboundKind::Unknown => Input::Other,
    }
}

fn reply_category(id: &str) -> Option<Category> {
    id.parse().ok()
}

/// List rows carry `pkg_<id>`; a bare id is accepted too.
fn reply_package(id: &str) -> PackageId {
    PackageId(id.strip_prefix(ids::PACKAGE_PREFIX).unwrap_or(id).to_string())
}

/// The catalog read needed to handle `kind` in `state`, if any.
pub fn lookup_for(state: &FlowState, kind: &InboundKind) -> Option<Lookup> {
    match (state, classify(kind)) {
        (_, Input::Reset) => None,
        (FlowState::ChoosingCategory, Input::Reply(id)) => reply_category(id).map(Lookup::Category),
        (FlowState::ChoosingPackage { category }, input) => match input {
            Input::Reply(id) => Some(match reply_category(id) {
                Some(other) => Lookup::Category(other),
                None => Lookup::Package(reply_package(id)),
            }),
            // Reprompt shows the list again.
            _ => Some(Lookup::Category(*category)),
        },
        _ => None,
    }
}

/// Computes the next state and the effects for one inbound event.
///
/// Total over every `(state, event)` pair. Input that does not fit the
/// current state repeats that state's question instead of jumping elsewhere.
/// `answer` is the result of [`lookup_for`]; a missing answer is treated as
/// an empty catalog.
pub fn transition(
    state: &FlowState,
    kind: &InboundKind,
    answer: Option<CatalogAnswer>,
    ctx: &FlowContext,
) -> TransitionResult {
    let input = classify(kind);
    if input == Input::Reset {
        return TransitionResult::new(FlowState::Idle).send(OutboundIntent::MainMenu);
    }

    match state {
        FlowState::Idle => match input {
            Input::Reply(ids::SEE_PACKAGES) => {
                TransitionResult::new(FlowState::ChoosingCategory).send(OutboundIntent::CategoryMenu)
            }
            Input::Reply(ids::ABOUT) => {
                TransitionResult::new(FlowState::Idle).send(OutboundIntent::About)
            }
            Input::Reply(ids::SUPPORT) => {
                TransitionResult::new(FlowState::Idle).send(OutboundIntent::Support)
            }
            _ => TransitionResult::new(FlowState::Idle).send(OutboundIntent::MainMenu),
        },

        FlowState::ChoosingCategory => match input {
            Input::Reply(id) => match reply_category(id) {
                Some(category) => show_category(category, answer),
                None => reprompt(state),
            },
            _ => reprompt(state),
        },

        FlowState::ChoosingPackage { category } => match input {
            Input::Reply(id) => match (reply_category(id), answer) {
                (Some(other), answer) => show_category(other, answer),
                (None, Some(CatalogAnswer::Package(Some(package)))) => {
                    TransitionResult::new(FlowState::AwaitingPayerNumber { package })
                        .send(OutboundIntent::PhonePrompt(PromptReason::PayerNumber))
                }
                (None, _) => TransitionResult::new(FlowState::ChoosingCategory)
                    .send(OutboundIntent::PackageUnavailable)
                    .send(OutboundIntent::CategoryMenu),
            },
            _ => show_category(*category, answer),
        },

        FlowState::AwaitingPayerNumber { package } => match input {
            Input::Text(text) => match PhoneNumber::parse(text) {
                Ok(payer) => TransitionResult::new(FlowState::AwaitingRecipientNumber {
                    package: package.clone(),
                    payer,
                })
                .send(OutboundIntent::PhonePrompt(PromptReason::RecipientNumber)),
                Err(e) => TransitionResult::new(state.clone())
                    .send(OutboundIntent::PhonePrompt(PromptReason::InvalidPayerNumber(e))),
            },
            _ => reprompt(state),
        },

        FlowState::AwaitingRecipientNumber { package, payer } => match input {
            Input::Text(text) => match PhoneNumber::parse(text) {
                Ok(recipient) => {
                    let next = FlowState::AwaitingConfirmation {
                        package: package.clone(),
                        payer: payer.clone(),
                        recipient,
                    };
                    reprompt(&next)
                }
                Err(e) => TransitionResult::new(state.clone()).send(OutboundIntent::PhonePrompt(
                    PromptReason::InvalidRecipientNumber(e),
                )),
            },
            _ => reprompt(state),
        },

        FlowState::AwaitingConfirmation {
            package,
            payer,
            recipient,
        } => match input {
            Input::Reply(ids::CONFIRM) => {
                let order = Order::pending(
                    ctx.user.clone(),
                    package.clone(),
                    payer.clone(),
                    recipient.clone(),
                    ctx.now,
                );
                TransitionResult::new(FlowState::Idle)
                    .place_order(order.clone())
                    .send(OutboundIntent::OrderPlaced(order))
            }
            Input::Reply(ids::CANCEL) => {
                TransitionResult::new(FlowState::Idle).send(OutboundIntent::OrderCancelled)
            }
            _ => reprompt(state),
        },
    }
}

/// Enters `ChoosingPackage` for `category`, or stays in category selection
/// when it has nothing to sell.
fn show_category(category: Category, answer: Option<CatalogAnswer>) -> TransitionResult {
    let packages = match answer {
        Some(CatalogAnswer::Packages(packages)) => packages,
        _ => Vec::new(),
    };
    if packages.is_empty() {
        return TransitionResult::new(FlowState::ChoosingCategory)
            .send(OutboundIntent::CategoryEmpty(category))
            .send(OutboundIntent::CategoryMenu);
    }
    TransitionResult::new(FlowState::ChoosingPackage { category })
        .send_all(OutboundIntent::package_lists(category, &packages))
}

/// Repeats the question of `state` without changing it.
///
/// `ChoosingPackage` needs the catalog; here it falls back to the category menu.
pub(crate) fn reprompt(state: &FlowState) -> TransitionResult {
    let result = TransitionResult::new(state.clone());
    match state {
        FlowState::Idle => result.send(OutboundIntent::MainMenu),
        FlowState::ChoosingCategory | FlowState::ChoosingPackage { .. } => {
            result.send(OutboundIntent::CategoryMenu)
        }
        FlowState::AwaitingPayerNumber { .. } => {
            result.send(OutboundIntent::PhonePrompt(PromptReason::PayerNumber))
        }
        FlowState::AwaitingRecipientNumber { .. } => {
            result.send(OutboundIntent::PhonePrompt(PromptReason::RecipientNumber))
        }
        FlowState::AwaitingConfirmation {
            package,
            payer,
            recipient,
        } => result
            .send(OutboundIntent::OrderSummary {
                package: package.clone(),
                payer: payer.clone(),
                recipient: recipient.clone(),
            })
            .send(OutboundIntent::ConfirmButtons),
    }
}

#[cfg(test)]
mod tests {
    use blacklab_core::PhoneError;

    use super::*;

    fn ctx() -> FlowContext {
        FlowContext {
            user: UserId::from("254700000001"),
            now: Utc::now(),
        }
    }

    fn text(t: &str) -> InboundKind {
        InboundKind::FreeText { text: t.into() }
    }

    fn button(id: &str) -> InboundKind {
        InboundKind::ButtonReply { id: id.into() }
    }

    fn list(id: &str) -> InboundKind {
        InboundKind::ListReply { id: id.into() }
    }

    fn pkg() -> Package {
        Package::new("3", Category::Data, "10GB Monthly", 179).unwrap()
    }

    fn phone(s: &str) -> PhoneNumber {
        PhoneNumber::parse(s).unwrap()
    }

    fn run(state: &FlowState, kind: InboundKind, answer: Option<CatalogAnswer>) -> TransitionResult {
        transition(state, &kind, answer, &ctx())
    }

    #[test]
    fn hi_in_idle_shows_main_menu() {
        let r = run(&FlowState::Idle, text("hi"), None);
        assert_eq!(r.new_state, FlowState::Idle);
        assert_eq!(r.intents().collect::<Vec<_>>(), vec![&OutboundIntent::MainMenu]);
    }

    #[test]
    fn reset_keywords_ignore_case_and_whitespace() {
        let state = FlowState::AwaitingPayerNumber { package: pkg() };
        let r = run(&state, text("  MENU "), None);
        assert_eq!(r.new_state, FlowState::Idle);
        assert_eq!(r.intents().next(), Some(&OutboundIntent::MainMenu));
        assert!(lookup_for(&state, &text("Hello")).is_none());
    }

    #[test]
    fn see_packages_opens_category_menu() {
        let r = run(&FlowState::Idle, button("see_packages"), None);
        assert_eq!(r.new_state, FlowState::ChoosingCategory);
        let intents: Vec<_> = r.intents().collect();
        assert_eq!(intents, vec![&OutboundIntent::CategoryMenu]);
        assert_eq!(intents[0].button_count(), 3);
    }

    #[test]
    fn about_and_support_stay_idle() {
        let r = run(&FlowState::Idle, button("about"), None);
        assert_eq!(r.new_state, FlowState::Idle);
        assert_eq!(r.intents().next(), Some(&OutboundIntent::About));
        let r = run(&FlowState::Idle, button("support"), None);
        assert_eq!(r.intents().next(), Some(&OutboundIntent::Support));
    }

    #[test]
    fn category_choice_needs_lookup_and_lists_packages() {
        let state = FlowState::ChoosingCategory;
        assert_eq!(
            lookup_for(&state, &button("data")),
            Some(Lookup::Category(Category::Data))
        );
        let r = run(
            &state,
            button("data"),
            Some(CatalogAnswer::Packages(vec![pkg()])),
        );
        assert_eq!(
            r.new_state,
            FlowState::ChoosingPackage {
                category: Category::Data
            }
        );
        assert!(matches!(
            r.intents().next(),
            Some(OutboundIntent::PackageList { packages, .. }) if packages.len() == 1
        ));
    }

    #[test]
    fn empty_category_stays_in_category_menu() {
        let r = run(
            &FlowState::ChoosingCategory,
            button("sms"),
            Some(CatalogAnswer::Packages(vec![])),
        );
        assert_eq!(r.new_state, FlowState::ChoosingCategory);
        let intents: Vec<_> = r.intents().cloned().collect();
        assert_eq!(
            intents,
            vec![
                OutboundIntent::CategoryEmpty(Category::Sms),
                OutboundIntent::CategoryMenu
            ]
        );
    }

    #[test]
    fn unknown_category_reprompts() {
        let r = run(&FlowState::ChoosingCategory, button("airtime"), None);
        assert_eq!(r.new_state, FlowState::ChoosingCategory);
        assert_eq!(r.intents().next(), Some(&OutboundIntent::CategoryMenu));
    }

    #[test]
    fn package_pick_snapshots_package() {
        let state = FlowState::ChoosingPackage {
            category: Category::Data,
        };
        assert_eq!(
            lookup_for(&state, &list("pkg_3")),
            Some(Lookup::Package(PackageId::from("3")))
        );
        let r = run(
            &state,
            list("pkg_3"),
            Some(CatalogAnswer::Package(Some(pkg()))),
        );
        assert_eq!(r.new_state, FlowState::AwaitingPayerNumber { package: pkg() });
        assert_eq!(
            r.intents().next(),
            Some(&OutboundIntent::PhonePrompt(PromptReason::PayerNumber))
        );
    }

    #[test]
    fn deleted_package_returns_to_categories() {
        let state = FlowState::ChoosingPackage {
            category: Category::Data,
        };
        let r = run(&state, list("pkg_9"), Some(CatalogAnswer::Package(None)));
        assert_eq!(r.new_state, FlowState::ChoosingCategory);
        let intents: Vec<_> = r.intents().cloned().collect();
        assert_eq!(
            intents,
            vec![OutboundIntent::PackageUnavailable, OutboundIntent::CategoryMenu]
        );
    }

    #[test]
    fn free_text_while_choosing_package_reshows_list() {
        let state = FlowState::ChoosingPackage {
            category: Category::Minutes,
        };
        assert_eq!(
            lookup_for(&state, &text("what?")),
            Some(Lookup::Category(Category::Minutes))
        );
        let five = Package::new("5", Category::Minutes, "100 Minutes", 50).unwrap();
        let r = run(
            &state,
            text("what?"),
            Some(CatalogAnswer::Packages(vec![five])),
        );
        assert_eq!(r.new_state, state);
        assert!(matches!(
            r.intents().next(),
            Some(OutboundIntent::PackageList { .. })
        ));
    }

    #[test]
    fn valid_payer_number_is_normalized() {
        let state = FlowState::AwaitingPayerNumber { package: pkg() };
        let r = run(&state, text("0712345678"), None);
        assert_eq!(
            r.new_state,
            FlowState::AwaitingRecipientNumber {
                package: pkg(),
                payer: phone("254712345678"),
            }
        );
        assert_eq!(
            r.intents().next(),
            Some(&OutboundIntent::PhonePrompt(PromptReason::RecipientNumber))
        );
    }

    #[test]
    fn invalid_payer_number_reprompts_without_mutation() {
        let state = FlowState::AwaitingPayerNumber { package: pkg() };
        let r = run(&state, text("abc"), None);
        assert_eq!(r.new_state, state);
        assert_eq!(
            r.intents().next(),
            Some(&OutboundIntent::PhonePrompt(
                PromptReason::InvalidPayerNumber(PhoneError::InvalidCharacters)
            ))
        );
    }

    #[test]
    fn recipient_number_leads_to_summary_and_buttons() {
        let state = FlowState::AwaitingRecipientNumber {
            package: pkg(),
            payer: phone("0712345678"),
        };
        let r = run(&state, text("0798765432"), None);
        assert!(matches!(r.new_state, FlowState::AwaitingConfirmation { .. }));
        let intents: Vec<_> = r.intents().collect();
        assert!(matches!(intents[0], OutboundIntent::OrderSummary { .. }));
        assert_eq!(intents[1], &OutboundIntent::ConfirmButtons);
    }

    #[test]
    fn confirm_places_exactly_one_pending_order() {
        let state = FlowState::AwaitingConfirmation {
            package: pkg(),
            payer: phone("254712345678"),
            recipient: phone("254798765432"),
        };
        let r = run(&state, button("confirm"), None);
        assert_eq!(r.new_state, FlowState::Idle);
        let order = r.order().expect("order placed");
        assert_eq!(order.package.price, 179);
        assert_eq!(order.payer.as_str(), "254712345678");
        assert_eq!(order.recipient.as_str(), "254798765432");
        assert_eq!(order.status, blacklab_core::OrderStatus::Pending);
        // The order is persisted before the user is told about it.
        assert!(matches!(r.effects[0], Effect::PlaceOrder(_)));
        assert!(matches!(r.effects[1], Effect::Send(OutboundIntent::OrderPlaced(_))));
    }

    #[test]
    fn cancel_places_no_order() {
        let state = FlowState::AwaitingConfirmation {
            package: pkg(),
            payer: phone("254712345678"),
            recipient: phone("254798765432"),
        };
        let r = run(&state, button("cancel"), None);
        assert_eq!(r.new_state, FlowState::Idle);
        assert!(r.order().is_none());
        assert_eq!(r.intents().next(), Some(&OutboundIntent::OrderCancelled));
    }

    #[test]
    fn stray_input_at_confirmation_repeats_summary() {
        let state = FlowState::AwaitingConfirmation {
            package: pkg(),
            payer: phone("254712345678"),
            recipient: phone("254798765432"),
        };
        let r = run(&state, text("yes please"), None);
        assert_eq!(r.new_state, state);
        assert!(r.order().is_none());
        assert_eq!(r.intents().count(), 2);
    }
}
