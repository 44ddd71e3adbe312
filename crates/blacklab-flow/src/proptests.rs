// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the transition function.

use blacklab_core::message::{MAX_BUTTONS, MAX_LIST_ROWS, ids};
use blacklab_core::{
    Category, FlowState, InboundKind, OutboundIntent, Package, PackageId, PhoneNumber, UserId,
};
use chrono::Utc;
use proptest::prelude::*;

use crate::transition::{CatalogAnswer, Effect, FlowContext, Lookup, lookup_for, transition};

fn ctx() -> FlowContext {
    FlowContext {
        user: UserId::from("254700000001"),
        now: Utc::now(),
    }
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Data),
        Just(Category::Minutes),
        Just(Category::Sms)
    ]
}

fn arb_package() -> impl Strategy<Value = Package> {
    ("[0-9]{1,3}", arb_category(), "[A-Za-z0-9 ]{1,30}", 1u32..5000).prop_map(
        |(id, category, title, price)| Package {
            id: PackageId(id),
            category,
            title: format!("P {title}"),
            price,
        },
    )
}

fn arb_phone() -> impl Strategy<Value = PhoneNumber> {
    ("07|2541", "[0-9]{8}").prop_map(|(p, rest)| {
        PhoneNumber::parse(&format!("{p}{rest}")).unwrap()
    })
}

fn arb_state() -> impl Strategy<Value = FlowState> {
    prop_oneof![
        Just(FlowState::Idle),
        Just(FlowState::ChoosingCategory),
        arb_category().prop_map(|category| FlowState::ChoosingPackage { category }),
        arb_package().prop_map(|package| FlowState::AwaitingPayerNumber { package }),
        (arb_package(), arb_phone())
            .prop_map(|(package, payer)| FlowState::AwaitingRecipientNumber { package, payer }),
        (arb_package(), arb_phone(), arb_phone()).prop_map(|(package, payer, recipient)| {
            FlowState::AwaitingConfirmation {
                package,
                payer,
                recipient,
            }
        }),
    ]
}

fn arb_reply_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ids::SEE_PACKAGES.to_string()),
        Just(ids::ABOUT.to_string()),
        Just(ids::SUPPORT.to_string()),
        Just(ids::CONFIRM.to_string()),
        Just(ids::CANCEL.to_string()),
        arb_category().prop_map(|c| c.to_string()),
        "[0-9]{1,3}".prop_map(|id| format!("pkg_{id}")),
        "[a-z_]{1,12}",
    ]
}

fn arb_kind() -> impl Strategy<Value = InboundKind> {
    prop_oneof![
        arb_reply_id().prop_map(|id| InboundKind::ButtonReply { id }),
        arb_reply_id().prop_map(|id| InboundKind::ListReply { id }),
        prop_oneof![
            Just("hi".to_string()),
            Just(" MENU".to_string()),
            "(07|2541)[0-9]{8}",
            "\\PC{0,30}",
        ]
        .prop_map(|text| InboundKind::FreeText { text }),
        Just(InboundKind::Unknown),
    ]
}

/// Answers a lookup from a generated catalog.
fn answer(lookup: Option<Lookup>, catalog: &[Package], deleted: bool) -> Option<CatalogAnswer> {
    lookup.map(|l| match l {
        Lookup::Category(c) => CatalogAnswer::Packages(
            catalog.iter().filter(|p| p.category == c).cloned().collect(),
        ),
        Lookup::Package(_) if deleted => CatalogAnswer::Package(None),
        Lookup::Package(id) => CatalogAnswer::Package(catalog.iter().find(|p| p.id == id).cloned()),
    })
}

fn required_fields_present(state: &FlowState) -> bool {
    match state {
        FlowState::AwaitingPayerNumber { package } => package.validate().is_ok(),
        FlowState::AwaitingRecipientNumber { package, payer } => {
            package.validate().is_ok() && payer.as_str().len() == 12
        }
        FlowState::AwaitingConfirmation {
            package,
            payer,
            recipient,
        } => package.validate().is_ok() && payer.as_str().len() == 12 && recipient.as_str().len() == 12,
        _ => true,
    }
}

proptest! {
    /// Every (state, event) pair yields a reply and a well-formed state.
    #[test]
    fn transition_is_total(
        state in arb_state(),
        kind in arb_kind(),
        catalog in prop::collection::vec(arb_package(), 0..25),
        deleted in any::<bool>(),
    ) {
        let lookup = lookup_for(&state, &kind);
        let result = transition(&state, &kind, answer(lookup, &catalog, deleted), &ctx());
        prop_assert!(result.intents().count() >= 1);
        prop_assert!(required_fields_present(&result.new_state));
    }

    /// No intent exceeds the provider's button and row limits.
    #[test]
    fn intents_respect_size_caps(
        state in arb_state(),
        kind in arb_kind(),
        catalog in prop::collection::vec(arb_package(), 0..40),
    ) {
        let lookup = lookup_for(&state, &kind);
        let result = transition(&state, &kind, answer(lookup, &catalog, false), &ctx());
        for intent in result.intents() {
            prop_assert!(intent.button_count() <= MAX_BUTTONS);
            prop_assert!(intent.row_count() <= MAX_LIST_ROWS);
        }
    }

    /// Orders come only from a confirm tap at the confirmation step.
    #[test]
    fn order_iff_confirm_at_confirmation(state in arb_state(), kind in arb_kind()) {
        let lookup = lookup_for(&state, &kind);
        let result = transition(&state, &kind, answer(lookup, &[], false), &ctx());
        let placed = result.effects.iter().filter(|e| matches!(e, Effect::PlaceOrder(_))).count();
        let expected = matches!(state, FlowState::AwaitingConfirmation { .. })
            && matches!(&kind, InboundKind::ButtonReply { id } | InboundKind::ListReply { id } if id == ids::CONFIRM);
        prop_assert_eq!(placed, usize::from(expected));
        if expected {
            prop_assert_eq!(result.new_state, FlowState::Idle);
        }
    }

    /// Text that is not a valid number keeps an awaiting-number state as is.
    #[test]
    fn invalid_numbers_never_advance(
        package in arb_package(),
        payer in arb_phone(),
        text in "[A-Za-z ]{1,20}",
    ) {
        prop_assume!(!["menu", "hi", "hello"].contains(&text.trim().to_lowercase().as_str()));
        let kind = InboundKind::FreeText { text };
        for state in [
            FlowState::AwaitingPayerNumber { package: package.clone() },
            FlowState::AwaitingRecipientNumber { package: package.clone(), payer: payer.clone() },
        ] {
            let result = transition(&state, &kind, None, &ctx());
            prop_assert_eq!(&result.new_state, &state);
            let is_prompt = matches!(result.intents().next(), Some(OutboundIntent::PhonePrompt(_)));
            prop_assert!(is_prompt);
        }
    }
}
