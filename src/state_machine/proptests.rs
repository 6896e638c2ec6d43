//! Property-based tests for the state machine
//!
//! Events are driven through `transition` and the resulting effects applied
//! to a real `ConversationStore`, the same way the runtime does it.

use super::transition::*;
use super::*;
use crate::catalog::ModelCatalog;
use crate::generator::GenerationError;
use crate::store::{ConversationStore, Role};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("test-session", Arc::new(ModelCatalog::builtin()))
}

/// Apply the store-facing effects of a transition
fn apply(store: &mut ConversationStore, selected: &mut Option<String>, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::AppendUser { content } => {
                store.append_user(content.as_str());
            }
            Effect::AppendAssistant { content, model } => {
                store.append_assistant(content.as_str(), model.as_str());
            }
            Effect::ClearMessages => store.clear(),
            Effect::SetBusy(busy) => store.set_busy(*busy),
            Effect::SelectModel { model_id } => *selected = Some(model_id.clone()),
            Effect::RequestGeneration { .. } | Effect::NotifyReplyDone => {}
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_model() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("gpt-4-turbo".to_string()),
        Just("claude-3-opus".to_string()),
        Just("gemini-pro".to_string()),
        Just("not-in-catalog".to_string()),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        3 => ("[a-zA-Z0-9 ]{1,30}", proptest::option::weighted(0.8, arb_model()))
            .prop_map(|(text, model)| Event::UserMessage { text, model }),
        2 => "[a-zA-Z ]{0,30}".prop_map(|text| Event::GenerationComplete { text }),
        1 => "[a-z ]{1,20}".prop_map(|msg| Event::GenerationFailed {
            error: GenerationError::backend(msg),
        }),
        1 => Just(Event::Clear),
        1 => arb_model().prop_map(|model_id| Event::SelectModel { model_id }),
    ]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        arb_model().prop_map(|model| ConvState::Sending { model }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// The store's busy flag always mirrors whether a generation is outstanding
    #[test]
    fn busy_mirrors_sending_state(events in proptest::collection::vec(arb_event(), 0..40)) {
        let ctx = test_context();
        let mut state = ConvState::Idle;
        let mut store = ConversationStore::new();
        let mut selected = None;

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                apply(&mut store, &mut selected, &result.effects);
                state = result.new_state;
            }
            prop_assert_eq!(store.is_busy(), state.is_busy());
        }
    }

    /// A second send is refused for as long as a generation is outstanding
    #[test]
    fn sends_rejected_while_sending(
        model in arb_model(),
        text in "[a-z ]{1,20}",
    ) {
        let state = ConvState::Sending { model };
        let result = transition(&state, &test_context(), Event::user_message(text, Some("gpt-4-turbo")));
        prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
    }

    /// Sending without a model is always rejected with the selection error
    #[test]
    fn no_model_never_sends(state in arb_state(), text in "[a-z ]{1,20}") {
        let result = transition(&state, &test_context(), Event::UserMessage { text, model: None });
        prop_assert!(result.is_err());
        if state == ConvState::Idle {
            prop_assert_eq!(result.unwrap_err(), TransitionError::NoModelSelected);
        }
    }

    /// Every accepted send is followed by exactly one assistant message once it settles
    #[test]
    fn each_send_gets_one_reply(
        turns in proptest::collection::vec(("[a-zA-Z ]{1,20}", any::<bool>()), 1..10)
    ) {
        let ctx = test_context();
        let mut state = ConvState::Idle;
        let mut store = ConversationStore::new();
        let mut selected = None;

        for (text, fail) in &turns {
            let sent = transition(&state, &ctx, Event::user_message(text.as_str(), Some("gpt-4-turbo"))).unwrap();
            apply(&mut store, &mut selected, &sent.effects);
            prop_assert!(store.is_busy());
            prop_assert_eq!(&store.messages().last().unwrap().content, text);

            let settle_event = if *fail {
                Event::GenerationFailed { error: GenerationError::network("down") }
            } else {
                Event::GenerationComplete { text: "reply".to_string() }
            };
            let settled = transition(&sent.new_state, &ctx, settle_event).unwrap();
            apply(&mut store, &mut selected, &settled.effects);
            state = settled.new_state;

            let last = store.messages().last().unwrap();
            prop_assert_eq!(last.role, Role::Assistant);
            prop_assert_eq!(last.model.as_deref(), Some("gpt-4-turbo"));
            if *fail {
                prop_assert_eq!(last.content.as_str(), APOLOGY_MESSAGE);
            }
            prop_assert!(!store.is_busy());
        }

        prop_assert_eq!(store.len(), turns.len() * 2);
    }

    /// Clearing mid-flight empties the history, then the reply still lands
    #[test]
    fn reply_lands_after_clear(
        history in proptest::collection::vec("[a-z]{1,10}", 0..10),
        model in prop_oneof![Just("claude-3-opus"), Just("gemini-pro")],
        fail in any::<bool>(),
    ) {
        let ctx = test_context();
        let mut store = ConversationStore::new();
        let mut selected = None;
        for text in &history {
            store.append_user(text.as_str());
        }

        let sent = transition(&ConvState::Idle, &ctx, Event::user_message("question", Some(model))).unwrap();
        apply(&mut store, &mut selected, &sent.effects);
        let cleared = transition(&sent.new_state, &ctx, Event::Clear).unwrap();
        apply(&mut store, &mut selected, &cleared.effects);
        prop_assert!(store.is_empty());
        prop_assert!(store.is_busy());

        let settle_event = if fail {
            Event::GenerationFailed { error: GenerationError::network("down") }
        } else {
            Event::GenerationComplete { text: "late".to_string() }
        };
        let settled = transition(&cleared.new_state, &ctx, settle_event).unwrap();
        apply(&mut store, &mut selected, &settled.effects);

        prop_assert_eq!(store.len(), 1);
        let reply = &store.messages()[0];
        prop_assert_eq!(reply.role, Role::Assistant);
        prop_assert_eq!(reply.model.as_deref(), Some(model));
        prop_assert!(!store.is_busy());
    }

    /// Clear empties the history from any state and any length
    #[test]
    fn clear_always_empties(state in arb_state(), n in 0usize..20) {
        let mut store = ConversationStore::new();
        let mut selected = None;
        for i in 0..n {
            store.append_user(format!("m{i}"));
        }

        let result = transition(&state, &test_context(), Event::Clear).unwrap();
        apply(&mut store, &mut selected, &result.effects);
        prop_assert!(store.is_empty());
        prop_assert_eq!(result.new_state.is_busy(), state.is_busy());
    }

    /// Selection never changes the lifecycle state
    #[test]
    fn selection_preserves_state(state in arb_state(), model_id in arb_model()) {
        let known = test_context().catalog.contains(&model_id);
        match transition(&state, &test_context(), Event::SelectModel { model_id }) {
            Ok(result) => {
                prop_assert!(known);
                prop_assert_eq!(result.new_state, state);
            }
            Err(e) => {
                prop_assert!(!known);
                prop_assert_eq!(e.code(), "unknown_model");
            }
        }
    }
}
