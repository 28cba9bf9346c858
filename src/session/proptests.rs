//! Property-based tests for the session state machine
//!
//! States are reached by folding random step sequences from an empty
//! session, so every generated state is one the runtime could really hold.

use super::state::*;
use super::transition::*;
use super::*;
use crate::contract::{
    Ack, Category, ClassificationResult, ContractError, EmailFile, RetrainOutcome,
    SuggestedAction,
};
use proptest::prelude::*;

// ============================================================================
// Steps
// ============================================================================

/// A user intent or a backend completion. Completions pick up the live
/// token from the state they are applied to, unless they are stale.
#[derive(Debug, Clone)]
enum Step {
    SetText(String),
    SetFile(String),
    Classify,
    ClassifyOk(ClassificationResult),
    ClassifyErr(ContractError),
    SetCorrected(Option<Category>),
    SetReply(String),
    SendFeedback,
    FeedbackDone(Result<Ack, ContractError>),
    Retrain,
    RetrainDone(Result<RetrainOutcome, ContractError>),
    Restart,
}

impl Step {
    fn to_event(&self, state: &SessionState) -> Event {
        match self.clone() {
            Step::SetText(text) => Event::SetText { text },
            Step::SetFile(name) => Event::SetFile {
                file: EmailFile::new(name, b"Subject: hi".to_vec()),
            },
            Step::Classify => Event::Classify,
            Step::ClassifyOk(result) => Event::ClassifyCompleted {
                generation: state.generation,
                outcome: Ok(result),
            },
            Step::ClassifyErr(e) => Event::ClassifyCompleted {
                generation: state.generation,
                outcome: Err(e),
            },
            Step::SetCorrected(category) => {
                Event::EditCorrection(CorrectionEdit::category(category))
            }
            Step::SetReply(reply) => Event::EditCorrection(CorrectionEdit::reply(reply)),
            Step::SendFeedback => Event::SendFeedback,
            Step::FeedbackDone(outcome) => Event::FeedbackCompleted {
                epoch: state.epoch,
                generation: state.generation,
                outcome,
            },
            Step::Retrain => Event::Retrain,
            Step::RetrainDone(outcome) => Event::RetrainCompleted {
                epoch: state.epoch,
                generation: state.generation,
                outcome,
            },
            Step::Restart => Event::Restart,
        }
    }
}

/// Apply an event the way the runtime does: rejected intents leave state alone
fn step(state: &SessionState, event: Event) -> (SessionState, Vec<Effect>) {
    match transition(state, event) {
        Ok(result) => (result.new_state, result.effects),
        Err(_) => (state.clone(), vec![]),
    }
}

fn run(steps: &[Step]) -> SessionState {
    steps.iter().fold(SessionState::new(), |state, s| {
        let event = s.to_event(&state);
        step(&state, event).0
    })
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Produtivo),
        Just(Category::Improdutivo),
        "[A-Z][a-z]{2,8}".prop_map(Category::from),
    ]
}

fn arb_result() -> impl Strategy<Value = ClassificationResult> {
    (
        arb_category(),
        0.0f64..=1.0,
        proptest::collection::vec("[a-z]{3,8}", 0..3),
        proptest::collection::vec("[a-z]{3,8}".prop_map(SuggestedAction::new), 0..3),
        "[A-Za-z .]{0,30}",
    )
        .prop_map(
            |(category, confidence, signals, actions, suggested_reply)| ClassificationResult {
                category,
                confidence,
                signals,
                actions,
                suggested_reply,
            },
        )
}

fn arb_contract_error() -> impl Strategy<Value = ContractError> {
    prop_oneof![
        (400u16..600).prop_map(|status| ContractError::Http { status }),
        "[a-z ]{1,20}".prop_map(ContractError::server),
        Just(ContractError::NothingToTrain),
        "[a-z ]{1,20}".prop_map(ContractError::transport),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[ ]{0,2}[A-Za-z][A-Za-z ]{0,30}",
    ]
}

fn arb_intent() -> impl Strategy<Value = Step> {
    prop_oneof![
        arb_text().prop_map(Step::SetText),
        prop_oneof![Just("mail.txt"), Just("mail.pdf"), Just("mail.eml")]
            .prop_map(|name| Step::SetFile(name.to_string())),
        Just(Step::Classify),
        proptest::option::of(arb_category()).prop_map(Step::SetCorrected),
        "[A-Za-z ]{0,20}".prop_map(Step::SetReply),
        Just(Step::SendFeedback),
        Just(Step::Retrain),
        Just(Step::Restart),
    ]
}

fn arb_completion() -> impl Strategy<Value = Step> {
    prop_oneof![
        arb_result().prop_map(Step::ClassifyOk),
        arb_contract_error().prop_map(Step::ClassifyErr),
        Just(Step::FeedbackDone(Ok(Ack))),
        arb_contract_error().prop_map(|e| Step::FeedbackDone(Err(e))),
        Just(Step::RetrainDone(Ok(RetrainOutcome))),
        arb_contract_error().prop_map(|e| Step::RetrainDone(Err(e))),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![3 => arb_intent(), 2 => arb_completion()]
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    proptest::collection::vec(arb_step(), 0..25)
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    arb_steps().prop_map(|steps| run(&steps))
}

/// A state that holds a result
fn arb_classified_state() -> impl Strategy<Value = SessionState> {
    (arb_steps(), "[A-Za-z]{1,20}", arb_result()).prop_map(|(steps, text, result)| {
        let mut all = vec![Step::SetText(text), Step::Classify, Step::ClassifyOk(result)];
        // the remaining steps cannot leave Classified
        all.extend(steps.into_iter().filter(|s| {
            !matches!(
                s,
                Step::Classify | Step::Restart | Step::ClassifyOk(_) | Step::ClassifyErr(_)
            )
        }));
        run(&all)
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_file_and_text_are_mutually_exclusive(state in arb_state(), text in arb_text()) {
        let with_file = step(
            &state,
            Event::SetFile { file: EmailFile::new("mail.txt", b"x".to_vec()) },
        ).0;
        prop_assert!(with_file.input.file().is_some());
        prop_assert_eq!(with_file.input.text(), "");

        let with_text = step(&with_file, Event::SetText { text: text.clone() }).0;
        prop_assert!(with_text.input.file().is_none());
        prop_assert_eq!(with_text.input.text(), text.as_str());
    }

    #[test]
    fn prop_blank_input_never_reaches_backend(state in arb_state(), blank in "[ \t\n]{0,4}") {
        let state = step(&state, Event::SetText { text: blank }).0;
        let (_, effects) = step(&state, Event::Classify);
        prop_assert!(!effects.iter().any(Effect::is_backend_call));
    }

    #[test]
    fn prop_at_most_one_classify_in_flight(steps in arb_steps()) {
        let mut state = SessionState::new();
        for s in &steps {
            let was_classifying = state.is_classifying();
            let (next, effects) = step(&state, s.to_event(&state));
            let starts = effects.iter().filter(|e| matches!(e, Effect::Classify { .. })).count();
            prop_assert!(starts <= 1);
            if starts == 1 {
                prop_assert!(!was_classifying, "classify started while one was in flight");
            }
            state = next;
        }
    }

    #[test]
    fn prop_original_text_is_the_text_sent(steps in arb_steps()) {
        let mut state = SessionState::new();
        let mut sent: Option<String> = None;
        for s in &steps {
            let (next, effects) = step(&state, s.to_event(&state));
            for effect in &effects {
                if let Effect::Classify { input, .. } = effect {
                    let payload = input.to_payload().expect("only valid drafts are sent");
                    sent = Some(payload.original_text().to_string());
                }
            }
            let became_classified = state.is_classifying() && next.result().is_some();
            if became_classified {
                prop_assert_eq!(
                    Some(next.feedback().unwrap().original_text.clone()),
                    sent.clone()
                );
            }
            state = next;
        }
    }

    #[test]
    fn prop_restart_yields_empty(state in arb_state()) {
        match transition(&state, Event::Restart) {
            Ok(result) => {
                prop_assert_eq!(result.new_state.status(), SessionStatus::Empty);
                prop_assert_eq!(
                    SessionSnapshot::from_state(&result.new_state),
                    SessionSnapshot::default()
                );
                prop_assert!(result.new_state.generation > state.generation);
                prop_assert!(result.new_state.epoch > state.epoch);
            }
            Err(e) => {
                prop_assert!(state.is_classifying());
                prop_assert_eq!(e, TransitionError::ClassifyInFlight);
            }
        }
    }

    #[test]
    fn prop_pre_restart_responses_do_not_mutate(
        before in arb_steps(),
        after in arb_steps(),
        result in arb_result(),
    ) {
        // something in flight, then restart once nothing is classifying
        let mut steps = before;
        steps.push(Step::SendFeedback);
        steps.push(Step::Retrain);
        let state = run(&steps);
        let old_epoch = state.epoch;
        let old_generation = state.generation;

        let state = if state.is_classifying() {
            step(&state, Step::ClassifyErr(ContractError::server("x")).to_event(&state)).0
        } else {
            state
        };
        let state = step(&state, Event::Restart).0;
        let state = after.iter().fold(state, |st, s| {
            let event = s.to_event(&st);
            step(&st, event).0
        });

        for late in [
            Event::FeedbackCompleted {
                epoch: old_epoch,
                generation: old_generation,
                outcome: Ok(Ack),
            },
            Event::RetrainCompleted {
                epoch: old_epoch,
                generation: old_generation,
                outcome: Ok(RetrainOutcome),
            },
            Event::ClassifyCompleted { generation: old_generation, outcome: Ok(result.clone()) },
        ] {
            let outcome = transition(&state, late).unwrap();
            prop_assert!(outcome.is_noop());
            prop_assert_eq!(&outcome.new_state, &state);
        }
    }

    #[test]
    fn prop_correction_edits_are_idempotent(
        state in arb_classified_state(),
        category in proptest::option::of(arb_category()),
        reply in "[A-Za-z ]{0,20}",
    ) {
        prop_assume!(state.result().is_some());

        let edit = CorrectionEdit::category(category);
        let once = step(&state, Event::EditCorrection(edit.clone())).0;
        let twice = step(&once, Event::EditCorrection(edit)).0;
        prop_assert_eq!(&once, &twice);

        let edit = CorrectionEdit::reply(reply);
        let once = step(&twice, Event::EditCorrection(edit.clone())).0;
        let twice = step(&once, Event::EditCorrection(edit)).0;
        prop_assert_eq!(&once, &twice);

        // edits only touch the draft
        prop_assert_eq!(once.result(), state.result());
        prop_assert_eq!(&once.input, &state.input);
    }

    #[test]
    fn prop_feedback_never_clears_result(state in arb_classified_state(), ok in any::<bool>()) {
        prop_assume!(state.result().is_some());
        let (sent, _) = step(&state, Event::SendFeedback);
        prop_assert_eq!(sent.result(), state.result());

        let outcome = if ok { Ok(Ack) } else { Err(ContractError::server("nope")) };
        let (done, _) = step(
            &sent,
            Event::FeedbackCompleted { epoch: sent.epoch, generation: sent.generation, outcome },
        );
        prop_assert_eq!(done.result(), state.result());
        prop_assert!(done.feedback_status.is_some());
    }
}
