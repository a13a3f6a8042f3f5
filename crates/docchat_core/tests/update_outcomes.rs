use std::sync::Once;

use docchat_core::{
    update, ConversationState, Effect, Mode, Msg, Role, SourceRef, TaskDisposition,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn send_prompt(state: ConversationState, prompt: &str) -> (ConversationState, Vec<Effect>) {
    let (state, _) = update(state, Msg::InputChanged(prompt.to_string()));
    update(state, Msg::SendClicked)
}

fn settle(state: ConversationState, disposition: TaskDisposition) -> ConversationState {
    let (state, effects) = update(state, Msg::TaskSettled { disposition });
    assert!(effects.is_empty());
    state
}

#[test]
fn completed_task_appends_exactly_one_assistant_message() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "What is the total?");

    let (state, _) = update(
        state,
        Msg::TaskAccepted {
            task_id: "task_1".to_string(),
        },
    );
    assert_eq!(state.view().status, "Thinking…");

    let state = settle(
        state,
        TaskDisposition::Answered {
            text: "100".to_string(),
            sources: vec![SourceRef {
                document_id: "d1".to_string(),
                pages: vec![1, 2],
            }],
            report: None,
        },
    );

    let view = state.view();
    let assistants: Vec<_> = view
        .messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .collect();
    assert_eq!(assistants.len(), 1);
    assert_eq!(assistants[0].content, "100");
    assert_eq!(assistants[0].sources.len(), 1);
    assert_eq!(assistants[0].sources[0].document_id, "d1");
    assert_eq!(assistants[0].sources[0].pages, vec![1, 2]);
    assert_eq!(view.status, "");
    assert!(!view.busy);
}

#[test]
fn failed_task_appends_no_message_and_reports_failed() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "question");

    let state = settle(state, TaskDisposition::Failed);

    let view = state.view();
    assert!(view.messages.iter().all(|m| m.role == Role::User));
    assert_eq!(view.status, "Failed");
}

#[test]
fn timed_out_task_is_distinct_from_failed() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "question");

    let state = settle(state, TaskDisposition::TimedOut);

    let view = state.view();
    assert!(view.messages.iter().all(|m| m.role == Role::User));
    assert_eq!(view.status, "Timed out");
}

#[test]
fn cancelled_run_appends_no_message() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "question");

    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(effects, vec![Effect::CancelRun]);

    let state = settle(state, TaskDisposition::Cancelled);
    let view = state.view();
    assert!(view.messages.iter().all(|m| m.role == Role::User));
    assert_eq!(view.status, "Cancelled");
}

#[test]
fn cancel_without_run_in_flight_is_a_noop() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (_, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn malformed_result_appends_marker_message_and_observable_status() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "question");

    let state = settle(state, TaskDisposition::MalformedAnswer);

    let view = state.view();
    let assistant = view
        .messages
        .iter()
        .find(|m| m.role == Role::Assistant)
        .expect("assistant message");
    assert_eq!(assistant.content, "");
    assert!(assistant.malformed);
    assert_eq!(view.status, "Malformed result");
}

#[test]
fn transport_error_surfaces_detail_without_message() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "question");

    let state = settle(
        state,
        TaskDisposition::TransportError {
            detail: "task poll failed: http status 502".to_string(),
        },
    );

    let view = state.view();
    assert!(view.messages.iter().all(|m| m.role == Role::User));
    assert_eq!(view.status, "task poll failed: http status 502");
}

#[test]
fn stale_settle_without_run_in_flight_is_ignored() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let before = state.view();

    let state = settle(state, TaskDisposition::Failed);
    assert_eq!(state.view(), before);
}

#[test]
fn new_send_works_after_failure() {
    init_logging();
    let state = ConversationState::new(Mode::Retrieval);
    let (state, _) = send_prompt(state, "first");
    let state = settle(state, TaskDisposition::Failed);

    let (state, effects) = send_prompt(state, "second");
    assert_eq!(effects.len(), 1);
    assert_eq!(state.view().status, "Starting…");
}
