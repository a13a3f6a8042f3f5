use docchat_core::{update, ConversationState, Mode, Msg};

#[test]
fn update_is_noop() {
    let state = ConversationState::new(Mode::Retrieval);
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_is_noop() {
    let state = ConversationState::new(Mode::Baseline);
    let (next, effects) = update(state.clone(), Msg::Tick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
