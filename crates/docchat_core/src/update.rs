use crate::{ConversationState, Effect, Msg, Phase, TaskDisposition};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ConversationState, msg: Msg) -> (ConversationState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_draft(text);
            Vec::new()
        }
        Msg::SendClicked => {
            let prompt = state.draft().trim().to_string();
            // Sends are serialized through a single in-flight slot so
            // assistant replies cannot interleave out of submission order.
            if prompt.is_empty() || state.busy() {
                return (state, Vec::new());
            }
            state.append_user_message(prompt.clone());
            state.clear_draft();
            state.begin_task();
            vec![Effect::RunTask {
                prompt,
                document_ids: state.document_ids().to_vec(),
                mode: state.mode(),
            }]
        }
        Msg::FilesPicked(files) => {
            if files.is_empty() || state.busy() {
                return (state, Vec::new());
            }
            state.begin_upload();
            vec![Effect::UploadFiles { files }]
        }
        Msg::UploadSettled { result } => {
            if !state.upload_in_flight() {
                return (state, Vec::new());
            }
            match result {
                Ok(document_ids) => {
                    state.merge_uploaded_document_ids(document_ids);
                    state.settle(Phase::Idle);
                }
                Err(failure) => {
                    state.settle(Phase::Error(format!("Upload failed: {}", failure.filename)));
                }
            }
            Vec::new()
        }
        Msg::TaskAccepted { task_id: _ } => {
            if state.task_in_flight() {
                state.set_phase(Phase::Thinking);
            }
            Vec::new()
        }
        Msg::TaskSettled { disposition } => {
            if !state.task_in_flight() {
                return (state, Vec::new());
            }
            match disposition {
                TaskDisposition::Answered {
                    text,
                    sources,
                    report,
                } => {
                    state.append_assistant_message(text, sources, report, false);
                    state.settle(Phase::Idle);
                }
                TaskDisposition::MalformedAnswer => {
                    state.append_assistant_message(String::new(), Vec::new(), None, true);
                    state.settle(Phase::Error("Malformed result".to_string()));
                }
                TaskDisposition::Failed => state.settle(Phase::Failed),
                TaskDisposition::TimedOut => state.settle(Phase::TimedOut),
                TaskDisposition::Cancelled => state.settle(Phase::Cancelled),
                TaskDisposition::TransportError { detail } => {
                    state.settle(Phase::Error(detail));
                }
            }
            Vec::new()
        }
        Msg::CollapseToggled { message_id } => {
            state.toggle_collapse(message_id);
            Vec::new()
        }
        Msg::CancelClicked => {
            if state.task_in_flight() {
                vec![Effect::CancelRun]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
