//! Doc-chat core: pure conversation state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    ChatMessage, ConversationState, MessageId, Mode, Phase, PickedFile, Role, SourceRef,
    TaskDisposition, UploadFailure, COLLAPSE_THRESHOLD,
};
pub use update::update;
pub use view_model::{ConversationViewModel, MessageRowView};
