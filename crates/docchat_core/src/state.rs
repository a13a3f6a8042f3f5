use std::path::PathBuf;

use crate::view_model::{ConversationViewModel, MessageRowView};

pub type MessageId = u64;

/// User messages longer than this many characters start out collapsed.
pub const COLLAPSE_THRESHOLD: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Answer grounding: retrieval uses the attached documents, baseline skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Retrieval,
    Baseline,
}

/// A citation into an uploaded document, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub document_id: String,
    pub pages: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub sources: Vec<SourceRef>,
    pub report: Option<String>,
    /// Set when the backend completed but its result payload was unreadable.
    pub malformed: bool,
    pub can_collapse: bool,
    pub collapsed: bool,
}

/// A file the user picked for upload. Bytes are read by the effect layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub filename: String,
    pub content_type: String,
    pub path: PathBuf,
}

/// Why an upload batch did not produce document ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub filename: String,
    pub message: String,
}

/// How a submitted task ended, as seen by the store.
///
/// `Failed` is backend-declared; `TimedOut` is the client giving up after the
/// poll budget. The two must stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDisposition {
    Answered {
        text: String,
        sources: Vec<SourceRef>,
        report: Option<String>,
    },
    /// Task completed but the result payload could not be parsed.
    MalformedAnswer,
    Failed,
    TimedOut,
    Cancelled,
    TransportError { detail: String },
}

/// Conversation phase, rendered to the status line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Starting,
    Thinking,
    Failed,
    TimedOut,
    Cancelled,
    Error(String),
}

impl Phase {
    pub fn status_text(&self) -> String {
        match self {
            Phase::Idle => String::new(),
            Phase::Uploading => "Uploading…".to_string(),
            Phase::Starting => "Starting…".to_string(),
            Phase::Thinking => "Thinking…".to_string(),
            Phase::Failed => "Failed".to_string(),
            Phase::TimedOut => "Timed out".to_string(),
            Phase::Cancelled => "Cancelled".to_string(),
            Phase::Error(detail) => detail.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum InFlight {
    #[default]
    None,
    Upload,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    next_message_id: MessageId,
    phase: Phase,
    mode: Mode,
    draft: String,
    document_ids: Vec<String>,
    in_flight: InFlight,
    dirty: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(Mode::Retrieval)
    }
}

impl ConversationState {
    pub fn new(mode: Mode) -> Self {
        Self {
            messages: Vec::new(),
            next_message_id: 1,
            phase: Phase::Idle,
            mode,
            draft: String::new(),
            document_ids: Vec::new(),
            in_flight: InFlight::None,
            dirty: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    /// True while an upload or a task run is in flight; new sends are gated on it.
    pub fn busy(&self) -> bool {
        self.in_flight != InFlight::None
    }

    pub(crate) fn task_in_flight(&self) -> bool {
        self.in_flight == InFlight::Task
    }

    pub(crate) fn upload_in_flight(&self) -> bool {
        self.in_flight == InFlight::Upload
    }

    pub(crate) fn set_draft(&mut self, text: String) {
        self.draft = text;
    }

    pub(crate) fn clear_draft(&mut self) {
        self.draft.clear();
    }

    pub(crate) fn begin_upload(&mut self) {
        self.in_flight = InFlight::Upload;
        self.set_phase(Phase::Uploading);
    }

    pub(crate) fn begin_task(&mut self) {
        self.in_flight = InFlight::Task;
        self.set_phase(Phase::Starting);
    }

    /// Ends the in-flight operation and records its closing phase.
    pub(crate) fn settle(&mut self, phase: Phase) {
        self.in_flight = InFlight::None;
        self.set_phase(phase);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    /// Appends the user's message immediately, before any network call resolves.
    pub fn append_user_message(&mut self, content: String) -> MessageId {
        let collapsible = content.chars().count() > COLLAPSE_THRESHOLD;
        self.push_message(ChatMessage {
            id: 0,
            role: Role::User,
            content,
            sources: Vec::new(),
            report: None,
            malformed: false,
            can_collapse: collapsible,
            collapsed: collapsible,
        })
    }

    pub fn append_assistant_message(
        &mut self,
        content: String,
        sources: Vec<SourceRef>,
        report: Option<String>,
        malformed: bool,
    ) -> MessageId {
        self.push_message(ChatMessage {
            id: 0,
            role: Role::Assistant,
            content,
            sources,
            report,
            malformed,
            can_collapse: false,
            collapsed: false,
        })
    }

    fn push_message(&mut self, mut message: ChatMessage) -> MessageId {
        let id = self.next_message_id;
        self.next_message_id += 1;
        message.id = id;
        self.messages.push(message);
        self.dirty = true;
        id
    }

    /// Flips `collapsed` on an existing user message; no-op otherwise.
    pub fn toggle_collapse(&mut self, message_id: MessageId) {
        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| m.id == message_id && m.role == Role::User && m.can_collapse)
        {
            message.collapsed = !message.collapsed;
            self.dirty = true;
        }
    }

    /// Appends new document ids for the next send, keeping first-seen order.
    /// Exact duplicates are skipped; the set survives across sends.
    pub fn merge_uploaded_document_ids(&mut self, new_ids: Vec<String>) {
        for id in new_ids {
            if !self.document_ids.contains(&id) {
                self.document_ids.push(id);
                self.dirty = true;
            }
        }
    }

    /// Returns whether a render is pending and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> ConversationViewModel {
        ConversationViewModel {
            status: self.phase.status_text(),
            mode: self.mode,
            document_ids: self.document_ids.clone(),
            busy: self.busy(),
            messages: self
                .messages
                .iter()
                .map(|m| MessageRowView {
                    id: m.id,
                    role: m.role,
                    content: m.content.clone(),
                    sources: m.sources.clone(),
                    report: m.report.clone(),
                    malformed: m.malformed,
                    can_collapse: m.can_collapse,
                    collapsed: m.collapsed,
                })
                .collect(),
        }
    }
}
