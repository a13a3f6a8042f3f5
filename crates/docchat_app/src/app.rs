//! Terminal shell: reads commands from stdin, funnels every state change
//! through the core update loop, renders the conversation after changes.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use docchat_core::{
    update, ConversationState, ConversationViewModel, MessageRowView, Msg, PickedFile, Role,
    COLLAPSE_THRESHOLD,
};
use docchat_engine::ClientSettings;
use engine_logging::engine_info;

use crate::config::AppConfig;
use crate::effects::EffectRunner;

enum ShellEvent {
    Msg(Msg),
    Quit,
}

pub fn run_shell(config: AppConfig) -> anyhow::Result<()> {
    let settings = ClientSettings {
        base_url: config.base_url.clone(),
        user_id: config.user_id.clone(),
        ..ClientSettings::default()
    };

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings, msg_tx)?;

    let (shell_tx, shell_rx) = mpsc::channel::<ShellEvent>();
    spawn_stdin_reader(shell_tx);

    println!(
        "doc-chat ({} mode) against {}",
        match config.mode() {
            docchat_core::Mode::Retrieval => "retrieval",
            docchat_core::Mode::Baseline => "baseline",
        },
        config.base_url
    );
    println!("Type a question to send it. Commands: :attach <paths>, :toggle <id>, :cancel, :quit");

    let mut state = ConversationState::new(config.mode());
    let mut renderer = Renderer::new(state.view());

    loop {
        let mut inbox: Vec<Msg> = Vec::new();
        while let Ok(msg) = msg_rx.try_recv() {
            inbox.push(msg);
        }
        let mut quit = false;
        match shell_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(ShellEvent::Msg(msg)) => inbox.push(msg),
            Ok(ShellEvent::Quit) => quit = true,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => quit = true,
        }

        for msg in inbox {
            let (next, effects) = update(std::mem::take(&mut state), msg);
            state = next;
            runner.enqueue(effects);
        }

        if state.consume_dirty() {
            renderer.render(&state.view());
        }

        if quit {
            engine_info!("Shell exiting");
            return Ok(());
        }
    }
}

fn spawn_stdin_reader(shell_tx: mpsc::Sender<ShellEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for event in parse_line(&line) {
                if shell_tx.send(event).is_err() {
                    return;
                }
            }
        }
        let _ = shell_tx.send(ShellEvent::Quit);
    });
}

fn parse_line(line: &str) -> Vec<ShellEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == ":quit" {
        return vec![ShellEvent::Quit];
    }
    if trimmed == ":cancel" {
        return vec![ShellEvent::Msg(Msg::CancelClicked)];
    }
    if let Some(rest) = trimmed.strip_prefix(":toggle") {
        return match rest.trim().parse() {
            Ok(message_id) => vec![ShellEvent::Msg(Msg::CollapseToggled { message_id })],
            Err(_) => {
                println!("usage: :toggle <message id>");
                Vec::new()
            }
        };
    }
    if let Some(rest) = trimmed.strip_prefix(":attach") {
        let files: Vec<PickedFile> = rest.split_whitespace().map(picked_file).collect();
        if files.is_empty() {
            println!("usage: :attach <paths>");
            return Vec::new();
        }
        return vec![ShellEvent::Msg(Msg::FilesPicked(files))];
    }
    vec![
        ShellEvent::Msg(Msg::InputChanged(trimmed.to_string())),
        ShellEvent::Msg(Msg::SendClicked),
    ]
}

fn picked_file(path: &str) -> PickedFile {
    let path = PathBuf::from(path);
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let content_type = content_type_for(&filename);
    PickedFile {
        filename,
        content_type: content_type.to_string(),
        path,
    }
}

/// The backend stores PDFs and XLSX spreadsheets; everything else is sent as
/// PDF and left to the backend to reject.
fn content_type_for(filename: &str) -> &'static str {
    if filename.to_lowercase().ends_with(".xlsx") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else {
        "application/pdf"
    }
}

struct Renderer {
    last: ConversationViewModel,
}

impl Renderer {
    fn new(initial: ConversationViewModel) -> Self {
        Self { last: initial }
    }

    /// Prints rows that are new or whose collapse state changed, then the
    /// status line when it changed.
    fn render(&mut self, view: &ConversationViewModel) {
        for row in &view.messages {
            let changed = match self.last.messages.iter().find(|m| m.id == row.id) {
                Some(previous) => previous != row,
                None => true,
            };
            if changed {
                print_row(row);
            }
        }
        if view.status != self.last.status && !view.status.is_empty() {
            println!("[{}] {}", timestamp(), view.status);
        }
        self.last = view.clone();
    }
}

fn print_row(row: &MessageRowView) {
    let speaker = match row.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let content = if row.collapsed {
        collapsed_excerpt(&row.content)
    } else {
        row.content.clone()
    };
    println!("[{}] {} #{}: {}", timestamp(), speaker, row.id, content);
    if row.malformed {
        println!("    (answer payload could not be read)");
    }
    for source in &row.sources {
        println!("    source {} pages {:?}", source.document_id, source.pages);
    }
    if let Some(report) = &row.report {
        println!("    report: {}", report);
    }
}

fn collapsed_excerpt(content: &str) -> String {
    let excerpt: String = content.chars().take(COLLAPSE_THRESHOLD).collect();
    format!("{excerpt}… (:toggle to expand)")
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
