//! Terminal front-end for a report chat session
//!
//! Reads commands line by line from stdin. Plain lines are sent as chat
//! messages; lines starting with `/` drive the image pipeline and session.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::chat::types::{
    IngestOutcome, MediaPermission, Message, PermissionChoice, ReportRef, ReportStatus, Sender,
    SessionEvent,
};
use crate::chat::ChatSession;
use crate::config::AppConfig;
use crate::media::UserPrompt;
use crate::state::AppState;

const HELP: &str = "\
Commands:
  <text>                     send a message
  /pick <path> [<path>...]   upload images from the library
  /photo <path>              upload a camera photo
  /resume <chat_id> [status] reopen a stored chat
  /allow library|camera      grant access
  /deny library|camera       revoke access
  /history                   print the transcript
  /summary                   print the stored chat summary
  /help                      show this help
  /quit                      leave the chat";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    Pick(Vec<PathBuf>),
    Photo(PathBuf),
    Resume { chat_id: String, status: ReportStatus },
    Access { permission: MediaPermission, granted: bool },
    History,
    Summary,
    Help,
    Quit,
}

/// Parse one input line. `Err` carries a usage message.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("pick", []) => Err("usage: /pick <path> [<path>...]".to_string()),
        ("pick", paths) => Ok(Command::Pick(paths.iter().map(PathBuf::from).collect())),
        ("photo", [path]) => Ok(Command::Photo(PathBuf::from(path))),
        ("photo", _) => Err("usage: /photo <path>".to_string()),
        ("resume", [chat_id]) => Ok(Command::Resume {
            chat_id: chat_id.to_string(),
            status: ReportStatus::InProgress,
        }),
        ("resume", [chat_id, status]) => Ok(Command::Resume {
            chat_id: chat_id.to_string(),
            status: ReportStatus::from(status.to_string()),
        }),
        ("resume", _) => Err("usage: /resume <chat_id> [status]".to_string()),
        ("allow" | "deny", [target]) => {
            let permission = match *target {
                "library" => MediaPermission::Library,
                "camera" => MediaPermission::Camera,
                _ => return Err(format!("usage: /{} library|camera", name)),
            };
            Ok(Command::Access {
                permission,
                granted: name == "allow",
            })
        }
        ("allow" | "deny", _) => Err(format!("usage: /{} library|camera", name)),
        ("history", []) => Ok(Command::History),
        ("summary", []) => Ok(Command::Summary),
        ("help", _) => Ok(Command::Help),
        ("quit" | "exit", _) => Ok(Command::Quit),
        _ => Err(format!("Unknown command: /{} (try /help)", name)),
    }
}

/// Line source shared by the command loop and the permission prompt
pub type SharedLines<R> = Arc<Mutex<Lines<R>>>;

pub fn shared_lines<R: AsyncBufRead + Unpin>(reader: R) -> SharedLines<R> {
    Arc::new(Mutex::new(reader.lines()))
}

/// Map a permission answer to a choice. Anything but an explicit
/// settings answer cancels, including end of input.
pub fn parse_permission_answer(answer: Option<&str>) -> PermissionChoice {
    match answer.map(|a| a.trim().to_ascii_lowercase()).as_deref() {
        Some("s" | "settings" | "y" | "yes") => PermissionChoice::OpenSettings,
        _ => PermissionChoice::Cancel,
    }
}

/// Prompts answered on the terminal
pub struct ConsolePrompt<R> {
    input: SharedLines<R>,
}

impl<R> ConsolePrompt<R> {
    pub fn new(input: SharedLines<R>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl<R> UserPrompt for ConsolePrompt<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn permission_denied(&self, permission: MediaPermission) -> PermissionChoice {
        let what = match permission {
            MediaPermission::Library => "photo library",
            MediaPermission::Camera => "camera",
        };
        println!("! Permission needed: please allow access to your {} to upload images.", what);
        println!("  [c]ancel or [s]ettings? (default: cancel)");

        let answer = match self.input.lock().await.next_line().await {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Failed to read permission answer: {}", e);
                None
            }
        };
        parse_permission_answer(answer.as_deref())
    }

    async fn upload_failed(&self, message: &str) {
        println!("! Error: {}", message);
    }
}

fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Assistant => "AI",
    };
    println!("{} [{}]: {}", who, message.timestamp.format("%H:%M"), message.text);
    for image in message.images.iter().flatten() {
        println!("    {}", image.uri);
    }
}

/// Print assistant replies and session notices as they happen
fn spawn_event_printer(
    session: Arc<ChatSession>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::MessageAppended { index, .. } => {
                    let messages = session.messages().await;
                    if let Some(message) = messages.get(index) {
                        if message.sender == Sender::Assistant || message.images.is_some() {
                            print_message(message);
                        }
                    }
                }
                SessionEvent::TypingChanged(true) => println!("AI is typing..."),
                SessionEvent::HistoryLoaded { count, .. } if count > 0 => {
                    for message in session.messages().await.iter() {
                        print_message(message);
                    }
                }
                SessionEvent::HistoryLoadFailed { error, .. } => {
                    println!("! Could not load earlier messages: {}", error);
                }
                SessionEvent::PersistFailed { stage, error, .. } => {
                    println!("! Not saved ({:?}): {}", stage, error);
                }
                _ => {}
            }
        }
    })
}

async fn print_history(session: &ChatSession) {
    for message in session.messages().await.iter() {
        print_message(message);
    }
}

async fn print_summary(session: &ChatSession) {
    match session.summary().await {
        Ok(Some(summary)) => println!(
            "{} message(s), last at {}: {}",
            summary.message_count,
            summary.last_message_time.format("%Y-%m-%d %H:%M:%S"),
            summary.last_message
        ),
        Ok(None) => println!("No summary stored yet"),
        Err(e) => println!("! Failed to load summary: {}", e),
    }
}

/// Denials and failures were already shown by the prompt
fn report_ingest(outcome: IngestOutcome) {
    if let IngestOutcome::Cancelled = outcome {
        println!("No image selected");
    }
}

/// Run the interactive chat until `/quit` or end of input
pub async fn run_console(config: AppConfig) -> Result<()> {
    let input = shared_lines(BufReader::new(tokio::io::stdin()));
    let state = AppState::init(&config, Arc::new(ConsolePrompt::new(input.clone())))?;
    let (session, events) = state.open_session();
    let session = Arc::new(session);
    let printer = spawn_event_printer(session.clone(), events);

    session.activate(None).await;
    print_history(&session).await;
    if session.shows_report_type_selector().await {
        println!("Report types: {}", crate::chat::types::REPORT_TYPES.join(", "));
    }
    println!("Type /help for commands");

    loop {
        // Guard drops at the end of the statement so the prompt can read too
        let next = input.lock().await.next_line().await?;
        let Some(line) = next else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{}", usage);
                continue;
            }
        };
        log::debug!("Console command: {:?}", command);

        match command {
            Command::Send(text) => {
                session.send_text(&text).await;
            }
            Command::Pick(paths) => {
                state.media().stage_library(paths);
                report_ingest(session.pick_from_library().await);
            }
            Command::Photo(path) => {
                state.media().stage_camera(path);
                report_ingest(session.capture_from_camera().await);
            }
            Command::Resume { chat_id, status } => {
                let report = ReportRef {
                    chat_id: Some(chat_id),
                    title: "Report".to_string(),
                    status,
                };
                session.activate(Some(report)).await;
            }
            Command::Access { permission, granted } => {
                state.media().set_access(permission, granted);
            }
            Command::History => print_history(&session).await,
            Command::Summary => print_summary(&session).await,
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    session.teardown();
    printer.abort();
    log::info!("Chat session closed");
    Ok(())
}
