//! Telegram `getUpdates` long-polling loop and command dispatch.
//!
//! Update payloads are parsed into logical [`Command`] values; malformed
//! argument text (dates, indices) turns into a usage reply rather than an
//! error. Replies go back to the originating chat through the shared
//! notifier. Transport failures are logged and retried after a short
//! backoff.

use std::sync::Arc;
use std::time::Duration;

use rota_core::config::TelegramConfig;
use rota_notify::{Notifier, NotifyError};
use rota_store::{StateDocument, StateStore};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::command::{self, Command};

/// Commands registered with Telegram at startup.
const BOT_COMMANDS: &[(&str, &str)] = &[
    ("start", "Activate the bot in this chat"),
    ("add_user", "Add the replied-to user to the duty roster"),
    ("del_user", "Remove the replied-to user from the duty roster"),
    ("cur_active", "Show the current duty holder"),
    ("when_my_turn", "Show your position in the duty queue"),
    ("add_vacation", "Plan a vacation: /add_vacation YYYY-MM-DD YYYY-MM-DD"),
    ("my_vacations", "List your planned vacations"),
    ("remove_vacation", "Delete a vacation: /remove_vacation INDEX"),
    ("queue_move", "Force the duty queue to move on"),
];

// ── Bot API payloads ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

// ── Command parsing ─────────────────────────────────────────────────

/// Parse a message into a logical command.
///
/// Returns `None` for non-command messages and unknown commands, and
/// `Some(Err(reply))` when a recognized command has unusable arguments.
fn parse_command(msg: &Message) -> Option<Result<Command, String>> {
    let text = msg.text.as_deref()?.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    // Tolerate the "/command@botname" form used in group chats.
    let name = head.trim_start_matches('/').split('@').next()?;

    match name {
        "start" => Some(Ok(Command::Activate { chat_id: msg.chat.id })),

        "add_user" | "del_user" => {
            let target = match msg.reply_to_message.as_deref().and_then(|m| m.from.as_ref()) {
                Some(user) => user,
                None => {
                    return Some(Err(
                        "Reply to a message from the user you want to manage.".to_string(),
                    ))
                }
            };
            let id = target.id;
            let display_name = target.full_name();
            Some(Ok(if name == "add_user" {
                Command::AddParticipant { id, display_name }
            } else {
                Command::RemoveParticipant { id, display_name }
            }))
        }

        "cur_active" => Some(Ok(Command::ShowActive)),

        "when_my_turn" => {
            let from = msg.from.as_ref()?;
            Some(Ok(Command::ShowMyPosition { id: from.id }))
        }

        "add_vacation" => {
            let from = msg.from.as_ref()?;
            let usage = "Usage: /add_vacation YYYY-MM-DD YYYY-MM-DD".to_string();
            let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Some(Err(usage));
            };
            match (start.parse(), end.parse()) {
                (Ok(start), Ok(end)) => Some(Ok(Command::AddVacation {
                    id: from.id,
                    start,
                    end,
                })),
                _ => Some(Err(usage)),
            }
        }

        "my_vacations" => {
            let from = msg.from.as_ref()?;
            Some(Ok(Command::ListMyVacations { id: from.id }))
        }

        "remove_vacation" => {
            let from = msg.from.as_ref()?;
            let usage = "Usage: /remove_vacation INDEX".to_string();
            let (Some(index), None) = (parts.next(), parts.next()) else {
                return Some(Err(usage));
            };
            match index.parse::<usize>() {
                Ok(index) => Some(Ok(Command::DeleteVacation { id: from.id, index })),
                Err(_) => Some(Err(usage)),
            }
        }

        "queue_move" => Some(Ok(Command::ForceAdvance)),

        _ => None,
    }
}

// ── Poller ──────────────────────────────────────────────────────────

/// Long-polling update loop.
pub struct Poller {
    client: reqwest::Client,
    api_base: String,
    token: String,
    poll_timeout_secs: u64,
    state: Arc<Mutex<StateDocument>>,
    store: Arc<StateStore>,
    notifier: Arc<dyn Notifier>,
    offset: i64,
}

impl Poller {
    pub fn new(
        config: &TelegramConfig,
        state: Arc<Mutex<StateDocument>>,
        store: Arc<StateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, NotifyError> {
        let token = config
            .bot_token
            .clone()
            .ok_or_else(|| NotifyError::Config("BOT_TOKEN is not set".to_string()))?;
        // Keep the HTTP timeout above the long-poll window.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            token,
            poll_timeout_secs: config.poll_timeout_secs,
            state,
            store,
            notifier,
            offset: 0,
        })
    }

    /// Register the command list shown in the Telegram client UI.
    pub async fn register_commands(&self) -> Result<(), NotifyError> {
        let commands: Vec<serde_json::Value> = BOT_COMMANDS
            .iter()
            .map(|(command, description)| {
                serde_json::json!({ "command": command, "description": description })
            })
            .collect();

        let url = format!("{}/bot{}/setMyCommands", self.api_base, self.token);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "commands": commands }))
            .send()
            .await?;
        let resp: ApiResponse<bool> = response.json().await?;
        if !resp.ok {
            return Err(NotifyError::Config(format!(
                "setMyCommands failed: {}",
                resp.description.unwrap_or_default()
            )));
        }
        debug!(count = BOT_COMMANDS.len(), "bot commands registered");
        Ok(())
    }

    /// Poll and dispatch updates until the process exits.
    pub async fn run(mut self) {
        info!("telegram poller started");
        loop {
            match self.poll_once().await {
                Ok(updates) => {
                    for update in updates {
                        self.offset = self.offset.max(update.update_id + 1);
                        self.handle_update(update).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, backing off");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                }
            }
        }
    }

    async fn poll_once(&self) -> Result<Vec<Update>, NotifyError> {
        let url = format!("{}/bot{}/getUpdates", self.api_base, self.token);
        let body = serde_json::json!({
            "offset": self.offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let response = self.client.post(&url).json(&body).send().await?;
        let resp: ApiResponse<Vec<Update>> = response.json().await?;
        if !resp.ok {
            return Err(NotifyError::Config(format!(
                "getUpdates failed: {}",
                resp.description.unwrap_or_default()
            )));
        }
        Ok(resp.result.unwrap_or_default())
    }

    async fn handle_update(&self, update: Update) {
        let Some(msg) = update.message else { return };
        let chat_id = msg.chat.id;
        let Some(parsed) = parse_command(&msg) else { return };

        let reply = match parsed {
            Err(usage) => usage,
            Ok(cmd) => {
                debug!(?cmd, chat_id, "executing command");
                let mut doc = self.state.lock().await;
                match command::execute(&mut doc, &self.store, cmd) {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!(error = %e, "command execution failed");
                        "Something went wrong; the change was not saved.".to_string()
                    }
                }
            }
        };

        if let Err(e) = self.notifier.send(chat_id, &reply).await {
            warn!(chat_id, error = %e, "failed to send reply");
        }
    }
}
