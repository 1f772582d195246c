//! Logical chat commands and their execution against the duty state.
//!
//! Commands arrive pre-parsed from the transport adapter (date and index
//! text already turned into typed values). Execution mutates the state
//! document through the stores and rotation engine, persists synchronously
//! before reporting success, and renders a human-readable reply. Validation
//! rejections become user-facing reply text; only persistence failures
//! propagate as errors.

use chrono::NaiveDate;
use rota_core::{ChatId, RotaError, UserId};
use rota_engine::rotation;
use rota_notify::{escape_html, mention};
use rota_store::{StateDocument, StateStore};

/// A logical command from the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bind notifications to the issuing chat.
    Activate { chat_id: ChatId },
    AddParticipant { id: UserId, display_name: String },
    RemoveParticipant { id: UserId, display_name: String },
    ShowActive,
    ShowMyPosition { id: UserId },
    AddVacation { id: UserId, start: NaiveDate, end: NaiveDate },
    ListMyVacations { id: UserId },
    /// 1-based index into the requester's vacation listing.
    DeleteVacation { id: UserId, index: usize },
    ForceAdvance,
}

/// Execute a command, persisting any mutation before the reply.
pub fn execute(
    doc: &mut StateDocument,
    store: &StateStore,
    cmd: Command,
) -> Result<String, RotaError> {
    match cmd {
        Command::Activate { chat_id } => {
            doc.chat_id = Some(chat_id);
            store.save(doc)?;
            Ok("Bot activated. This chat now receives duty notifications.".to_string())
        }

        Command::AddParticipant { id, display_name } => {
            let name = escape_html(&display_name);
            match doc.participants.add(id, display_name) {
                Ok(_) => {
                    store.save(doc)?;
                    Ok(format!("{name} joined the duty roster."))
                }
                Err(RotaError::AlreadyExists(_)) => {
                    Ok(format!("{name} is already on the duty roster."))
                }
                Err(e) => Err(e),
            }
        }

        Command::RemoveParticipant { id, display_name } => {
            let name = escape_html(&display_name);
            match doc.participants.remove(id) {
                Ok(_) => {
                    store.save(doc)?;
                    Ok(format!("{name} left the duty roster."))
                }
                Err(RotaError::NotFound(_)) => {
                    Ok(format!("{name} is not on the duty roster."))
                }
                Err(e) => Err(e),
            }
        }

        Command::ShowActive => match doc.participants.current() {
            Some(p) => Ok(format!(
                "On duty this week: {}",
                mention(p.id, &p.display_name)
            )),
            None => Ok("The duty roster is empty.".to_string()),
        },

        Command::ShowMyPosition { id } => match doc.participants.position_of(id) {
            Some(position) => Ok(format!("Your position in the duty queue: {position}.")),
            None => Ok("You are not on the duty roster.".to_string()),
        },

        Command::AddVacation { id, start, end } => {
            match doc.vacations.add(id, start, end) {
                Ok(_) => {
                    store.save(doc)?;
                    Ok(format!("Vacation recorded from {start} to {end}."))
                }
                Err(RotaError::InvalidRange) => {
                    Ok("The start date is after the end date.".to_string())
                }
                Err(RotaError::Overlap) => {
                    Ok("That vacation overlaps one you already planned.".to_string())
                }
                Err(e) => Err(e),
            }
        }

        Command::ListMyVacations { id } => {
            let list = doc.vacations.list_for(id);
            if list.is_empty() {
                return Ok("You have no planned vacations.".to_string());
            }
            let mut text = String::from("Your vacations:\n");
            for (i, iv) in list.iter().enumerate() {
                text.push_str(&format!("{}. {} to {}\n", i + 1, iv.start, iv.end));
            }
            Ok(text.trim_end().to_string())
        }

        Command::DeleteVacation { id, index } => {
            match doc.vacations.delete_at(id, index) {
                Ok(_) => {
                    store.save(doc)?;
                    Ok("Vacation deleted.".to_string())
                }
                Err(RotaError::OutOfRange(_)) => {
                    Ok("No vacation with that number.".to_string())
                }
                Err(e) => Err(e),
            }
        }

        Command::ForceAdvance => {
            match rotation::advance(&mut doc.participants, &doc.vacations, today()) {
                Some(id) => {
                    store.save(doc)?;
                    let who = doc
                        .participants
                        .get(id)
                        .map(|p| mention(p.id, &p.display_name))
                        .unwrap_or_else(|| id.to_string());
                    Ok(format!("The queue moved on. New duty holder: {who}"))
                }
                None => Ok("No participants are available for duty.".to_string()),
            }
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
