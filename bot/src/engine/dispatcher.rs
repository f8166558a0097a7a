use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::minecraft::address::ServerAddress;

use super::events::{CallbackAction, Command, ConversationId, InboundEvent, MessageId};
use super::render::{self, Reply};
use super::session::{Screen, SessionStore};
use super::status::StatusService;
use super::transitions::{Action, Outcome, Rejection, Trigger, transition};
use super::transport::{EditOutcome, Transport};

/// Pause after a failed poll before asking the transport again.
const RECEIVE_ERROR_DELAY: Duration = Duration::from_secs(3);

/// Routes inbound events through the transition table and performs the
/// resulting render actions. Events are handled one at a time.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    service: Arc<StatusService>,
    sessions: Arc<SessionStore>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        service: Arc<StatusService>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            transport,
            service,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Poll and handle events until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("dispatcher started");

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = self.transport.receive_events() => batch,
            };

            match batch {
                Ok(events) => {
                    let total = events.len();
                    for (handled, event) in events.into_iter().enumerate() {
                        if cancel.is_cancelled() {
                            // Their offset was never confirmed, so they are redelivered next start.
                            info!(dropped = total - handled, "shutdown requested, leaving events unhandled");
                            break;
                        }
                        self.handle(&cancel, event).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to receive updates");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RECEIVE_ERROR_DELAY) => {}
                    }
                }
            }
        }

        info!("dispatcher stopped");
    }

    /// Handle a single event. Failures are logged and contained.
    pub async fn handle(&self, cancel: &CancellationToken, event: InboundEvent) {
        match event {
            InboundEvent::Command {
                conversation_id,
                command,
            } => self.handle_command(cancel, conversation_id, command).await,
            InboundEvent::Callback {
                conversation_id,
                callback_id,
                message_id,
                action,
            } => {
                self.handle_callback(cancel, conversation_id, &callback_id, message_id, action)
                    .await
            }
        }
    }

    async fn handle_command(
        &self,
        cancel: &CancellationToken,
        conversation_id: ConversationId,
        command: Command,
    ) {
        debug!(conversation_id, ?command, "command received");

        let (trigger, args) = match command {
            Command::Start => {
                self.send(conversation_id, &render::start_message()).await;
                return;
            }
            Command::Help => {
                self.send(conversation_id, &render::help_message()).await;
                return;
            }
            Command::OpenMenu => (Trigger::OpenMenu, String::new()),
            Command::SetConfig { args } => (Trigger::SetConfig, args),
        };

        let state = self.sessions.get(conversation_id);
        match transition(state.screen, trigger) {
            Outcome::Transition { to, action } => {
                self.perform(cancel, conversation_id, state.anchor_message_id, to, action, &args)
                    .await
            }
            Outcome::Rejected(rejection) => {
                info!(conversation_id, screen = ?state.screen, ?rejection, "command rejected");
                self.send(conversation_id, &render::wrong_screen_message())
                    .await;
            }
        }
    }

    async fn handle_callback(
        &self,
        cancel: &CancellationToken,
        conversation_id: ConversationId,
        callback_id: &str,
        message_id: MessageId,
        action: Option<CallbackAction>,
    ) {
        let state = self.sessions.get(conversation_id);

        let outcome = match action {
            Some(_) if message_id != state.anchor_message_id => {
                Outcome::Rejected(Rejection::Stale)
            }
            Some(action) => transition(state.screen, Trigger::Callback(action)),
            None => Outcome::Rejected(Rejection::Stale),
        };

        let toast = match outcome {
            Outcome::Rejected(_) => Some(render::STALE_MENU_HINT),
            Outcome::Transition { .. } => None,
        };
        if let Err(e) = self.transport.answer_callback(callback_id, toast).await {
            warn!(conversation_id, error = %e, "failed to answer callback");
        }

        match outcome {
            Outcome::Transition { to, action } => {
                self.perform(cancel, conversation_id, state.anchor_message_id, to, action, "")
                    .await
            }
            Outcome::Rejected(_) => {
                debug!(
                    conversation_id,
                    screen = ?state.screen,
                    ?action,
                    message_id,
                    "stale callback ignored"
                );
            }
        }
    }

    async fn perform(
        &self,
        cancel: &CancellationToken,
        conversation_id: ConversationId,
        anchor: MessageId,
        to: Screen,
        action: Action,
        args: &str,
    ) {
        match action {
            Action::SendMainMenu => {
                match self
                    .transport
                    .send_message(conversation_id, &render::render_main_menu())
                    .await
                {
                    Ok(message_id) => self.sessions.set(conversation_id, to, message_id),
                    Err(e) => error!(conversation_id, error = %e, "failed to send main menu"),
                }
            }
            Action::EditMainMenu => {
                self.edit(conversation_id, anchor, to, render::render_main_menu())
                    .await
            }
            Action::EditStatus | Action::EditPlayers => {
                let reply = match self.service.get_status(cancel, conversation_id).await {
                    Ok(result) if action == Action::EditStatus => render::render_status(&result),
                    Ok(result) => render::render_players(&result),
                    Err(e) => {
                        error!(conversation_id, error = %e, "failed to get server status");
                        render::render_failure(if action == Action::EditStatus {
                            render::status_keyboard()
                        } else {
                            render::players_keyboard()
                        })
                    }
                };
                self.edit(conversation_id, anchor, to, reply).await;
            }
            Action::EditSettings => {
                let reply = match self.service.get_config(conversation_id).await {
                    Ok(record) => render::render_config(record.as_ref()),
                    Err(e) => {
                        error!(conversation_id, error = %e, "failed to get server config");
                        render::render_failure(render::settings_keyboard())
                    }
                };
                self.edit(conversation_id, anchor, to, reply).await;
            }
            Action::ApplyConfig => self.apply_config(conversation_id, anchor, to, args).await,
        }
    }

    async fn apply_config(
        &self,
        conversation_id: ConversationId,
        anchor: MessageId,
        to: Screen,
        args: &str,
    ) {
        let args = args.trim();
        if args.is_empty() {
            self.send(conversation_id, &render::usage_message()).await;
            return;
        }

        let (raw_address, name) = args
            .split_once(char::is_whitespace)
            .map(|(address, name)| (address, name.trim()))
            .unwrap_or((args, ""));

        let address = match ServerAddress::parse(raw_address, name) {
            Ok(address) => address,
            Err(e) => {
                info!(conversation_id, input = %raw_address, error = %e, "invalid server address");
                self.send(conversation_id, &render::invalid_address_message(&e))
                    .await;
                return;
            }
        };

        match self.service.set_config(conversation_id, &address).await {
            Ok(record) => {
                self.edit(conversation_id, anchor, to, render::render_config(Some(&record)))
                    .await;
                self.send(conversation_id, &render::saved_message()).await;
            }
            Err(e) => {
                error!(conversation_id, error = %e, "failed to save server config");
                self.send(conversation_id, &render::save_failed_message())
                    .await;
            }
        }
    }

    /// Edit the anchor and, once the transport accepted it, record the new screen.
    async fn edit(&self, conversation_id: ConversationId, anchor: MessageId, to: Screen, reply: Reply) {
        match self
            .transport
            .edit_message(conversation_id, anchor, &reply)
            .await
        {
            Ok(outcome) => {
                if outcome == EditOutcome::Unmodified {
                    debug!(conversation_id, screen = ?to, "message content unchanged");
                }
                self.sessions.set(conversation_id, to, anchor);
            }
            Err(e) => {
                error!(conversation_id, screen = ?to, error = %e, "failed to edit message");
            }
        }
    }

    async fn send(&self, conversation_id: ConversationId, reply: &Reply) {
        if let Err(e) = self.transport.send_message(conversation_id, reply).await {
            error!(conversation_id, error = %e, "failed to send message");
        }
    }
}
