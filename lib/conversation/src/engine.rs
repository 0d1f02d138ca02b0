//! The reservation agent: one session, one model, one datastore.
//!
//! A turn runs `AwaitingUser -> ModelCall1 -> {Done | ToolDispatch -> ModelCall2 -> Done}`.
//! At most one tool is serviced per turn.

use crate::error::ConversationError;
use crate::message::Message;
use crate::session::Session;
use crate::tool::{ToolCall, dispatch, function_schemas};
use foodiespot_ai::{ChatReply, ChatRequest, LlmBackend};
use foodiespot_booking::BookingStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are FoodieSpot's reservation assistant. Use the available tools to recommend restaurants, check availability, and make bookings. Always respond concisely.";

/// Agent settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Drives a single conversation.
///
/// The agent exclusively owns its [`Session`]; separate agents never share
/// history. The backend and store are shared handles.
pub struct ReservationAgent {
    session: Session,
    backend: Arc<dyn LlmBackend>,
    store: Arc<dyn BookingStore>,
    config: AgentConfig,
}

impl ReservationAgent {
    /// Creates an agent with a fresh session and the default prompt.
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, store: Arc<dyn BookingStore>) -> Self {
        Self::with_config(backend, store, AgentConfig::default())
    }

    /// Creates an agent with a fresh session and the given settings.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn BookingStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            session: Session::new(),
            backend,
            store,
            config,
        }
    }

    /// Returns the session history.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs one user turn and returns the assistant's reply.
    ///
    /// Messages appended before a failure stay in the history.
    ///
    /// # Errors
    ///
    /// - `Remote` if a model call fails
    /// - `Tool` if the requested tool cannot be parsed or run
    /// - `UnexpectedFunctionCall` if the follow-up reply is another tool call
    #[instrument(skip(self, text), fields(session_id = %self.session.id))]
    pub async fn handle(&mut self, text: &str) -> Result<String, ConversationError> {
        self.session.add_message(Message::user(text));

        let request = ChatRequest::new(
            self.config.system_prompt.clone(),
            self.session.to_chat_messages(),
        )
        .with_functions(function_schemas());
        debug!(history = self.session.message_count(), "calling model");

        let call = match self.backend.complete(&request).await? {
            ChatReply::Text { content } => {
                debug!("model answered directly");
                self.session.add_message(Message::assistant(content.clone()));
                return Ok(content);
            }
            ChatReply::FunctionCall(call) => call,
        };

        info!(tool = %call.name, "model requested tool");
        let tool_call = ToolCall::parse(&call.name, &call.arguments)?;
        let result = dispatch(self.store.as_ref(), tool_call).await?;

        let tool_name = call.name.clone();
        self.session.add_message(Message::function_intent(call));
        self.session
            .add_message(Message::function_result(tool_name, &result));

        let follow_up = ChatRequest::new(
            self.config.system_prompt.clone(),
            self.session.to_chat_messages(),
        );
        match self.backend.complete(&follow_up).await? {
            ChatReply::Text { content } => {
                self.session.add_message(Message::assistant(content.clone()));
                Ok(content)
            }
            ChatReply::FunctionCall(extra) => {
                warn!(tool = %extra.name, "model requested a second tool in one turn");
                Err(ConversationError::UnexpectedFunctionCall { name: extra.name })
            }
        }
    }
}

impl std::fmt::Debug for ReservationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationAgent")
            .field("session", &self.session.id)
            .field("model", &self.backend.model())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
