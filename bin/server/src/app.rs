//! The web form shell.
//!
//! One page: a transcript of the caller's conversation and a single input.
//! Each browser session, identified by a cookie, gets its own
//! [`ReservationAgent`].

use crate::error::{turn_notice, turn_status};
use axum::{
    Router,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use foodiespot_ai::LlmBackend;
use foodiespot_booking::BookingStore;
use foodiespot_conversation::{AgentConfig, MessageRole, ReservationAgent};
use foodiespot_core::ConversationSessionId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "foodiespot_session";

/// Page title.
pub const PAGE_TITLE: &str = "FoodieSpot Reservation Assistant";

/// Label of the message input.
pub const INPUT_LABEL: &str = "Ask me to book, modify, or cancel a reservation";

type SharedAgent = Arc<Mutex<ReservationAgent>>;

/// Shared application state.
pub struct AppState {
    backend: Arc<dyn LlmBackend>,
    store: Arc<dyn BookingStore>,
    agent_config: AgentConfig,
    sessions: RwLock<HashMap<ConversationSessionId, SharedAgent>>,
}

impl AppState {
    /// Creates a new application state with no sessions.
    #[must_use]
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn BookingStore>,
        agent_config: AgentConfig,
    ) -> Self {
        Self {
            backend,
            store,
            agent_config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn find(&self, id: ConversationSessionId) -> Option<SharedAgent> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drops sessions whose last activity is older than `max_idle`.
    ///
    /// Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = TimeDelta::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle));
        match cutoff {
            Some(cutoff) => self.evict_idle_since(cutoff).await,
            None => 0,
        }
    }

    /// Drops sessions with no activity since `cutoff`.
    ///
    /// A session in the middle of a turn is always kept.
    pub async fn evict_idle_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, agent| match agent.try_lock() {
            Ok(agent) => agent.session().last_active_at >= cutoff,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    async fn render_for(&self, id: Option<ConversationSessionId>) -> String {
        let agent = match id {
            Some(id) => self.find(id).await,
            None => None,
        };
        match agent {
            Some(agent) => render_agent(&*agent.lock().await, None),
            None => render_page(&[], None),
        }
    }

    /// Returns the agent for `id`, starting a new session if there is none.
    async fn find_or_start(
        &self,
        id: Option<ConversationSessionId>,
    ) -> (ConversationSessionId, SharedAgent) {
        if let Some(id) = id {
            if let Some(agent) = self.find(id).await {
                return (id, agent);
            }
        }

        let agent = ReservationAgent::with_config(
            self.backend.clone(),
            self.store.clone(),
            self.agent_config.clone(),
        );
        let id = agent.session().id;
        let agent = Arc::new(Mutex::new(agent));
        self.sessions.write().await.insert(id, agent.clone());
        info!(session_id = %id, "started conversation session");
        (id, agent)
    }
}

/// Builds the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Form body of `POST /`.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

fn session_from(jar: &CookieJar) -> Option<ConversationSessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

fn session_cookie(id: ConversationSessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Renders the caller's conversation.
async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Html<String> {
    Html(state.render_for(session_from(&jar)).await)
}

/// Runs one turn for the caller's session and re-renders the page.
async fn submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> impl IntoResponse {
    // Blank input never starts a session.
    let text = form.message.trim();
    if text.is_empty() {
        let page = state.render_for(session_from(&jar)).await;
        return (StatusCode::OK, jar, Html(page));
    }

    let (id, agent) = state.find_or_start(session_from(&jar)).await;
    let jar = jar.add(session_cookie(id));
    let mut agent = agent.lock().await;

    match agent.handle(text).await {
        Ok(_) => (StatusCode::OK, jar, Html(render_agent(&agent, None))),
        Err(err) => {
            error!(session_id = %id, error = %err, "conversation turn failed");
            let notice = turn_notice(&err);
            (turn_status(&err), jar, Html(render_agent(&agent, Some(notice))))
        }
    }
}

fn render_agent(agent: &ReservationAgent, notice: Option<&str>) -> String {
    let lines: Vec<(&str, &str)> = agent
        .session()
        .transcript()
        .map(|m| {
            let speaker = match m.role {
                MessageRole::User => "You",
                _ => "Assistant",
            };
            (speaker, m.content.as_str())
        })
        .collect();
    render_page(&lines, notice)
}

/// Renders the page. All user and model text is HTML-escaped.
pub fn render_page(lines: &[(&str, &str)], notice: Option<&str>) -> String {
    let mut transcript = String::new();
    for (speaker, text) in lines {
        transcript.push_str(&format!(
            "      <p><strong>{speaker}:</strong> {}</p>\n",
            html_escape::encode_text(text)
        ));
    }

    let notice = notice
        .map(|n| {
            format!(
                "    <p class=\"error\" role=\"alert\">{}</p>\n",
                html_escape::encode_text(n)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1"/>
    <title>{PAGE_TITLE}</title>
  </head>
  <body>
    <h1>{PAGE_TITLE}</h1>
    <section id="transcript">
{transcript}    </section>
{notice}    <form method="post" action="/">
      <label for="message">{INPUT_LABEL}</label>
      <input id="message" name="message" type="text" autocomplete="off" autofocus/>
      <button type="submit">Send</button>
    </form>
  </body>
</html>
"#
    )
}
