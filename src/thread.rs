//! One open conversation: its message sequence, the single-flight send
//! lifecycle and the transient typing indicator.
//!
//! The server is authoritative. Every load and every successful send ends
//! with the full message list being fetched again and swapped in wholesale;
//! nothing is appended locally. Each swap bumps [`MessageThreadController::revision`],
//! which the view uses to decide when to scroll to the end.

use std::sync::Arc;

use futures::FutureExt;
use log::{debug, warn};

use crate::Request;
use crate::api::{ConversationApi, Message};
use crate::error::{ApiError, Notice, SendRejected};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPhase {
    Idle,
    Loading,
    Ready,
    LoadFailed,
    Sending,
}

/// Result of a thread request, to be fed back through `apply`.
#[derive(Debug)]
pub struct ThreadEvent {
    session: u64,
    conversation_id: String,
    outcome: Outcome,
}

#[derive(Debug)]
enum Outcome {
    Loaded(Result<Vec<Message>, ApiError>),
    Sent(Result<Vec<Message>, ApiError>),
}

pub struct MessageThreadController {
    api: Arc<dyn ConversationApi>,
    // Bumped on every open/dispose; events from older sessions are dropped.
    session: u64,
    conversation_id: Option<String>,
    counterpart_name: String,
    phase: ThreadPhase,
    messages: Vec<Message>,
    compose: String,
    typing_indicator_visible: bool,
    revision: u64,
}

impl MessageThreadController {
    pub fn new(api: Arc<dyn ConversationApi>) -> Self {
        Self {
            api,
            session: 0,
            conversation_id: None,
            counterpart_name: String::new(),
            phase: ThreadPhase::Idle,
            messages: Vec::new(),
            compose: String::new(),
            typing_indicator_visible: false,
            revision: 0,
        }
    }

    /// Point the controller at a conversation and start loading it.
    pub fn open(
        &mut self,
        conversation_id: impl Into<String>,
        counterpart_name: impl Into<String>,
    ) -> Request<ThreadEvent> {
        let conversation_id = conversation_id.into();
        if self.conversation_id.as_deref() != Some(conversation_id.as_str()) {
            self.clear_messages();
            self.compose.clear();
        }
        self.session += 1;
        self.counterpart_name = counterpart_name.into();
        self.typing_indicator_visible = false;
        self.phase = ThreadPhase::Loading;
        debug!("opening thread {} (session {})", conversation_id, self.session);
        self.conversation_id = Some(conversation_id.clone());
        self.load(conversation_id)
    }

    /// Re-issue the load after a failure. Does nothing in any other phase.
    pub fn retry(&mut self) -> Option<Request<ThreadEvent>> {
        if self.phase != ThreadPhase::LoadFailed {
            return None;
        }
        let conversation_id = self.conversation_id.clone()?;
        self.phase = ThreadPhase::Loading;
        Some(self.load(conversation_id))
    }

    /// Send `text` (trimmed). Only one send may be outstanding; blank text
    /// and sends outside `Ready` are dropped.
    ///
    /// On acceptance the compose box is cleared right away and is not
    /// restored if the request later fails.
    pub fn send(&mut self, text: &str) -> Result<Request<ThreadEvent>, SendRejected> {
        match self.phase {
            ThreadPhase::Ready => {}
            ThreadPhase::Sending => {
                debug!("send dropped: another send is in flight");
                return Err(SendRejected::InFlight);
            }
            _ => return Err(SendRejected::NotReady),
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        let Some(conversation_id) = self.conversation_id.clone() else {
            return Err(SendRejected::NotReady);
        };

        self.phase = ThreadPhase::Sending;
        self.typing_indicator_visible = true;
        self.compose.clear();

        let api = Arc::clone(&self.api);
        let session = self.session;
        let text = text.to_string();
        Ok(async move {
            // The POST response is not displayed; the thread is always re-fetched.
            let outcome = match api.send_message(&conversation_id, &text).await {
                Ok(()) => api.list_messages(&conversation_id).await,
                Err(err) => Err(err),
            };
            ThreadEvent {
                session,
                conversation_id,
                outcome: Outcome::Sent(outcome),
            }
        }
        .boxed())
    }

    /// Send whatever is in the compose box.
    pub fn submit(&mut self) -> Result<Request<ThreadEvent>, SendRejected> {
        let text = self.compose.clone();
        self.send(&text)
    }

    /// Reconcile a finished request.
    ///
    /// Events issued before the last `open`/`dispose`, or for a phase the
    /// controller has since left, are discarded.
    pub fn apply(&mut self, event: ThreadEvent) -> Option<Notice> {
        if event.session != self.session
            || self.conversation_id.as_deref() != Some(event.conversation_id.as_str())
        {
            debug!(
                "discarding stale response for thread {} (session {}, current {})",
                event.conversation_id, event.session, self.session
            );
            return None;
        }

        match event.outcome {
            Outcome::Loaded(result) => {
                if self.phase != ThreadPhase::Loading {
                    debug!("discarding load result outside Loading ({:?})", self.phase);
                    return None;
                }
                match result {
                    Ok(messages) => {
                        self.replace_messages(messages);
                        self.phase = ThreadPhase::Ready;
                        None
                    }
                    Err(err) => {
                        warn!("failed to load thread {}: {}", event.conversation_id, err);
                        self.phase = ThreadPhase::LoadFailed;
                        Some(Notice::failure("load messages", &err))
                    }
                }
            }
            Outcome::Sent(result) => {
                if self.phase != ThreadPhase::Sending {
                    debug!("discarding send result outside Sending ({:?})", self.phase);
                    return None;
                }
                self.typing_indicator_visible = false;
                self.phase = ThreadPhase::Ready;
                match result {
                    Ok(messages) => {
                        self.replace_messages(messages);
                        None
                    }
                    Err(err) => {
                        warn!("failed to send to thread {}: {}", event.conversation_id, err);
                        Some(Notice::failure("send message", &err))
                    }
                }
            }
        }
    }

    /// Leave the thread. Responses still in flight will be ignored.
    pub fn dispose(&mut self) {
        self.session += 1;
        self.conversation_id = None;
        self.counterpart_name.clear();
        self.phase = ThreadPhase::Idle;
        self.clear_messages();
        self.compose.clear();
        self.typing_indicator_visible = false;
    }

    pub fn phase(&self) -> ThreadPhase {
        self.phase
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn counterpart_name(&self) -> &str {
        &self.counterpart_name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.phase == ThreadPhase::Sending
    }

    /// Local "awaiting a reply" signal, not the counterpart's presence.
    pub fn typing_indicator_visible(&self) -> bool {
        self.typing_indicator_visible
    }

    pub fn typing_label(&self) -> Option<String> {
        self.typing_indicator_visible
            .then(|| format!("{} is typing...", self.counterpart_name))
    }

    /// Increases by one every time the message list is swapped, including
    /// when a shown list is emptied by switching threads or disposing.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn load(&self, conversation_id: String) -> Request<ThreadEvent> {
        let api = Arc::clone(&self.api);
        let session = self.session;
        async move {
            let outcome = Outcome::Loaded(api.list_messages(&conversation_id).await);
            ThreadEvent {
                session,
                conversation_id,
                outcome,
            }
        }
        .boxed()
    }

    fn replace_messages(&mut self, messages: Vec<Message>) {
        // Server order is trusted; an inversion is reported, never re-sorted.
        if messages.windows(2).any(|w| w[0].created_at > w[1].created_at) {
            warn!(
                "server returned out-of-order messages for thread {}",
                self.conversation_id.as_deref().unwrap_or_default()
            );
        }
        self.messages = messages;
        self.revision += 1;
    }

    fn clear_messages(&mut self) {
        if !self.messages.is_empty() {
            self.messages.clear();
            self.revision += 1;
        }
    }
}

/// View-side memory of the last revision it scrolled for.
#[derive(Debug, Default)]
pub struct ScrollAnchor {
    seen: u64,
}

impl ScrollAnchor {
    /// True once per new revision, and only when there is something to show.
    pub fn should_scroll_to_end(&mut self, thread: &MessageThreadController) -> bool {
        let changed = thread.revision() != self.seen;
        self.seen = thread.revision();
        changed && !thread.messages().is_empty()
    }
}
