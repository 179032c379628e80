//! In-memory `ConversationApi` that replays scripted responses and records calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;

use crate::api::{Conversation, ConversationApi, DeliveryStatus, Message, MessageKind, Presence, SenderKind};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Ping,
    ListConversations,
    ListMessages(String),
    Send { conversation_id: String, text: String },
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    conversations: Mutex<VecDeque<Result<Vec<Conversation>, ApiError>>>,
    messages: Mutex<VecDeque<Result<Vec<Message>, ApiError>>>,
    sends: Mutex<VecDeque<Result<(), ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub(crate) fn push_conversations(&self, reply: Result<Vec<Conversation>, ApiError>) {
        self.conversations.lock().unwrap().push_back(reply);
    }

    pub(crate) fn push_messages(&self, reply: Result<Vec<Message>, ApiError>) {
        self.messages.lock().unwrap().push_back(reply);
    }

    pub(crate) fn push_send(&self, reply: Result<(), ApiError>) {
        self.sends.lock().unwrap().push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn send_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Send { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ConversationApi for ScriptedApi {
    async fn ping(&self) -> Result<String, ApiError> {
        self.record(Call::Ping);
        Ok("ok".to_string())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record(Call::ListConversations);
        self.conversations.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.record(Call::ListMessages(conversation_id.to_string()));
        self.messages.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<(), ApiError> {
        self.record(Call::Send {
            conversation_id: conversation_id.to_string(),
            text: text.to_string(),
        });
        self.sends.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub(crate) fn server_error() -> ApiError {
    ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub(crate) fn conversation(id: &str, name: &str, unread: u32, preview: Option<&str>) -> Conversation {
    Conversation {
        id: id.to_string(),
        display_name: name.to_string(),
        avatar_url: String::new(),
        description: format!("{name} description"),
        last_message_preview: preview.map(str::to_string),
        last_message_at: preview.map(|_| at(0)),
        presence: Presence::Offline,
        unread_count: unread,
        personality: None,
    }
}

pub(crate) fn message(id: &str, conversation_id: &str, sender: SenderKind, text: &str, secs: i64) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        sender_kind: sender,
        sender_name: match sender {
            SenderKind::User => "You".to_string(),
            SenderKind::Counterpart => "Maya".to_string(),
        },
        text: text.to_string(),
        created_at: at(secs),
        delivery_status: match sender {
            SenderKind::User => DeliveryStatus::Sent,
            SenderKind::Counterpart => DeliveryStatus::Delivered,
        },
        kind: MessageKind::Text,
    }
}
