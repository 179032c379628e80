pub mod client;
pub mod models;

pub use client::{ApiClient, ConversationApi};
pub use models::{
    Conversation, DeliveryStatus, Message, MessageKind, Presence, SenderKind, StatusGlyph, Ticks,
};
