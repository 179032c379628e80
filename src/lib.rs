//! Client-side synchronization for a conversational chat backend.
//!
//! Two controllers own all mutable state: [`ConversationListController`] for
//! the sidebar and [`MessageThreadController`] for the open thread. Network
//! work is handed out as [`Request`] futures; whoever drives them feeds the
//! result back through the controller's `apply`, on the same context that
//! owns the controller.

pub mod api;
pub mod config;
pub mod conversations;
pub mod error;
pub mod thread;
pub mod time_format;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, Conversation, ConversationApi, Message};
pub use conversations::{ConversationListController, ConversationView, FilterKind, ListEvent};
pub use error::{ApiError, ConfigError, Notice, SendRejected};
pub use thread::{MessageThreadController, ScrollAnchor, ThreadEvent, ThreadPhase};

/// A pending remote call. Drive it to completion and pass the output to the
/// issuing controller's `apply`.
pub type Request<E> = futures::future::BoxFuture<'static, E>;
