//! The conversation list: one authoritative snapshot from the server plus
//! the filter and search text that shape what the sidebar shows.

use std::sync::Arc;

use futures::FutureExt;
use log::{debug, warn};

use crate::Request;
use crate::api::{Conversation, ConversationApi};
use crate::error::{ApiError, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    #[default]
    All,
    Unread,
    Favourites,
    Groups,
}

impl FilterKind {
    pub const ALL: [FilterKind; 4] = [
        FilterKind::All,
        FilterKind::Unread,
        FilterKind::Favourites,
        FilterKind::Groups,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::All => "All",
            FilterKind::Unread => "Unread",
            FilterKind::Favourites => "Favourites",
            FilterKind::Groups => "Groups",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(name.trim()))
    }

    /// Favourites and groups are selectable but have no selection rule yet;
    /// they pass every conversation through like `All`.
    pub fn is_pending(self) -> bool {
        matches!(self, FilterKind::Favourites | FilterKind::Groups)
    }

    /// Text of the filter pill. Only "Unread" carries a count, and only when
    /// it is non-zero.
    pub fn pill_label(self, unread_total: usize) -> String {
        match self {
            FilterKind::Unread if unread_total > 0 => format!("{} {}", self.label(), unread_total),
            _ => self.label().to_string(),
        }
    }

    fn admits(self, conversation: &Conversation) -> bool {
        match self {
            FilterKind::Unread => conversation.is_unread(),
            FilterKind::All | FilterKind::Favourites | FilterKind::Groups => true,
        }
    }
}

/// What the sidebar renders: the visible rows, in server order, and the
/// count backing the "Unread" pill.
#[derive(Debug)]
pub struct ConversationView<'a> {
    pub items: Vec<&'a Conversation>,
    pub unread_total: usize,
}

/// Result of a `refresh` request, to be fed back through `apply`.
#[derive(Debug)]
pub struct ListEvent {
    outcome: Result<Vec<Conversation>, ApiError>,
}

pub struct ConversationListController {
    api: Arc<dyn ConversationApi>,
    conversations: Vec<Conversation>,
    filter: FilterKind,
    search: String,
    // Refreshes issued but not yet applied.
    pending_refreshes: usize,
}

impl ConversationListController {
    pub fn new(api: Arc<dyn ConversationApi>) -> Self {
        Self {
            api,
            conversations: Vec::new(),
            filter: FilterKind::All,
            search: String::new(),
            pending_refreshes: 0,
        }
    }

    /// Start fetching the conversation list.
    ///
    /// Overlapping refreshes are not coalesced: whichever response is applied
    /// last replaces the list.
    pub fn refresh(&mut self) -> Request<ListEvent> {
        self.pending_refreshes += 1;
        let api = Arc::clone(&self.api);
        async move {
            ListEvent {
                outcome: api.list_conversations().await,
            }
        }
        .boxed()
    }

    /// Reconcile a finished refresh. On failure the previous list is kept.
    pub fn apply(&mut self, event: ListEvent) -> Option<Notice> {
        self.pending_refreshes = self.pending_refreshes.saturating_sub(1);
        match event.outcome {
            Ok(conversations) => {
                debug!("conversation list replaced ({} entries)", conversations.len());
                self.conversations = conversations;
                None
            }
            Err(err) => {
                warn!("failed to load conversations: {}", err);
                Some(Notice::failure("load chats", &err))
            }
        }
    }

    pub fn set_filter(&mut self, filter: FilterKind) {
        self.filter = filter;
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    /// True while any refresh is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending_refreshes > 0
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Number of conversations with anything unread, regardless of filter
    /// or search.
    pub fn unread_total(&self) -> usize {
        self.conversations.iter().filter(|c| c.is_unread()).count()
    }

    pub fn derived_view(&self) -> ConversationView<'_> {
        let needle = (!self.search.is_empty()).then(|| self.search.to_lowercase());
        let items = self
            .conversations
            .iter()
            .filter(|c| self.filter.admits(c))
            .filter(|c| needle.as_deref().is_none_or(|n| c.matches_search(n)))
            .collect();
        ConversationView {
            items,
            unread_total: self.unread_total(),
        }
    }
}
