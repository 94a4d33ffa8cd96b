//! Group chat over plain polling.
//!
//! A [`ChatSession`] replaces its whole message list with the server's list on
//! every poll. Polls may overlap; each carries a sequence number and a
//! response older than the last applied one is dropped. Once the session is
//! closed every late response is dropped as well.
//!
//! A sent message counts as an update too: polls still in flight when it is
//! appended are dropped, so the list never loses a message it just showed.
//!
//! Messages that could not be delivered are kept as [`Delivery::LocalOnly`]
//! entries and in the bounded local chat history. The server never learns
//! about them, and the next successful poll replaces them with the server's
//! view. When a poll falls back to that history, only the guest messages this
//! client wrote are shown as local only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::api::TalkApi;
use crate::models::{ChatEntry, NewChatMessage, SendOutcome};
use crate::store::LocalStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);
/// Distance from the bottom, in pixels, that still counts as "at the bottom".
pub const SCROLL_THRESHOLD: f64 = 10.0;
/// Pause between applying a poll and scrolling, so layout can settle.
pub const SCROLL_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Whatever draws the chat.
pub trait ChatView: Send + Sync {
    fn render(&self, entries: &[ChatEntry], current_user: Option<&str>);
    fn scroll_to_latest(&self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollPosition {
    pub fn is_near_bottom(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - SCROLL_THRESHOLD
    }
}

pub struct ChatClient<A> {
    api: A,
    store: Arc<LocalStore>,
}

impl<A: TalkApi + 'static> ChatClient<A> {
    pub fn new(api: A, store: Arc<LocalStore>) -> Self {
        Self { api, store }
    }

    /// A session that only polls when asked to via [`ChatSession::refresh`].
    pub fn session(self, view: Arc<dyn ChatView>) -> ChatSession<A> {
        ChatSession {
            shared: Arc::new(Shared {
                api: self.api,
                store: self.store,
                view,
                state: Mutex::new(ChatState {
                    entries: Vec::new(),
                    current_user: None,
                    auto_scroll: true,
                    issued: 0,
                    applied: 0,
                    open: true,
                }),
            }),
            ticker: Mutex::new(None),
        }
    }

    /// Resolves the current user and starts polling every `poll_interval`.
    pub fn open(self, view: Arc<dyn ChatView>, poll_interval: Duration) -> ChatSession<A> {
        let session = self.session(view);

        tokio::spawn(Arc::clone(&session.shared).resolve_current_user());

        let shared = Arc::clone(&session.shared);
        let ticker = tokio::spawn(async move {
            let mut interval = time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // polls run on their own so a slow one never holds up the timer
                tokio::spawn(Arc::clone(&shared).poll());
            }
        });
        *lock(&session.ticker) = Some(ticker);

        session
    }
}

struct ChatState {
    entries: Vec<ChatEntry>,
    current_user: Option<String>,
    auto_scroll: bool,
    issued: u64,
    applied: u64,
    open: bool,
}

struct Shared<A> {
    api: A,
    store: Arc<LocalStore>,
    view: Arc<dyn ChatView>,
    state: Mutex<ChatState>,
}

impl<A> Shared<A> {
    fn state(&self) -> MutexGuard<'_, ChatState> {
        lock(&self.state)
    }
}

impl<A: TalkApi + 'static> Shared<A> {
    async fn resolve_current_user(self: Arc<Self>) {
        match self.api.current_user().await {
            Ok(user) => {
                let mut state = self.state();
                if state.open {
                    debug!("current chat user is {user}");
                    state.current_user = Some(user);
                }
            }
            Err(e) => warn!("cannot resolve current chat user: {e:#}"),
        }
    }

    async fn poll(self: Arc<Self>) {
        let seq = {
            let mut state = self.state();
            if !state.open {
                return;
            }
            state.issued += 1;
            state.issued
        };

        let (entries, delivered): (Vec<ChatEntry>, bool) = match self.api.list_messages().await {
            Ok(messages) => (
                messages.into_iter().map(ChatEntry::delivered).collect(),
                true,
            ),
            Err(e) => {
                warn!("cannot fetch chat messages, showing local history: {e:#}");
                let local = self.store.list_chat();
                (local.into_iter().map(ChatEntry::from_history).collect(), false)
            }
        };

        let scroll = {
            let mut state = self.state();
            if !state.open {
                debug!("dropping poll {seq} that finished after close");
                return;
            }
            if seq <= state.applied {
                debug!("dropping stale poll {seq}, already showing {}", state.applied);
                return;
            }
            state.applied = seq;
            state.entries = entries;
            self.view
                .render(&state.entries, state.current_user.as_deref());
            delivered && state.auto_scroll
        };

        if scroll {
            tokio::spawn(async move {
                time::sleep(SCROLL_SETTLE_DELAY).await;
                let still_wanted = {
                    let state = self.state();
                    state.open && state.auto_scroll
                };
                if still_wanted {
                    self.view.scroll_to_latest();
                }
            });
        }
    }

    fn append(&self, entry: ChatEntry) {
        let mut state = self.state();
        if !state.open {
            return;
        }
        state.entries.push(entry);
        // polls issued before this point no longer reflect the list
        state.applied = state.issued;
        state.auto_scroll = true;
        self.view
            .render(&state.entries, state.current_user.as_deref());
    }
}

pub struct ChatSession<A> {
    shared: Arc<Shared<A>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl<A: TalkApi + 'static> ChatSession<A> {
    /// Polls once and waits for the result to be applied (or dropped).
    pub async fn refresh(&self) {
        Arc::clone(&self.shared).poll().await;
    }

    /// Blank text is ignored. An `Err` means the message reached neither the
    /// server nor the local history.
    pub async fn send(&self, text: &str) -> Result<Option<SendOutcome>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        match self.shared.api.send_message(text).await {
            Ok(message) => {
                let id = message.id;
                self.shared.append(ChatEntry::delivered(message));
                Ok(Some(SendOutcome::Delivered { id }))
            }
            Err(e) => {
                warn!("cannot send chat message, keeping it locally: {e:#}");
                let mut history = self
                    .shared
                    .store
                    .add_chat(NewChatMessage::guest(text))
                    .context("Message was neither delivered nor saved locally")?;
                let message = history
                    .pop()
                    .context("local chat history is empty after append")?;
                let id = message.id;
                self.shared.append(ChatEntry::local_only(message));
                Ok(Some(SendOutcome::LocalOnly { id }))
            }
        }
    }
}

impl<A> ChatSession<A> {
    pub fn on_scroll(&self, position: ScrollPosition) {
        self.shared.state().auto_scroll = position.is_near_bottom();
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.shared.state().entries.clone()
    }

    pub fn current_user(&self) -> Option<String> {
        self.shared.state().current_user.clone()
    }

    pub fn auto_scroll(&self) -> bool {
        self.shared.state().auto_scroll
    }

    pub fn is_open(&self) -> bool {
        self.shared.state().open
    }

    /// Stops polling. Requests already in flight finish but change nothing.
    pub fn close(&self) {
        if let Some(ticker) = lock(&self.ticker).take() {
            ticker.abort();
        }
        self.shared.state().open = false;
    }
}

impl<A> Drop for ChatSession<A> {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_bottom_within_threshold() {
        let at_bottom = ScrollPosition {
            scroll_top: 500.0,
            scroll_height: 800.0,
            client_height: 300.0,
        };
        assert!(at_bottom.is_near_bottom());

        let just_inside = ScrollPosition {
            scroll_top: 491.0,
            ..at_bottom
        };
        assert!(just_inside.is_near_bottom());

        let scrolled_up = ScrollPosition {
            scroll_top: 400.0,
            ..at_bottom
        };
        assert!(!scrolled_up.is_near_bottom());
    }
}
