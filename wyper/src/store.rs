//! The local persisted store: posts, chat history and a few session values,
//! kept as JSON strings in a [`KeyValueStore`].
//!
//! Reads never fail. A missing or corrupted collection reads as empty, so a
//! damaged data directory degrades to "no local data" instead of taking the
//! caller down. Writes do fail, and the caller decides how loudly.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::ValueEnum;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::post::DEFAULT_IMAGE_BASE;
use crate::models::{ChatMessage, NewChatMessage, Post, PostInput};
use crate::seed::{SEED_CHAT, SEED_POSTS};
use crate::storage::{KeyValueStore, StorageKey};

pub const MAX_CHAT_HISTORY: usize = 50;

/// Session marker that unlocks authoring. Not a security boundary.
pub const AUTHOR_MARKER: &str = "wyper-admin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct LocalStore {
    storage: Arc<dyn KeyValueStore>,
    image_base: String,
    // held across each read-modify-write of the matching collection
    posts_lock: Mutex<()>,
    chat_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            posts_lock: Mutex::new(()),
            chat_lock: Mutex::new(()),
        }
    }

    pub fn with_image_base(mut self, image_base: impl Into<String>) -> Self {
        self.image_base = image_base.into();
        self
    }

    pub fn image_base(&self) -> &str {
        &self.image_base
    }

    /// Seeds the sample posts and chat on first run. Existing collections,
    /// even corrupted ones, are left alone.
    pub fn initialize(&self) -> Result<()> {
        {
            let _guard = lock(&self.posts_lock)?;
            if self.storage.get(StorageKey::Posts)?.is_none() {
                let posts: Vec<Post> = SEED_POSTS
                    .iter()
                    .map(|doc| Post::from_document(doc.slug.to_string(), doc.content, &self.image_base))
                    .collect();
                self.write(StorageKey::Posts, &posts)?;
                info!("seeded {} sample posts", posts.len());
            }
        }

        let _guard = lock(&self.chat_lock)?;
        if self.storage.get(StorageKey::Chat)?.is_none() {
            self.storage
                .set(StorageKey::Chat, SEED_CHAT)
                .context("Failed to seed chat history")?;
            info!("seeded sample chat history");
        }

        Ok(())
    }

    /// [`initialize`](Self::initialize) for callers that can run without a
    /// writable local tier. A failure is logged and reported as `false`.
    pub fn initialize_or_warn(&self) -> bool {
        match self.initialize() {
            Ok(()) => true,
            Err(e) => {
                warn!("local store unavailable, continuing without it: {e:#}");
                false
            }
        }
    }

    /// Newest saved first.
    pub fn list_posts(&self) -> Vec<Post> {
        self.read(StorageKey::Posts)
    }

    pub fn get_post(&self, slug: &str) -> Option<Post> {
        self.list_posts().into_iter().find(|post| post.slug == slug)
    }

    /// Re-parses the full document, then replaces the post with the same slug
    /// or puts a new one in front.
    pub fn save_post(&self, input: &PostInput) -> Result<Post> {
        let post = Post::from_document(input.resolve_slug(), &input.content, &self.image_base);

        let _guard = lock(&self.posts_lock)?;
        let mut posts: Vec<Post> = self.read(StorageKey::Posts);
        match posts.iter_mut().find(|existing| existing.slug == post.slug) {
            Some(existing) => {
                debug!("replacing local post {}", post.slug);
                *existing = post.clone();
            }
            None => {
                debug!("adding local post {}", post.slug);
                posts.insert(0, post.clone());
            }
        }
        self.write(StorageKey::Posts, &posts)?;

        Ok(post)
    }

    pub fn list_chat(&self) -> Vec<ChatMessage> {
        self.read(StorageKey::Chat)
    }

    /// Stamps and appends a message, keeping only the newest
    /// [`MAX_CHAT_HISTORY`] entries.
    pub fn add_chat(&self, message: NewChatMessage) -> Result<Vec<ChatMessage>> {
        let _guard = lock(&self.chat_lock)?;
        let mut chats: Vec<ChatMessage> = self.read(StorageKey::Chat);

        let now = Utc::now();
        let newest = chats.iter().map(|chat| chat.id).max().unwrap_or(0);
        let id = now.timestamp_millis().max(newest + 1);
        chats.push(message.stamp(id, now));

        if chats.len() > MAX_CHAT_HISTORY {
            let excess = chats.len() - MAX_CHAT_HISTORY;
            chats.drain(..excess);
        }
        self.write(StorageKey::Chat, &chats)?;

        Ok(chats)
    }

    pub fn draft(&self) -> Option<String> {
        self.read_raw(StorageKey::Draft)
    }

    pub fn save_draft(&self, document: &str) -> Result<()> {
        self.storage
            .set(StorageKey::Draft, document)
            .context("Failed to save draft")
    }

    pub fn clear_draft(&self) -> Result<()> {
        self.storage.remove(StorageKey::Draft)
    }

    pub fn theme(&self) -> Theme {
        match self.read_raw(StorageKey::Theme).as_deref() {
            Some(value) => Theme::from_str(value, true).unwrap_or_else(|_| {
                warn!("unknown theme {value:?} in storage, using dark");
                Theme::Dark
            }),
            None => Theme::default(),
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.storage.set(StorageKey::Theme, theme.as_str())
    }

    pub fn session_user(&self) -> Option<String> {
        self.read_raw(StorageKey::SessionUser)
    }

    pub fn set_session_user(&self, user: Option<&str>) -> Result<()> {
        match user {
            Some(user) => self.storage.set(StorageKey::SessionUser, user),
            None => self.storage.remove(StorageKey::SessionUser),
        }
    }

    pub fn is_author(&self) -> bool {
        self.session_user().as_deref() == Some(AUTHOR_MARKER)
    }

    fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Vec<T> {
        let Some(raw) = self.read_raw(key) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("{key} is corrupted, treating it as empty: {e}");
            Vec::new()
        })
    }

    fn read_raw(&self, key: StorageKey) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|e| {
            warn!("cannot read {key}: {e:#}");
            None
        })
    }

    fn write<T: Serialize>(&self, key: StorageKey, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        self.storage
            .set(key, &json)
            .with_context(|| format!("Failed to persist {key}"))
    }
}

fn lock(mutex: &Mutex<()>) -> Result<MutexGuard<'_, ()>> {
    mutex.lock().map_err(|_| anyhow!("local store lock poisoned"))
}
