use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::api::PostsApi;
use crate::models::{Post, PostInput, SaveOutcome};
use crate::store::LocalStore;

/// Remote first, local store when the remote is down. Nothing the remote
/// does wrong reaches the caller as an error.
pub struct DataService<P> {
    api: P,
    store: Arc<LocalStore>,
}

impl<P: PostsApi> DataService<P> {
    pub fn new(api: P, store: Arc<LocalStore>) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub async fn get_all_posts(&self) -> Vec<Post> {
        match self.api.list_posts().await {
            Ok(posts) => {
                info!("loaded {} posts from the backend", posts.len());
                posts
            }
            Err(e) => {
                warn!("backend unavailable, using local posts: {e:#}");
                self.store.list_posts()
            }
        }
    }

    /// `None` means the post exists neither remotely nor locally.
    pub async fn get_post_by_slug(&self, slug: &str) -> Option<Post> {
        match self.api.get_post(slug).await {
            Ok(post) => Some(post),
            Err(e) => {
                warn!("cannot fetch post {slug} from the backend, using local copy: {e:#}");
                self.store.get_post(slug)
            }
        }
    }

    /// Fails only when the remote is down and the local fallback cannot be
    /// written either.
    pub async fn save_post(&self, input: PostInput) -> Result<SaveOutcome> {
        // resolve once so the remote copy and the local mirror share a slug
        let input = input.with_resolved_slug();
        let slug = input.resolve_slug();
        let post = Post::from_document(slug, &input.content, self.store.image_base());

        match self.api.save_post(&post).await {
            Ok(saved) => {
                if let Err(e) = self.store.save_post(&input) {
                    warn!("saved {} remotely but could not mirror it locally: {e:#}", saved.slug);
                }
                info!("saved {} to the backend and local store", saved.slug);
                Ok(SaveOutcome::Published(saved))
            }
            Err(e) => {
                warn!("saving {} to the backend failed, keeping it locally: {e:#}", post.slug);
                let local = self.store.save_post(&input)?;
                Ok(SaveOutcome::SavedLocally(local))
            }
        }
    }
}
