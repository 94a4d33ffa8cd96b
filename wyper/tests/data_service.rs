use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use wyper::api::{PostsApi, PostsClient};
use wyper::models::{Post, PostInput, SaveOutcome};
use wyper::services::{DataService, Editor};
use wyper::storage::{KeyValueStore, MemoryStorage, StorageKey};
use wyper::store::LocalStore;

#[derive(Default)]
struct FakePostsApi {
    online: bool,
    posts: Vec<Post>,
    saved: Mutex<Vec<Post>>,
}

impl FakePostsApi {
    fn offline() -> Self {
        Self::default()
    }

    fn online(posts: Vec<Post>) -> Self {
        Self {
            online: true,
            posts,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PostsApi for FakePostsApi {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        if !self.online {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.posts.clone())
    }

    async fn get_post(&self, slug: &str) -> Result<Post> {
        if !self.online {
            return Err(anyhow!("connection refused"));
        }
        self.posts
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .ok_or_else(|| anyhow!("fetching post {slug} failed with status 404 Not Found"))
    }

    async fn save_post(&self, post: &Post) -> Result<Post> {
        if !self.online {
            return Err(anyhow!("connection refused"));
        }
        self.saved.lock().unwrap().push(post.clone());
        Ok(post.clone())
    }
}

fn seeded_store() -> Arc<LocalStore> {
    let store = LocalStore::new(Arc::new(MemoryStorage::new()));
    store.initialize().unwrap();
    Arc::new(store)
}

fn remote_post(slug: &str, title: &str) -> Post {
    Post::from_document(
        slug.to_string(),
        &format!("---\ntitle: \"{title}\"\n---\nRemote body"),
        "https://images.example.com/",
    )
}

#[tokio::test]
async fn test_get_all_posts_falls_back_to_local_store() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::offline(), store.clone());

    let posts = service.get_all_posts().await;

    assert_eq!(posts, store.list_posts());
    assert_eq!(posts.len(), 5);
}

#[tokio::test]
async fn test_get_all_posts_prefers_remote() {
    let store = seeded_store();
    let remote = vec![remote_post("remote-one", "Remote One")];
    let service = DataService::new(FakePostsApi::online(remote.clone()), store);

    assert_eq!(service.get_all_posts().await, remote);
}

#[tokio::test]
async fn test_get_post_by_slug_fallback_and_not_found() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::offline(), store);

    let welcome = service.get_post_by_slug("welcome").await.unwrap();
    assert_eq!(welcome.title, "Welcome to wyperBlog");
    assert!(service.get_post_by_slug("missing").await.is_none());
}

#[tokio::test]
async fn test_remote_not_found_falls_back_to_local_copy() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::online(vec![]), store);

    let post = service.get_post_by_slug("rust-for-web").await.unwrap();
    assert_eq!(post.slug, "rust-for-web");
}

#[tokio::test]
async fn test_remote_save_is_mirrored_locally() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::online(vec![]), store.clone());

    let outcome = service
        .save_post(PostInput::new("---\ntitle: \"Fresh\"\ntags: [rust]\n---\nHello"))
        .await
        .unwrap();

    let SaveOutcome::Published(post) = &outcome else {
        panic!("expected a remote save, got {outcome:?}");
    };
    assert!(post.slug.starts_with("fresh-"));
    assert_eq!(post.tags, vec!["rust"]);

    let local = store.get_post(&post.slug).unwrap();
    assert_eq!(local.title, "Fresh");
    assert_eq!(local.content, "Hello");
    assert_eq!(store.list_posts()[0].slug, post.slug);
}

#[tokio::test]
async fn test_remote_and_mirror_share_the_slug() {
    let store = seeded_store();
    let api = FakePostsApi::online(vec![]);
    let service = DataService::new(api, store.clone());

    let outcome = service
        .save_post(PostInput::new("---\ntitle: Same Slug\n---\nBody"))
        .await
        .unwrap();

    assert_eq!(store.list_posts()[0].slug, outcome.post().slug);
    assert_eq!(store.list_posts().len(), 6);
}

#[tokio::test]
async fn test_failed_remote_save_keeps_post_locally() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::offline(), store.clone());

    let outcome = service
        .save_post(PostInput::new("---\ntitle: \"Updated\"\n---\nBody").with_slug("welcome"))
        .await
        .unwrap();

    assert!(outcome.is_local_only());
    assert_eq!(outcome.post().title, "Updated");
    assert_eq!(store.get_post("welcome").unwrap().title, "Updated");
    assert_eq!(store.list_posts().len(), 5);
}

struct BrokenStorage;

impl KeyValueStore for BrokenStorage {
    fn get(&self, _key: StorageKey) -> Result<Option<String>> {
        Err(anyhow!("disk on fire"))
    }

    fn set(&self, _key: StorageKey, _value: &str) -> Result<()> {
        Err(anyhow!("disk on fire"))
    }

    fn remove(&self, _key: StorageKey) -> Result<()> {
        Err(anyhow!("disk on fire"))
    }
}

#[tokio::test]
async fn test_save_errors_only_when_both_tiers_fail() {
    let store = Arc::new(LocalStore::new(Arc::new(BrokenStorage)));

    let offline = DataService::new(FakePostsApi::offline(), store.clone());
    assert!(offline.save_post(PostInput::new("body")).await.is_err());
    assert!(offline.get_all_posts().await.is_empty());

    let online = DataService::new(FakePostsApi::online(vec![]), store);
    let outcome = online.save_post(PostInput::new("body")).await.unwrap();
    assert!(!outcome.is_local_only());
}

#[tokio::test]
async fn test_unwritable_store_still_serves_remote_posts() {
    let store = Arc::new(LocalStore::new(Arc::new(BrokenStorage)));
    assert!(!store.initialize_or_warn());

    let remote = vec![remote_post("remote-one", "Remote One")];
    let service = DataService::new(FakePostsApi::online(remote.clone()), store);

    assert_eq!(service.get_all_posts().await, remote);
    assert_eq!(
        service.get_post_by_slug("remote-one").await.unwrap().title,
        "Remote One"
    );
}

#[tokio::test]
async fn test_unreachable_backend_serves_local_posts() {
    let store = seeded_store();
    let api = PostsClient::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    let service = DataService::new(api, store.clone());

    assert_eq!(service.get_all_posts().await, store.list_posts());
    assert!(service.get_post_by_slug("welcome").await.is_some());
}

#[tokio::test]
async fn test_editor_round_trip_updates_in_place() {
    let store = seeded_store();
    let service = DataService::new(FakePostsApi::offline(), store.clone());
    let editor = Editor::new(&service);

    let post = service.get_post_by_slug("rust-for-web").await.unwrap();
    let draft = editor.start_editing(&post).unwrap();
    assert!(draft.is_edit_mode());
    assert_eq!(store.draft().as_deref(), Some(draft.content.as_str()));

    let edited = draft.content.replace("WebAssembly with Rust", "Rust on the Web");
    editor.autosave(&edited).unwrap();
    assert!(editor.open_draft().restored);

    let outcome = editor.publish(&edited).await.unwrap();
    assert!(outcome.is_local_only());
    assert_eq!(outcome.post().slug, "rust-for-web");
    assert_eq!(store.list_posts().len(), 5);
    assert_eq!(
        store.get_post("rust-for-web").unwrap().title,
        "Rust on the Web"
    );
    assert_eq!(store.draft(), None);
    assert!(!editor.open_draft().restored);
}
