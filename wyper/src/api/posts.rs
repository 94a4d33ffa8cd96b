use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{build_client, read_json};
use crate::models::Post;

#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>>;
    async fn get_post(&self, slug: &str) -> Result<Post>;
    async fn save_post(&self, post: &Post) -> Result<Post>;
}

pub struct PostsClient {
    client: Client,
    base_url: Url,
}

impl PostsClient {
    /// `base_url` is the API root, e.g. `http://localhost:7894/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let posts_url = format!("{}/posts", base_url.trim_end_matches('/'));
        Ok(Self {
            client: build_client(timeout)?,
            base_url: Url::parse(&posts_url)
                .with_context(|| format!("Invalid API URL {base_url}"))?,
        })
    }

    /// The slug is one percent-encoded path segment, whatever it contains.
    fn post_url(&self, slug: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL {} cannot take a path", self.base_url))?
            .push(slug);
        Ok(url)
    }
}

#[async_trait]
impl PostsApi for PostsClient {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let response = self.client.get(self.base_url.clone()).send().await?;
        read_json(response, "listing posts").await
    }

    async fn get_post(&self, slug: &str) -> Result<Post> {
        let response = self.client.get(self.post_url(slug)?).send().await?;
        read_json(response, &format!("fetching post {slug}")).await
    }

    async fn save_post(&self, post: &Post) -> Result<Post> {
        let response = self
            .client
            .post(self.base_url.clone())
            .json(post)
            .send()
            .await?;
        read_json(response, &format!("saving post {}", post.slug)).await
    }
}
