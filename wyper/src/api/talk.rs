use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::{build_client, read_json};
use crate::models::chat::OutgoingMessage;
use crate::models::{ChatMessage, CurrentUser};

#[async_trait]
pub trait TalkApi: Send + Sync {
    /// The pseudonymous name the server gives this client.
    async fn current_user(&self) -> Result<String>;
    async fn list_messages(&self) -> Result<Vec<ChatMessage>>;
    async fn send_message(&self, content: &str) -> Result<ChatMessage>;
}

pub struct TalkClient {
    client: Client,
    base_url: String,
}

impl TalkClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: format!("{}/talk", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl TalkApi for TalkClient {
    async fn current_user(&self) -> Result<String> {
        let url = format!("{}/current-user", self.base_url);
        let response = self.client.get(&url).send().await?;
        let current: CurrentUser = read_json(response, "resolving current user").await?;
        Ok(current.user)
    }

    async fn list_messages(&self) -> Result<Vec<ChatMessage>> {
        let response = self.client.get(&self.base_url).send().await?;
        read_json(response, "listing messages").await
    }

    async fn send_message(&self, content: &str) -> Result<ChatMessage> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&OutgoingMessage { content })
            .send()
            .await?;
        read_json(response, "sending message").await
    }
}
