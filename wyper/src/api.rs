pub mod posts;
pub mod talk;

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, header};
use serde::de::DeserializeOwned;

pub use posts::{PostsApi, PostsClient};
pub use talk::{TalkApi, TalkClient};

fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Decodes a JSON body, turning non-2xx statuses into errors that carry the
/// response text.
async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "{what} failed with status {}: {}",
            status,
            error_text
        ));
    }

    response
        .json()
        .await
        .with_context(|| format!("{what} returned an unreadable body"))
}
