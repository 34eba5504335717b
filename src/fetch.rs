// src/fetch.rs
// =============================================================================
// This module downloads the pages whose links we classify.
//
// Redirects are followed, and the URL we end up at is reported back: relative
// links on a page are relative to where the page actually lives, not to the
// URL we first asked for.
//
// Several pages are fetched concurrently, but results come back in the same
// order the URLs were given (StreamExt::buffered, not buffer_unordered).
// =============================================================================

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::debug;

// A downloaded page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL after redirects
    pub url: String,
    /// The response body
    pub html: String,
}

// Creates the HTTP client shared by all requests
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("Failed to create HTTP client")
}

// Fetches a web page and returns its final URL and HTML content
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    if !is_fetchable(url) {
        return Err(anyhow!("Not an http(s) URL: {}", url));
    }

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP {} for {}", response.status(), url));
    }

    let final_url = response.url().to_string();
    if final_url != url {
        debug!("Redirected: {} -> {}", url, final_url);
    }

    let html = response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;

    Ok(FetchedPage {
        url: final_url,
        html,
    })
}

// Fetches many pages, at most `concurrency` at a time
//
// Returns one (requested_url, result) pair per input URL, in input order.
pub async fn fetch_pages(
    client: &Client,
    urls: Vec<String>,
    concurrency: usize,
) -> Vec<(String, Result<FetchedPage>)> {
    let futures = urls.into_iter().map(|url| async move {
        let result = fetch_page(client, &url).await;
        (url, result)
    });

    stream::iter(futures)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

fn is_fetchable(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
