//! Reachability and content-type probing of remote URLs.
//!
//! Each check performs its own network round trip; nothing is shared
//! between checks, so a full ingestion probes the same URL several times.

use reqwest::{Client, header::CONTENT_TYPE};

/// Probes remote URLs ahead of ingestion. Transport errors never propagate;
/// they read as "unreachable".
#[derive(Debug, Clone)]
pub struct UrlProber {
    client: Client,
}

impl UrlProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// True iff the URL answers with a success status.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// True iff the URL answers with a success status AND declares an
    /// `image/*` content type. An absent header reads as "not an image".
    pub async fn is_image(&self, url: &str) -> bool {
        matches!(self.content_type(url).await, Some(ct) if ct.starts_with("image/"))
    }

    /// The declared `Content-Type` of a successful response.
    pub async fn content_type(&self, url: &str) -> Option<String> {
        let resp = self.client.get(url).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.headers()
            .get(CONTENT_TYPE)?
            .to_str()
            .ok()
            .map(str::to_owned)
    }
}
