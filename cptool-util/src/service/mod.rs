use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::Response;

use crate::Result;

mod cookie;
mod document;
pub mod scrape;
pub mod session;

pub use self::cookie::CookieStorage;
pub use document::Document;
pub use reqwest::{StatusCode, Url};
pub use session::{HttpSession, RetryPolicy};

/// Ordered `name=value` pairs of an urlencoded form.
pub type Form = Vec<(String, String)>;

/// Loads judge pages.
///
/// Implementations share one cookie jar, so every document fetched through a
/// transport is seen through the same authenticated identity.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Document>;

    async fn post_form(&self, url: &Url, form: &Form) -> Result<Document>;

    /// Re-reads the current state of an already loaded page.
    async fn poll(&self, doc: &Document) -> Result<Document> {
        self.get(doc.url()).await
    }

    /// Forgets every cookie of the shared jar.
    fn clear_cookies(&self) -> Result<()> {
        Ok(())
    }
}

pub trait ResponseExt {
    fn location_url(&self, base: &Url) -> Result<Url>;
}

impl ResponseExt for Response {
    fn location_url(&self, base: &Url) -> Result<Url> {
        let loc_str = self
            .headers()
            .get(LOCATION)
            .context("Could not find location header in response")?
            .to_str()?;
        base.join(loc_str)
            .context("Could not parse redirection url")
    }
}
