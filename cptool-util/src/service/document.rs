use reqwest::{StatusCode, Url};
use scraper::Html;

/// A fetched page: final address after redirects, status and raw body.
///
/// The body is kept as text so documents can cross task boundaries; parse it
/// with [`Document::html`] inside synchronous code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: Url,
    status: StatusCode,
    body: String,
}

impl Document {
    pub fn new(url: Url, status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            body: body.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}
