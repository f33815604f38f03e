use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;

use crate::service::scrape::{clean, parse_selector, Scrape as _};
use crate::service::{Document, Transport};
use crate::{cancellable, JudgeError, Result};

/// Something whose presence on a page means a known state was reached.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Any element matching the selector.
    Element(Selector),
    /// An element matching the selector whose text matches the pattern.
    ElementText(Selector, Regex),
    /// A pattern over the raw page source. The first capture group, if any,
    /// is the marker text.
    Source(Regex),
}

impl Marker {
    pub fn element(sel: &str) -> Result<Self> {
        Ok(Self::Element(parse_selector(sel)?))
    }

    pub fn element_text(sel: &str, pattern: &str) -> Result<Self> {
        Ok(Self::ElementText(parse_selector(sel)?, Regex::new(pattern)?))
    }

    pub fn source(pattern: &str) -> Result<Self> {
        Ok(Self::Source(Regex::new(pattern)?))
    }

    /// Cleaned text of the marker if it is present.
    pub fn find(&self, doc: &Document) -> Option<String> {
        self.find_in(&doc.html(), doc.body())
    }

    fn find_in(&self, html: &Html, body: &str) -> Option<String> {
        match self {
            Self::Element(sel) => html
                .root_element()
                .select(sel)
                .next()
                .map(|elem| clean(&elem.inner_text())),
            Self::ElementText(sel, pattern) => html
                .root_element()
                .select(sel)
                .map(|elem| clean(&elem.inner_text()))
                .find(|text| pattern.is_match(text)),
            Self::Source(pattern) => pattern.captures(body).map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| clean(m.as_str()))
                    .unwrap_or_default()
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The site reported a message instead of the expected content.
    Notified(String),
    /// The success marker with this index is present.
    Ready(usize),
}

/// Decides whether a loaded page is usable.
///
/// The site notification marker is checked against the caller's success
/// markers. A notification always wins over success markers present on the
/// same page, so a page is never trusted while the site is complaining.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    notification: Marker,
    attempts: usize,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new(notification: Marker, attempts: usize, interval: Duration) -> Self {
        Self {
            notification,
            attempts: attempts.max(1),
            interval,
        }
    }

    pub fn notification(&self) -> &Marker {
        &self.notification
    }

    /// Classifies the current state of `doc` without waiting.
    pub fn check(&self, doc: &Document, markers: &[Marker]) -> Option<Readiness> {
        let html = doc.html();
        if let Some(message) = self.notification.find_in(&html, doc.body()) {
            return Some(Readiness::Notified(message));
        }
        markers
            .iter()
            .position(|marker| marker.find_in(&html, doc.body()).is_some())
            .map(Readiness::Ready)
    }

    /// Re-reads `doc` until a notification or a success marker shows up.
    ///
    /// Returns the document that satisfied the gate. Fails with
    /// `PageNotReady` when neither appears within the configured attempts.
    pub async fn wait(
        &self,
        transport: &dyn Transport,
        mut doc: Document,
        markers: &[Marker],
        cancel: &CancellationToken,
    ) -> Result<(Document, Readiness)> {
        for attempt in 0..self.attempts {
            if let Some(readiness) = self.check(&doc, markers) {
                return Ok((doc, readiness));
            }
            if attempt + 1 == self.attempts {
                break;
            }
            log::debug!("Waiting for {} to become ready", doc.url());
            cancellable(cancel, async {
                tokio::time::sleep(self.interval).await;
                Ok(())
            })
            .await?;
            doc = cancellable(cancel, transport.poll(&doc)).await?;
        }
        Err(JudgeError::PageNotReady(doc.url().to_string()).into())
    }

    /// Like [`ReadinessGate::wait`] but turns a notification into an error.
    pub async fn ensure(
        &self,
        transport: &dyn Transport,
        doc: Document,
        markers: &[Marker],
        cancel: &CancellationToken,
    ) -> Result<(Document, usize)> {
        match self.wait(transport, doc, markers, cancel).await? {
            (_, Readiness::Notified(message)) => Err(JudgeError::SiteNotification(message).into()),
            (doc, Readiness::Ready(index)) => Ok((doc, index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use cptool_util::assert_matches;

    use super::*;
    use crate::testing::{doc, FakeTransport};

    fn gate() -> ReadinessGate {
        ReadinessGate::new(
            Marker::source(r#"Judge\.showMessage\("(.+)"\);"#).unwrap(),
            3,
            Duration::from_millis(100),
        )
    }

    fn markers() -> Vec<Marker> {
        vec![
            Marker::element("table.contests").unwrap(),
            Marker::element_text("div.closed", "(?i)closed").unwrap(),
        ]
    }

    #[test]
    fn test_check() {
        let gate = gate();
        let tests = &[
            (r#"<table class="contests"></table>"#, Some(Readiness::Ready(0))),
            (r#"<div class="closed">Submission closed</div>"#, Some(Readiness::Ready(1))),
            (r#"<div class="closed">Open</div>"#, None),
            (
                r#"<table class="contests"></table><script>Judge.showMessage("You are not allowed to view the requested page");</script>"#,
                Some(Readiness::Notified(
                    "You are not allowed to view the requested page".into(),
                )),
            ),
            ("<p>loading</p>", None),
        ];
        for (body, expected) in tests {
            assert_eq!(gate.check(&doc("https://judge.test/", body), &markers()), *expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_ready() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        transport.push_polls(&[
            "<p>loading</p>",
            r#"<table class="contests"></table>"#,
        ]);
        let first = doc("https://judge.test/contests", "<p>loading</p>");
        let (doc, index) = gate()
            .ensure(&transport, first, &markers(), &CancellationToken::new())
            .await?;
        assert_eq!(index, 0);
        assert!(doc.body().contains("contests"));
        assert_eq!(transport.poll_count(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_gives_up() {
        let transport = FakeTransport::new();
        transport.push_polls(&["<p>loading</p>", "<p>loading</p>"]);
        let first = doc("https://judge.test/contests", "<p>loading</p>");
        let err = gate()
            .ensure(&transport, first, &markers(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_matches!(JudgeError::find(&err) => Some(JudgeError::PageNotReady(_)));
    }

    #[tokio::test]
    async fn test_notification_is_an_error() {
        let transport = FakeTransport::new();
        let first = doc(
            "https://judge.test/contests",
            r#"<script>Judge.showMessage("Too many requests<br/>Try again later");</script>"#,
        );
        let err = gate()
            .ensure(&transport, first, &markers(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            JudgeError::find(&err),
            Some(&JudgeError::SiteNotification(
                "Too many requests\nTry again later".into()
            ))
        );
    }
}
