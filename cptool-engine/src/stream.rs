use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use cptool_config::PageErrorPolicy;

use crate::gate::Marker;
use crate::model::Page;
use crate::service::{Document, Url};
use crate::session::Session;
use crate::{cancellable, Error, JudgeError, Result};

/// Turns a loaded listing page into rows.
///
/// Implementations must not depend on anything but the document, so the
/// same document always yields the same rows.
pub trait Extract: Send + Sync + 'static {
    type Row: Send + 'static;

    /// Capacity of the channel carrying this listing.
    const CAPACITY: usize;

    fn first_url(&self) -> Result<Url>;

    /// Markers that show the listing has rendered.
    fn ready_markers(&self) -> &[Marker];

    fn extract(&self, doc: &Document, index: usize) -> Extracted<Self::Row>;
}

/// Result of one extraction. The continuation survives a failed row parse so
/// a broken page does not end the listing.
#[derive(Debug)]
pub struct Extracted<T> {
    pub rows: Result<Vec<T>>,
    pub next: Option<Url>,
}

impl<T> Extracted<T> {
    pub fn new(rows: Result<Vec<T>>, next: Option<Url>) -> Self {
        Self { rows, next }
    }
}

/// How many pages a listing may read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PageBudget {
    /// Until the listing has no next page.
    Unbounded,
    Limit(usize),
}

impl PageBudget {
    pub fn allows(self, pages: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Limit(limit) => pages < limit,
        }
    }
}

impl Default for PageBudget {
    fn default() -> Self {
        Self::Limit(1)
    }
}

#[derive(Debug)]
pub struct PageFailure {
    pub index: usize,
    pub url: Url,
    pub error: Error,
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "page {} ({}) failed : {:#}", self.index, self.url, self.error)
    }
}

#[derive(Debug)]
pub enum PageEvent<T> {
    Page(Page<T>),
    Failed(PageFailure),
}

/// Receiving half of a listing.
///
/// Dropping the stream or calling [`ListingStream::cancel`] stops the producer
/// at its next fetch, sleep or send.
pub struct ListingStream<T> {
    rx: mpsc::Receiver<PageEvent<T>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T> ListingStream<T> {
    pub(crate) fn new(
        rx: mpsc::Receiver<PageEvent<T>>,
        cancel: CancellationToken,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self { rx, cancel, task }
    }

    /// A stream that is already closed.
    pub(crate) fn closed() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self::new(rx, CancellationToken::new(), None)
    }

    pub async fn recv(&mut self) -> Option<PageEvent<T>> {
        self.rx.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits until the producer has exited.
    pub async fn join(mut self) -> Result<()> {
        self.rx.close();
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(()),
        }
    }

    /// Drains the stream, keeping every page and every failure in order.
    pub async fn collect(mut self) -> (Vec<Page<T>>, Vec<PageFailure>) {
        let mut pages = Vec::new();
        let mut failures = Vec::new();
        while let Some(event) = self.recv().await {
            match event {
                PageEvent::Page(page) => pages.push(page),
                PageEvent::Failed(failure) => failures.push(failure),
            }
        }
        (pages, failures)
    }
}

impl<T> Drop for ListingStream<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Sending half shared by the listing and tracking producers.
pub(crate) struct Emitter<T> {
    tx: mpsc::Sender<PageEvent<T>>,
    cancel: CancellationToken,
    policy: PageErrorPolicy,
}

impl<T> Emitter<T> {
    pub(crate) fn new(
        tx: mpsc::Sender<PageEvent<T>>,
        cancel: CancellationToken,
        policy: PageErrorPolicy,
    ) -> Self {
        Self { tx, cancel, policy }
    }

    pub(crate) fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sends unless cancelled. Returns `false` once nobody is listening.
    pub(crate) async fn send(&self, event: PageEvent<T>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.tx.send(event) => result.is_ok(),
        }
    }

    pub(crate) async fn fail(&self, index: usize, url: &Url, error: Error) -> bool {
        if is_cancelled(&error) {
            return false;
        }
        let failure = PageFailure {
            index,
            url: url.clone(),
            error,
        };
        match self.policy {
            PageErrorPolicy::Report => self.send(PageEvent::Failed(failure)).await,
            PageErrorPolicy::Skip => {
                log::warn!("Skipping {}", failure);
                true
            }
        }
    }
}

pub(crate) fn is_cancelled(err: &Error) -> bool {
    matches!(JudgeError::find(err), Some(JudgeError::Cancelled))
}

/// Reads a listing page by page on a background task.
#[derive(Clone)]
pub struct PaginatedStreamer {
    session: Session,
}

impl PaginatedStreamer {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Loads the first page and hands the rest of the listing to a background task.
    ///
    /// Errors of the first page, such as a site notification, are returned
    /// here. Later failures travel on the stream as [`PageEvent::Failed`]
    /// unless the session is configured to skip them.
    pub async fn stream<E: Extract>(
        &self,
        extractor: E,
        budget: PageBudget,
    ) -> Result<ListingStream<E::Row>> {
        if !budget.allows(0) {
            return Ok(ListingStream::closed());
        }
        let url = extractor.first_url()?;
        let lease = self.session.read_lease().await;
        let cancel = self.session.child_token();
        let (first, _) = self
            .session
            .navigate(&url, extractor.ready_markers(), &cancel)
            .await?;

        let (tx, rx) = mpsc::channel(E::CAPACITY);
        let emitter = Emitter::new(tx, cancel.clone(), self.session.conf().page_errors());
        let session = self.session.clone();
        let task = tokio::spawn(async move {
            let _lease = lease;
            run_listing(session, extractor, first, budget, emitter).await;
        });
        Ok(ListingStream::new(rx, cancel, Some(task)))
    }
}

async fn run_listing<E: Extract>(
    session: Session,
    extractor: E,
    mut doc: Document,
    budget: PageBudget,
    emitter: Emitter<E::Row>,
) {
    let mut index = 0;
    loop {
        let Extracted { rows, next } = extractor.extract(&doc, index);
        let delivered = match rows {
            Ok(rows) => {
                let page = Page::new(index, rows, next.is_some());
                emitter.send(PageEvent::Page(page)).await
            }
            Err(err) => emitter.fail(index, doc.url(), err).await,
        };
        index += 1;
        let next = match next {
            Some(next) if delivered && budget.allows(index) => next,
            _ => break,
        };
        match session
            .navigate(&next, extractor.ready_markers(), emitter.cancel())
            .await
        {
            Ok((next_doc, _)) => doc = next_doc,
            Err(err) => {
                // without the page there is no next link to follow
                emitter.fail(index, &next, err).await;
                break;
            }
        }
    }
    log::debug!("Listing finished after {} pages", index);
}

/// Sleeps for `duration` unless cancelled first.
pub(crate) async fn pause(cancel: &CancellationToken, duration: std::time::Duration) -> Result<()> {
    cancellable(cancel, async {
        tokio::time::sleep(duration).await;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cptool_util::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{list_page, session_with, session_with_conf, FakeTransport, ListExtractor};

    const FIRST: &str = "https://judge.test/list/1";

    fn route_pages(transport: &FakeTransport, count: usize) {
        for page in 1..=count {
            let next = if page < count {
                Some(format!("/list/{}", page + 1))
            } else {
                None
            };
            let row = format!("row {}", page);
            transport.route(
                &format!("https://judge.test/list/{}", page),
                &[&list_page(&[&row], next.as_deref())],
            );
        }
    }

    fn rows<T: Clone>(pages: &[Page<T>]) -> Vec<T> {
        pages.iter().flat_map(|page| page.rows().clone()).collect()
    }

    #[tokio::test]
    async fn test_stops_at_last_page() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 3);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Limit(3 + 5))
            .await?;
        let (pages, failures) = stream.collect().await;
        assert_eq!(rows(&pages), vec!["row 1", "row 2", "row 3"]);
        assert_eq!(
            pages.iter().map(|page| page.index()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            pages.iter().map(|page| page.has_next()).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert!(failures.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_budget_limits_pages() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 5);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        for budget in 1..=4 {
            let stream = streamer
                .stream(ListExtractor { first: FIRST }, PageBudget::Limit(budget))
                .await?;
            let (pages, _) = stream.collect().await;
            assert_eq!(pages.len(), budget);
        }
        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        assert_eq!(stream.collect().await.0.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_budget_loads_nothing() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 2);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Limit(0))
            .await?;
        assert!(stream.collect().await.0.is_empty());
        assert!(transport.gets().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_on_first_page_fails_fast() {
        let transport = FakeTransport::new();
        transport.route(
            FIRST,
            &[r#"<script>Judge.showMessage("No such contest");</script>"#],
        );
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let err = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await
            .err()
            .unwrap();
        assert_eq!(
            JudgeError::find(&err),
            Some(&JudgeError::SiteNotification("No such contest".into()))
        );
    }

    #[tokio::test]
    async fn test_broken_page_is_reported_and_skipped() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 3);
        transport.route(
            "https://judge.test/list/2",
            &[r#"<ul class="rows"><li class="broken"></li></ul><a class="next" href="/list/3">next</a>"#],
        );
        let streamer = PaginatedStreamer::new(session_with(&transport));

        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        let (pages, failures) = stream.collect().await;
        assert_eq!(rows(&pages), vec!["row 1", "row 3"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);

        let session = session_with_conf(
            &transport,
            cptool_config::SessionConfig::default().with_page_errors(PageErrorPolicy::Skip),
        );
        let stream = PaginatedStreamer::new(session)
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        let (pages, failures) = stream.collect().await;
        assert_eq!(rows(&pages), vec!["row 1", "row 3"]);
        assert!(failures.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_page_closes_stream() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 3);
        transport.route_results("https://judge.test/list/2", vec![Err("connection reset")]);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        let (pages, failures) = stream.collect().await;
        assert_eq!(rows(&pages), vec!["row 1"]);
        assert_eq!(failures.len(), 1);
        assert_matches!(JudgeError::find(&failures[0].error) => Some(JudgeError::Transport(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_on_later_page_closes_stream() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 3);
        transport.route(
            "https://judge.test/list/2",
            &[r#"<script>Judge.showMessage("Contest is not visible");</script>"#],
        );
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        let (pages, failures) = stream.collect().await;
        assert_eq!(rows(&pages), vec!["row 1"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(
            JudgeError::find(&failures[0].error),
            Some(&JudgeError::SiteNotification("Contest is not visible".into()))
        );
        assert!(!transport
            .gets()
            .contains(&"https://judge.test/list/3".to_owned()));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_shutdown_stops_producer() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 10);
        let session = session_with(&transport);
        let mut stream = PaginatedStreamer::new(session.clone())
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        assert_matches!(stream.recv().await => Some(PageEvent::Page(_)));

        session.shutdown();
        stream.join().await?;
        let fetched = transport.gets().len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.gets().len(), fetched);
        assert!(fetched < 10);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_stalls_producer() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 10);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let mut stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;

        // capacity 2: two pages buffered and the third blocked in send
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.gets().len(), ListExtractor::CAPACITY + 1);

        assert_matches!(stream.recv().await => Some(PageEvent::Page(_)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.gets().len(), ListExtractor::CAPACITY + 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_producer() -> anyhow::Result<()> {
        let transport = FakeTransport::new();
        route_pages(&transport, 10);
        let streamer = PaginatedStreamer::new(session_with(&transport));
        let mut stream = streamer
            .stream(ListExtractor { first: FIRST }, PageBudget::Unbounded)
            .await?;
        assert_matches!(stream.recv().await => Some(PageEvent::Page(_)));

        stream.cancel();
        stream.join().await?;
        let fetched = transport.gets().len();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.gets().len(), fetched);
        assert!(fetched < 10);
        Ok(())
    }
}
