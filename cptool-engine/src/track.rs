use std::collections::HashMap;

use anyhow::Context as _;
use tokio::sync::mpsc;
use tokio::time::Instant;

use cptool_util::abs_path::AbsPathBuf;

use crate::gate::{Marker, Readiness};
use crate::model::{Page, Specifier, Submission};
use crate::service::{Document, Form, Url};
use crate::session::Session;
use crate::stream::{pause, Emitter, Extract, Extracted, ListingStream, PageBudget, PageEvent};
use crate::{cancellable, JudgeError, PaginatedStreamer, Result};

/// Solution to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text(String),
    File(AbsPathBuf),
}

impl Source {
    pub fn load(&self) -> Result<String> {
        let text = match self {
            Self::Text(text) => text.clone(),
            Self::File(path) => {
                if !path.is_file() {
                    return Err(JudgeError::SourceNotFound(path.to_string()).into());
                }
                path.read_to_string()
                    .with_context(|| format!("Could not read source file : {}", path))?
            }
        };
        if text.trim().is_empty() {
            return Err(JudgeError::EmptySource.into());
        }
        Ok(text)
    }
}

/// How a submission table is followed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrackMode {
    /// Re-read the first page until no verdict is pending.
    Live,
    /// Read pages of history once, like any other listing.
    Archive(PageBudget),
}

/// Where and how a solution is submitted.
pub trait SubmitTarget: Send + Sync {
    type Status: Extract<Row = Submission>;

    fn specifier(&self) -> &Specifier;

    fn is_known_language(&self, lang: &str) -> bool;

    fn submit_url(&self) -> Result<Url>;

    /// `[0]` marks an open submit form, `[1]` marks closed submissions.
    fn submit_markers(&self) -> &[Marker];

    /// Form value selecting `lang` on the submit page, if offered there.
    fn language_option(&self, page: &Document, lang: &str) -> Option<String>;

    fn submit_form(&self, page: &Document, lang_id: &str, source: &str) -> Result<Form>;

    /// Validation message shown next to the form after a rejected post.
    fn form_error(&self) -> &Marker;

    /// Whether a site message shown after the post confirms the submission.
    fn is_confirmation(&self, _message: &str) -> bool {
        false
    }

    /// Listing of the submissions the post creates.
    fn status(&self) -> Result<Self::Status>;
}

/// Submits solutions and follows their verdicts.
#[derive(Clone)]
pub struct SubmissionTracker {
    session: Session,
}

impl SubmissionTracker {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Submits `source` and returns the verdict stream.
    ///
    /// Every precondition is checked before the form is posted. A message the
    /// site shows in response to the post is returned as an error and no
    /// stream is opened.
    pub async fn submit<T: SubmitTarget>(
        &self,
        target: &T,
        lang: &str,
        source: &Source,
        mode: TrackMode,
    ) -> Result<ListingStream<Submission>> {
        let spec = target.specifier();
        if spec.problem().is_none() {
            return Err(JudgeError::InvalidSpecifier(format!("problem is required : {}", spec)).into());
        }
        if !target.is_known_language(lang) {
            return Err(JudgeError::UnknownLanguage(lang.to_owned()).into());
        }
        let source = source.load()?;
        if self.session.current_user().await?.is_none() {
            return Err(JudgeError::NotLoggedIn.into());
        }

        {
            let _submit = self.session.submit_lock().await;
            let cancel = self.session.child_token();
            let submit_url = target.submit_url()?;
            let (page, index) = self
                .session
                .navigate(&submit_url, target.submit_markers(), &cancel)
                .await?;
            if index == 1 {
                return Err(JudgeError::SubmissionClosed.into());
            }
            let lang_id = target
                .language_option(&page, lang)
                .ok_or_else(|| JudgeError::LanguageUnavailable(lang.to_owned()))?;
            let form = target.submit_form(&page, &lang_id, &source)?;
            let transport = self.session.transport();
            let doc = cancellable(&cancel, transport.post_form(&submit_url, &form)).await?;
            match self.session.gate().check(&doc, &[]) {
                Some(Readiness::Notified(message)) if !target.is_confirmation(&message) => {
                    return Err(JudgeError::SiteNotification(message).into())
                }
                _ => {}
            }
            if let Some(message) = target.form_error().find(&doc) {
                return Err(JudgeError::SiteNotification(message).into());
            }
            log::info!("Submitted {} in {}", spec, lang);
        }

        self.track(target.status()?, mode).await
    }

    /// Follows a submission table without submitting anything.
    pub async fn track<E>(&self, status: E, mode: TrackMode) -> Result<ListingStream<Submission>>
    where
        E: Extract<Row = Submission>,
    {
        match mode {
            TrackMode::Archive(budget) => {
                PaginatedStreamer::new(self.session.clone())
                    .stream(status, budget)
                    .await
            }
            TrackMode::Live => self.live(status).await,
        }
    }

    async fn live<E>(&self, status: E) -> Result<ListingStream<Submission>>
    where
        E: Extract<Row = Submission>,
    {
        let url = status.first_url()?;
        let lease = self.session.read_lease().await;
        let cancel = self.session.child_token();
        let (first, _) = self
            .session
            .navigate(&url, status.ready_markers(), &cancel)
            .await?;

        let (tx, rx) = mpsc::channel(E::CAPACITY);
        let emitter = Emitter::new(tx, cancel.clone(), self.session.conf().page_errors());
        let session = self.session.clone();
        let task = tokio::spawn(async move {
            let _lease = lease;
            run_live(session, status, url, first, emitter).await;
        });
        Ok(ListingStream::new(rx, cancel, Some(task)))
    }
}

/// Terminal verdicts seen so far, by submission id.
#[derive(Debug, Default)]
struct Verdicts {
    settled: HashMap<u64, Submission>,
}

impl Verdicts {
    /// Replaces rows that were already seen terminal with that observation.
    fn reconcile(&mut self, rows: Vec<Submission>) -> Vec<Submission> {
        rows.into_iter()
            .map(|row| match self.settled.get(&row.id()) {
                Some(settled) => settled.clone(),
                None => {
                    if !row.is_judging() {
                        self.settled.insert(row.id(), row.clone());
                    }
                    row
                }
            })
            .collect()
    }
}

async fn run_live<E>(
    session: Session,
    status: E,
    url: Url,
    mut doc: Document,
    emitter: Emitter<Submission>,
) where
    E: Extract<Row = Submission>,
{
    let conf = session.conf().clone();
    let mut verdicts = Verdicts::default();
    let mut failures = 0;
    let mut index = 0;
    let mut last_reload = Instant::now();

    loop {
        let Extracted { rows, .. } = status.extract(&doc, index);
        match rows {
            Ok(rows) => {
                failures = 0;
                let rows = verdicts.reconcile(rows);
                let judging = rows.iter().any(Submission::is_judging);
                if !emitter.send(PageEvent::Page(Page::new(index, rows, judging))).await {
                    return;
                }
                index += 1;
                if !judging {
                    log::info!("Every submission on {} is judged", url);
                    return;
                }
            }
            Err(err) => {
                failures += 1;
                if !emitter.fail(index, doc.url(), err).await || failures >= conf.retry_limit() {
                    return;
                }
            }
        }

        loop {
            if pause(emitter.cancel(), conf.poll_interval()).await.is_err() {
                return;
            }
            let refreshed = if last_reload.elapsed() >= conf.reload_interval() {
                log::debug!("Reloading {} while judging", url);
                last_reload = Instant::now();
                session
                    .navigate(&url, status.ready_markers(), emitter.cancel())
                    .await
            } else {
                session
                    .refresh(&doc, status.ready_markers(), emitter.cancel())
                    .await
            };
            match refreshed {
                Ok((next, _)) => {
                    doc = next;
                    break;
                }
                Err(err) => {
                    failures += 1;
                    if !emitter.fail(index, &url, err).await || failures >= conf.retry_limit() {
                        return;
                    }
                }
            }
        }
    }
}
