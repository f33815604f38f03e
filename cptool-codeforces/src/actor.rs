use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cptool_engine::{
    Act, ListingStream, Marker, PageBudget, PaginatedStreamer, Readiness, Session, Site, Source,
    SubmissionTracker, TrackMode,
};
use lazy_static::lazy_static;

use crate::config::SessionConfig;
use crate::model::{Contest, LangNameRef, Problem, Registration, Specifier, Submission};
use crate::page::{
    countdown_url, extract_countdown, extract_registration, extract_source, is_registered,
    login_form, logout_url, register_form, registration_url, source_url, ContestsExtractor,
    LiveSubmissions, ProblemsExtractor, SubmissionsExtractor, SubmitForm, ANONYMOUS, BASE_URL,
    COUNTDOWN, IDENTITY, LOGIN_FORM, LOGIN_REJECTED, NOTIFICATION, REGISTRATION, SOURCE,
};
use crate::service::{Document, Form, HttpSession, Transport, Url};
use crate::{JudgeError, Result};

lazy_static! {
    static ref LOGIN_URL: Url = BASE_URL.join("/enter").unwrap();
}

/// Markers and forms of codeforces.com.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeforcesSite;

impl Site for CodeforcesSite {
    fn home_url(&self) -> Url {
        BASE_URL.clone()
    }

    fn login_url(&self) -> Url {
        LOGIN_URL.clone()
    }

    fn notification(&self) -> &Marker {
        &NOTIFICATION
    }

    fn identity(&self) -> &Marker {
        &IDENTITY
    }

    fn anonymous(&self) -> &Marker {
        &ANONYMOUS
    }

    fn login_form_marker(&self) -> &Marker {
        &LOGIN_FORM
    }

    fn login_rejected(&self) -> &Marker {
        &LOGIN_REJECTED
    }

    fn login_form(&self, login_page: &Document, user: &str, pass: &str) -> Result<Form> {
        login_form(login_page, user, pass)
    }

    fn logout_url(&self, page: &Document) -> Result<Url> {
        logout_url(page)
    }
}

pub struct CodeforcesActor {
    session: Session,
}

impl CodeforcesActor {
    /// Opens an http session whose cookies persist at the configured path.
    pub fn new(conf: &SessionConfig) -> Result<Self> {
        let transport = HttpSession::new(
            HttpSession::build_client(conf.timeout())?,
            conf.open_cookie_storage()?,
            conf.retry_policy(),
        );
        Ok(Self::with_transport(Arc::new(transport), conf.clone()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, conf: SessionConfig) -> Self {
        Self {
            session: Session::new(transport, Arc::new(CodeforcesSite), conf),
        }
    }

    async fn load(&self, url: &Url, markers: &[Marker]) -> Result<(Document, usize)> {
        let cancel = self.session.child_token();
        self.session.navigate(url, markers, &cancel).await
    }

    async fn require_user(&self) -> Result<String> {
        self.current_user()
            .await?
            .ok_or_else(|| JudgeError::NotLoggedIn.into())
    }
}

#[async_trait]
impl Act for CodeforcesActor {
    fn session(&self) -> &Session {
        &self.session
    }

    async fn contests(
        &self,
        spec: &Specifier,
        budget: PageBudget,
        omit_finished: bool,
    ) -> Result<ListingStream<Contest>> {
        let extractor = ContestsExtractor::new(spec.clone(), omit_finished);
        PaginatedStreamer::new(self.session.clone())
            .stream(extractor, budget)
            .await
    }

    async fn submissions(
        &self,
        spec: &Specifier,
        handle: Option<&str>,
        mode: TrackMode,
    ) -> Result<ListingStream<Submission>> {
        let handle = match (handle, spec.contest()) {
            (Some(handle), _) => Some(handle.to_owned()),
            (None, Some(_)) => None,
            (None, None) => Some(self.require_user().await?),
        };
        let extractor = SubmissionsExtractor::new(spec, handle.as_deref())?;
        let tracker = SubmissionTracker::new(self.session.clone());
        match mode {
            TrackMode::Live => tracker.track(LiveSubmissions(extractor), mode).await,
            TrackMode::Archive(_) => tracker.track(extractor, mode).await,
        }
    }

    async fn submit(
        &self,
        spec: &Specifier,
        lang_name: LangNameRef<'_>,
        source: &Source,
        mode: TrackMode,
    ) -> Result<ListingStream<Submission>> {
        let target = SubmitForm::new(spec.clone());
        SubmissionTracker::new(self.session.clone())
            .submit(&target, lang_name, source, mode)
            .await
    }

    async fn problems(&self, spec: &Specifier) -> Result<Vec<Problem>> {
        let stream = PaginatedStreamer::new(self.session.clone())
            .stream(ProblemsExtractor::new(spec.clone()), PageBudget::Limit(1))
            .await?;
        let (pages, failures) = stream.collect().await;
        if let Some(failure) = failures.into_iter().next() {
            return Err(failure.error);
        }
        Ok(pages.into_iter().flat_map(|page| page.into_rows()).collect())
    }

    async fn source_code(&self, spec: &Specifier, id: u64) -> Result<String> {
        let (doc, _) = self.load(&source_url(spec, id)?, &*SOURCE).await?;
        extract_source(&doc)
    }

    async fn countdown(&self, spec: &Specifier) -> Result<Duration> {
        let (doc, index) = self.load(&countdown_url(spec)?, &*COUNTDOWN).await?;
        if index == 1 {
            return Ok(Duration::from_secs(0));
        }
        Ok(extract_countdown(&doc))
    }

    async fn registration(&self, spec: &Specifier) -> Result<Registration> {
        let (doc, _) = self.load(&registration_url(spec)?, &*REGISTRATION).await?;
        extract_registration(&doc, spec)
    }

    async fn register(&self, spec: &Specifier) -> Result<()> {
        let url = registration_url(spec)?;
        let handle = self.require_user().await?;
        let (page, _) = self.load(&url, &*REGISTRATION).await?;
        let form = register_form(&page)?;
        let doc = self.session.transport().post_form(&url, &form).await?;
        match self.session.gate().check(&doc, &[]) {
            Some(Readiness::Notified(message)) if !is_registered(&message) => {
                Err(JudgeError::SiteNotification(message).into())
            }
            _ => {
                log::info!("Registered {} for {}", handle, spec);
                Ok(())
            }
        }
    }
}
