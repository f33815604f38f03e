use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, OwnedRwLockReadGuard, RwLock};
use tokio_util::sync::CancellationToken;

use cptool_config::SessionConfig;

use crate::gate::{Marker, Readiness, ReadinessGate};
use crate::service::{Document, Transport, Url};
use crate::site::Site;
use crate::{cancellable, Error, JudgeError, Result};

/// Authenticated context shared by every operation against one site.
///
/// Cloning is cheap and every clone sees the same cookie jar and identity.
/// Listing operations hold a shared lease for their whole lifetime while
/// `login` and `logout` take it exclusively, so identity never changes under
/// a running extraction.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    site: Arc<dyn Site>,
    conf: SessionConfig,
    gate: ReadinessGate,
    lease: Arc<RwLock<()>>,
    submit: AsyncMutex<()>,
    handle: Mutex<Option<String>>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, site: Arc<dyn Site>, conf: SessionConfig) -> Self {
        let gate = ReadinessGate::new(
            site.notification().clone(),
            conf.retry_limit() + 1,
            conf.retry_interval(),
        );
        Self {
            inner: Arc::new(Inner {
                transport,
                site,
                conf,
                gate,
                lease: Arc::new(RwLock::new(())),
                submit: AsyncMutex::new(()),
                handle: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn conf(&self) -> &SessionConfig {
        &self.inner.conf
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.inner.gate
    }

    /// Token for one background operation; cancelled with the session.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }

    /// Stops every stream opened through this session.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Handle of the last identity observed on a page, if any.
    pub fn handle(&self) -> Option<String> {
        self.inner.handle.lock().ok().and_then(|handle| handle.clone())
    }

    fn set_handle(&self, handle: Option<String>) {
        if let Ok(mut cached) = self.inner.handle.lock() {
            *cached = handle;
        }
    }

    pub(crate) async fn read_lease(&self) -> OwnedRwLockReadGuard<()> {
        self.inner.lease.clone().read_owned().await
    }

    pub(crate) async fn submit_lock(&self) -> MutexGuard<'_, ()> {
        self.inner.submit.lock().await
    }

    /// Loads `url` and waits until one of `markers` is present.
    ///
    /// The notification marker is checked after every navigation, including
    /// redirects that land on an unexpected page.
    pub async fn navigate(
        &self,
        url: &Url,
        markers: &[Marker],
        cancel: &CancellationToken,
    ) -> Result<(Document, usize)> {
        let doc = cancellable(cancel, self.transport().get(url)).await?;
        self.gate()
            .ensure(self.transport(), doc, markers, cancel)
            .await
    }

    /// Re-reads a loaded page and gates it again.
    pub async fn refresh(
        &self,
        doc: &Document,
        markers: &[Marker],
        cancel: &CancellationToken,
    ) -> Result<(Document, usize)> {
        let doc = cancellable(cancel, self.transport().poll(doc)).await?;
        self.gate()
            .ensure(self.transport(), doc, markers, cancel)
            .await
    }

    /// Returns the handle of the authenticated identity, or `None` if anonymous.
    pub async fn current_user(&self) -> Result<Option<String>> {
        let cancel = self.child_token();
        let site = &self.inner.site;
        let markers = [site.identity().clone(), site.anonymous().clone()];
        let (doc, index) = self.navigate(&site.home_url(), &markers, &cancel).await?;
        let handle = if index == 0 {
            site.identity().find(&doc)
        } else {
            None
        };
        self.set_handle(handle.clone());
        Ok(handle)
    }

    /// Logs in unless the session is already authenticated.
    ///
    /// An existing identity is returned as is and the credential form is left
    /// untouched, so calling this speculatively is safe.
    pub async fn login(&self, user: &str, pass: &str) -> Result<String> {
        let _lease = self.inner.lease.write().await;
        if let Some(handle) = self.current_user().await? {
            log::debug!("Already logged in as {}", handle);
            return Ok(handle);
        }
        if user.is_empty() || pass.is_empty() {
            return Err(JudgeError::InvalidCredentials.into());
        }

        let cancel = self.child_token();
        let site = &self.inner.site;
        let login_url = site.login_url();
        let (login_page, _) = self
            .navigate(&login_url, &[site.login_form_marker().clone()], &cancel)
            .await?;
        let form = site
            .login_form(&login_page, user, pass)
            .context("Could not build login form")?;
        let doc = cancellable(&cancel, self.transport().post_form(&login_url, &form)).await?;
        let markers = [site.identity().clone(), site.login_rejected().clone()];
        let handle = match self.gate().wait(self.transport(), doc, &markers, &cancel).await? {
            (_, Readiness::Notified(message)) => {
                return Err(JudgeError::SiteNotification(message).into())
            }
            (_, Readiness::Ready(1)) => return Err(JudgeError::InvalidCredentials.into()),
            (doc, _) => site
                .identity()
                .find(&doc)
                .ok_or_else(|| Error::msg("Could not find handle after login"))?,
        };
        log::info!("Logged in as {}", handle);
        self.set_handle(Some(handle.clone()));
        Ok(handle)
    }

    /// Logs out, waits until the identity marker is gone and empties the
    /// cookie jar. No-op when anonymous.
    pub async fn logout(&self) -> Result<()> {
        let _lease = self.inner.lease.write().await;
        let cancel = self.child_token();
        let site = &self.inner.site;
        let markers = [site.identity().clone(), site.anonymous().clone()];
        let (doc, index) = self.navigate(&site.home_url(), &markers, &cancel).await?;
        if index == 1 {
            self.set_handle(None);
            return Ok(());
        }
        let logout_url = site.logout_url(&doc)?;
        let doc = cancellable(&cancel, self.transport().get(&logout_url)).await?;
        self.gate()
            .ensure(self.transport(), doc, &[site.anonymous().clone()], &cancel)
            .await?;
        self.transport().clear_cookies()?;
        self.set_handle(None);
        log::info!("Logged out");
        Ok(())
    }
}
