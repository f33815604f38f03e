use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use retry::delay;
use tokio::time::sleep;

use crate::service::{CookieStorage, Document, Form, ResponseExt as _, Transport};
use crate::{Error, JudgeError, Result};

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries of transport failures and server errors before giving up.
    pub limit: usize,
    pub interval: Duration,
    /// Wait after `429 Too Many Requests`; these are retried without limit.
    pub throttle_backoff: Duration,
}

/// HTTP transport sharing one cookie jar between every request.
///
/// Redirects are followed by hand so that cookies set on intermediate hops
/// reach the jar.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    cookies: Arc<Mutex<CookieStorage>>,
    policy: RetryPolicy,
}

impl HttpSession {
    pub fn new(client: Client, cookies: CookieStorage, policy: RetryPolicy) -> Self {
        Self {
            client,
            cookies: Arc::new(Mutex::new(cookies)),
            policy,
        }
    }

    pub fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Could not setup http client")
    }

    fn lock_cookies(&self) -> Result<MutexGuard<'_, CookieStorage>> {
        self.cookies
            .lock()
            .map_err(|_| Error::msg("Cookie storage lock is poisoned"))
    }

    async fn fetch(&self, request: RequestBuilder) -> Result<Document> {
        let mut res = request.with_retry(self).retry_send().await?;
        for _ in 0..MAX_REDIRECTS {
            if !res.status().is_redirection() {
                break;
            }
            let next = res.location_url(res.url())?;
            res = self.client.get(next).with_retry(self).retry_send().await?;
        }
        if res.status().is_redirection() {
            return Err(JudgeError::Transport(format!("Too many redirects : {}", res.url())).into());
        }
        let url = res.url().clone();
        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Could not read response body : {}", url))?;
        Ok(Document::new(url, status, body))
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn get(&self, url: &Url) -> Result<Document> {
        self.fetch(self.client.get(url.clone())).await
    }

    async fn post_form(&self, url: &Url, form: &Form) -> Result<Document> {
        self.fetch(self.client.post(url.clone()).form(form)).await
    }

    fn clear_cookies(&self) -> Result<()> {
        self.lock_cookies()?.clear()
    }
}

pub struct RetryRequestBuilder<'a> {
    inner: RequestBuilder,
    session: &'a HttpSession,
}

impl RetryRequestBuilder<'_> {
    async fn send_pretty(&self) -> Result<Response> {
        let mut req = self
            .inner
            .try_clone()
            .ok_or_else(|| Error::msg("Could not build request"))?
            .build()?;
        let cookie = self.session.lock_cookies()?.header_for(req.url())?;
        if let Some(value) = cookie {
            req.headers_mut().insert(COOKIE, value);
        }
        let method = req.method().clone();
        let url = req.url().clone();
        let result = self
            .session
            .client
            .execute(req)
            .await
            .context("Could not send request");
        match &result {
            Ok(res) => log::debug!("{:7} {} ... {}", method.as_str(), url, res.status()),
            Err(_) => log::debug!("{:7} {} ... failed", method.as_str(), url),
        }
        let res = result?;
        self.session
            .lock_cookies()?
            .store_from(res.headers(), res.url())
            .context("Could not store cookies from response")?;
        Ok(res)
    }

    pub async fn retry_send(&self) -> Result<Response> {
        let policy = self.session.policy;
        let mut delays =
            delay::Fixed::from_millis(policy.interval.as_millis() as u64).take(policy.limit);
        loop {
            let err = match self.send_pretty().await {
                Ok(res) if res.status() == StatusCode::TOO_MANY_REQUESTS => {
                    log::warn!(
                        "Too many requests to {}, retrying in {:?}",
                        res.url(),
                        policy.throttle_backoff
                    );
                    sleep(policy.throttle_backoff).await;
                    continue;
                }
                Ok(res) if res.status().is_server_error() => {
                    Error::msg(format!("Received server error : {}", res.status()))
                }
                Ok(res) => return Ok(res),
                Err(err) => err,
            };
            match delays.next() {
                Some(delay) => {
                    log::debug!("{:#}, retrying in {:?}", err, delay);
                    sleep(delay).await
                }
                None => return Err(JudgeError::Transport(format!("{:#}", err)).into()),
            }
        }
    }
}

pub trait WithRetry {
    fn with_retry(self, session: &HttpSession) -> RetryRequestBuilder<'_>;
}

impl WithRetry for RequestBuilder {
    fn with_retry(self, session: &HttpSession) -> RetryRequestBuilder<'_> {
        RetryRequestBuilder {
            inner: self,
            session,
        }
    }
}
