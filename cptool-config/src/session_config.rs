use std::time::Duration;

use anyhow::Context as _;
use getset::{CopyGetters, Getters};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::abs_path::AbsPathBuf;
use crate::service::{CookieStorage, RetryPolicy};
use crate::{Result, DATA_LOCAL_DIR};

static COOKIES_FILE_NAME: &str = "cookies.json";

lazy_static! {
    static ref COOKIES_PATH: AbsPathBuf = DATA_LOCAL_DIR.join(COOKIES_FILE_NAME);
}

/// What a listing stream does with a page it could not load or extract.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PageErrorPolicy {
    /// Emit the failure on the stream and keep going.
    Report,
    /// Log the failure and drop the page.
    Skip,
}

impl Default for PageErrorPolicy {
    fn default() -> Self {
        Self::Report
    }
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    timeout: Duration,
    #[get = "pub"]
    cookies_path: AbsPathBuf,
    #[get_copy = "pub"]
    retry_limit: usize,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    retry_interval: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    throttle_backoff: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    reload_interval: Duration,
    #[get_copy = "pub"]
    page_errors: PageErrorPolicy,
}

impl SessionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            limit: self.retry_limit,
            interval: self.retry_interval,
            throttle_backoff: self.throttle_backoff,
        }
    }

    pub fn open_cookie_storage(&self) -> Result<CookieStorage> {
        CookieStorage::open(&self.cookies_path)
            .with_context(|| format!("Could not open cookie storage : {}", self.cookies_path))
    }

    /// Same settings with a different live tracking cadence.
    pub fn with_intervals(mut self, poll: Duration, reload: Duration) -> Self {
        self.poll_interval = poll;
        self.reload_interval = reload;
        self
    }

    pub fn with_page_errors(mut self, page_errors: PageErrorPolicy) -> Self {
        self.page_errors = page_errors;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cookies_path: COOKIES_PATH.clone(),
            retry_limit: 4,
            retry_interval: Duration::from_secs(2),
            throttle_backoff: Duration::from_secs(4),
            poll_interval: Duration::from_millis(500),
            reload_interval: Duration::from_secs(10),
            page_errors: PageErrorPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() -> anyhow::Result<()> {
        let conf: SessionConfig = serde_yaml::from_str(
            "poll_interval: 250ms\nreload_interval: 1m\npage_errors: skip\n",
        )?;
        assert_eq!(conf.poll_interval(), Duration::from_millis(250));
        assert_eq!(conf.reload_interval(), Duration::from_secs(60));
        assert_eq!(conf.page_errors(), PageErrorPolicy::Skip);
        assert_eq!(conf.retry_limit(), 4);
        assert_eq!(conf.throttle_backoff(), Duration::from_secs(4));
        assert_eq!(conf.cookies_path(), &*COOKIES_PATH);
        Ok(())
    }

    #[test]
    fn test_retry_policy() {
        let policy = SessionConfig::default().retry_policy();
        assert_eq!(policy.limit, 4);
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.throttle_backoff, Duration::from_secs(4));
    }
}
