use std::fs::File;
use std::io::{BufReader, Seek as _, SeekFrom};

use anyhow::Context as _;
use cookie::Cookie as RawCookie;
use cookie_store::CookieStore;
use fs2::FileExt;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::Url;

use crate::abs_path::AbsPathBuf;
use crate::{Error, Result};

/// Cookie jar persisted as json lines in an exclusively locked file.
///
/// The lock is held until the storage is dropped, so only one process at a
/// time can write the session cookies.
#[derive(Debug)]
pub struct CookieStorage {
    file: Option<File>,
    store: CookieStore,
}

impl CookieStorage {
    pub fn open(path: &AbsPathBuf) -> Result<Self> {
        let file = path
            .create_dir_all_and_open(true, true)
            .context("Could not open cookies file")?;
        FileExt::try_lock_exclusive(&file).context("Could not lock cookies file")?;
        let reader = BufReader::new(&file);
        let store = CookieStore::load_json(reader).map_err(Error::msg)?;
        Ok(Self {
            file: Some(file),
            store,
        })
    }

    /// A jar that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            store: CookieStore::default(),
        }
    }

    /// Value for the `Cookie` header of a request to `url`, if any cookie matches.
    pub fn header_for(&self, url: &Url) -> Result<Option<HeaderValue>> {
        let pairs = self
            .store
            .get_request_values(url)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>();
        if pairs.is_empty() {
            return Ok(None);
        }
        Ok(Some(HeaderValue::from_str(&pairs.join("; "))?))
    }

    pub fn store_from(&mut self, headers: &HeaderMap, url: &Url) -> Result<()> {
        let cookies = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|val| val.to_str().ok())
            .filter_map(|cookie_str| RawCookie::parse(cookie_str.to_owned()).ok())
            .collect::<Vec<_>>();
        if cookies.is_empty() {
            return Ok(());
        }
        self.store.store_response_cookies(cookies.into_iter(), url);
        self.save().context("Could not save cookies to json file")
    }

    pub fn contains(&self, domain: &str, path: &str, name: &str) -> bool {
        self.store.contains(domain, path, name)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear();
        self.save()
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.seek(SeekFrom::Start(0))?;
            file.set_len(0)?;
            self.store
                .save_incl_expired_and_nonpersistent_json(file)
                .map_err(Error::msg)?;
        }
        Ok(())
    }
}

impl Drop for CookieStorage {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_ref() {
            if let Err(err) = FileExt::unlock(file) {
                log::warn!("Could not unlock cookies file : {}", err);
            }
        }
    }
}
