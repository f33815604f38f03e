//! Config for cptool.
//!
//! The config file `cptool.yaml` is searched from the current directory
//! upwards. Every key is optional; a missing file means all defaults.
//!
//! ```yaml
//! version: 0.1.0
//! session:
//!   timeout: 30s
//!   retry_limit: 4
//!   retry_interval: 2s
//!   throttle_backoff: 4s
//!   poll_interval: 500ms
//!   reload_interval: 10s
//!   page_errors: report
//! services:
//!   codeforces:
//!     lang_name: GNU G++17 7.3.0
//! ```

use std::fmt;

use anyhow::{anyhow, Context as _};
use lazy_static::lazy_static;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use cptool_util::{abs_path, model, service, DATA_LOCAL_DIR};

mod session_config;

use crate::abs_path::AbsPathBuf;
use crate::model::{LangName, ServiceKind};
pub use session_config::{PageErrorPolicy, SessionConfig};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

lazy_static! {
    static ref VERSION: Version =
        Version::parse(env!("CARGO_PKG_VERSION")).expect("package version must be semver");
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Config {
    pub service_id: ServiceKind,
    /// Directory holding the config file, if one was found.
    pub base_dir: Option<AbsPathBuf>,
    body: ConfigBody,
}

impl Config {
    pub fn load(service_id: ServiceKind, base_dir: Option<AbsPathBuf>) -> Result<Self> {
        let base_dir = match base_dir {
            Some(base_dir) => Some(base_dir),
            None => ConfigBody::search()?,
        };
        let body = match &base_dir {
            Some(base_dir) => ConfigBody::load(base_dir)?,
            None => {
                log::debug!("No {} found, using defaults", ConfigBody::FILE_NAME);
                ConfigBody::default()
            }
        };
        Ok(Self {
            service_id,
            base_dir,
            body,
        })
    }

    pub fn default_for(service_id: ServiceKind) -> Self {
        Self {
            service_id,
            base_dir: None,
            body: ConfigBody::default(),
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.body.session
    }

    pub fn service(&self) -> &ServiceConfig {
        self.body.services.get(self.service_id)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let yaml_str = serde_yaml::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", yaml_str)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigBody {
    #[serde(with = "string_serde", default = "ConfigBody::default_version")]
    version: Version,
    #[serde(default)]
    session: SessionConfig,
    #[serde(default)]
    services: ServicesConfig,
}

impl ConfigBody {
    pub const FILE_NAME: &'static str = "cptool.yaml";

    fn default_version() -> Version {
        VERSION.clone()
    }

    fn search() -> Result<Option<AbsPathBuf>> {
        let cwd = AbsPathBuf::cwd()?;
        let base_dir = cwd.search_dir_contains(Self::FILE_NAME);
        if let Some(base_dir) = &base_dir {
            log::debug!("Found config file in base_dir: {}", base_dir);
        }
        Ok(base_dir)
    }

    fn load(base_dir: &AbsPathBuf) -> Result<Self> {
        let body: Self = base_dir.join(Self::FILE_NAME).load(|file| {
            serde_yaml::from_reader(file).context("Could not read config file as yaml")
        })?;
        body.validate()?;
        Ok(body)
    }

    fn validate(&self) -> Result<()> {
        let version_req = VersionReq::parse(&self.version.to_string())
            .context("Could not parse version requirement")?;
        if !version_req.matches(&VERSION) {
            return Err(anyhow!(
                r#"Found mismatched version in config file.
    config version: {}
    cptool version: {}
Fix the config file so that it is compatible with the current version of cptool."#,
                self.version,
                &*VERSION
            ));
        }
        Ok(())
    }
}

impl Default for ConfigBody {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            session: SessionConfig::default(),
            services: ServicesConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct ServicesConfig {
    codeforces: ServiceConfig,
}

impl ServicesConfig {
    fn get(&self, service_id: ServiceKind) -> &ServiceConfig {
        match service_id {
            ServiceKind::Codeforces => &self.codeforces,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            codeforces: ServiceConfig::default_for(ServiceKind::Codeforces),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceConfig {
    /// Language used by `submit` when none is given on the command line.
    lang_name: Option<LangName>,
}

impl ServiceConfig {
    fn default_for(service_id: ServiceKind) -> Self {
        match service_id {
            ServiceKind::Codeforces => Self {
                lang_name: Some("GNU G++17 7.3.0".into()),
            },
        }
    }

    pub fn lang_name(&self) -> Option<&str> {
        self.lang_name.as_deref()
    }
}

mod string_serde {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn load_from_base_dir() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(ConfigBody::FILE_NAME),
            format!(
                "version: {}\nsession:\n  poll_interval: 200ms\nservices:\n  codeforces:\n    lang_name: Rust 1.49.0\n",
                &*VERSION
            ),
        )?;
        let base_dir = AbsPathBuf::try_new(dir.path())?;
        let conf = Config::load(ServiceKind::Codeforces, Some(base_dir.clone()))?;
        assert_eq!(conf.base_dir, Some(base_dir));
        assert_eq!(conf.session().poll_interval(), Duration::from_millis(200));
        assert_eq!(conf.session().reload_interval(), Duration::from_secs(10));
        assert_eq!(conf.service().lang_name(), Some("Rust 1.49.0"));
        Ok(())
    }

    #[test]
    fn mismatched_version_is_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(ConfigBody::FILE_NAME), "version: 99.0.0\n")?;
        let base_dir = AbsPathBuf::try_new(dir.path())?;
        let err = Config::load(ServiceKind::Codeforces, Some(base_dir)).unwrap_err();
        assert!(err.to_string().contains("mismatched version"));
        Ok(())
    }

    #[test]
    fn defaults_select_a_language() {
        let conf = Config::default_for(ServiceKind::Codeforces);
        assert_eq!(conf.service().lang_name(), Some("GNU G++17 7.3.0"));
        assert_eq!(conf.session(), &SessionConfig::default());
    }
}
