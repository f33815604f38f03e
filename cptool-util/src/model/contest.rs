use std::time::Duration;

use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::model::Specifier;

/// Registration relationship between the current session and a contest.
#[derive(
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RegistrationState {
    Closed,
    Open,
    Done,
    /// Listings without a registration concept, such as gyms.
    NotApplicable,
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    #[get = "pub"]
    name: String,
    #[get = "pub"]
    writers: Vec<String>,
    #[get_copy = "pub"]
    start_time: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    duration: Duration,
    #[get_copy = "pub"]
    reg_count: Option<u32>,
    #[get_copy = "pub"]
    reg_state: RegistrationState,
    #[get = "pub"]
    description: Vec<String>,
    #[get = "pub"]
    specifier: Specifier,
}

impl Contest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        writers: Vec<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        reg_count: Option<u32>,
        reg_state: RegistrationState,
        description: Vec<String>,
        specifier: Specifier,
    ) -> Self {
        Self {
            name: name.into(),
            writers,
            start_time,
            duration,
            reg_count,
            reg_state,
            description,
            specifier,
        }
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        chrono::Duration::from_std(self.duration)
            .map(|duration| self.start_time + duration <= now)
            .unwrap_or(false)
    }
}

/// Registration terms of a contest that accepts registration.
#[derive(Serialize, Deserialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct Registration {
    name: String,
    terms: String,
    specifier: Specifier,
}

impl Registration {
    pub fn new(name: impl Into<String>, terms: impl Into<String>, specifier: Specifier) -> Self {
        Self {
            name: name.into(),
            terms: terms.into(),
            specifier,
        }
    }
}
