use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::model::Specifier;

/// Terminal outcome of judging.
#[derive(
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
)]
pub enum VerdictStatus {
    Accepted,
    WrongAnswer,
    PresentationError,
    RuntimeError,
    CompilationError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    IdlenessLimitExceeded,
    DenialOfJudgement,
    Skipped,
    Hacked,
    /// Judged, but the site reported an outcome outside the ones above.
    /// The row's `verdict` keeps the site's text.
    Unrecognized,
}

impl VerdictStatus {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// One row of a submission table.
///
/// A row with no verdict status is still being judged.
#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    #[get_copy = "pub"]
    id: u64,
    #[get_copy = "pub"]
    when: DateTime<Utc>,
    #[get = "pub"]
    author: String,
    #[get = "pub"]
    problem: String,
    #[get = "pub"]
    language: String,
    #[get = "pub"]
    verdict: String,
    #[get_copy = "pub"]
    verdict_status: Option<VerdictStatus>,
    #[get = "pub"]
    time: String,
    #[get = "pub"]
    memory: String,
    #[get = "pub"]
    specifier: Specifier,
}

impl Submission {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        when: DateTime<Utc>,
        author: impl Into<String>,
        problem: impl Into<String>,
        language: impl Into<String>,
        verdict: impl Into<String>,
        verdict_status: Option<VerdictStatus>,
        time: impl Into<String>,
        memory: impl Into<String>,
        specifier: Specifier,
    ) -> Self {
        Self {
            id,
            when,
            author: author.into(),
            problem: problem.into(),
            language: language.into(),
            verdict: verdict.into(),
            verdict_status,
            time: time.into(),
            memory: memory.into(),
            specifier,
        }
    }

    pub fn is_judging(&self) -> bool {
        self.verdict_status.is_none()
    }
}
