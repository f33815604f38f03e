use thiserror::Error;

/// Failures a judge operation can report to its caller.
///
/// These travel inside `anyhow::Error`; callers that need to branch on the
/// kind use `err.downcast_ref::<JudgeError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgeError {
    #[error("Invalid specifier : {0}")]
    InvalidSpecifier(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    SiteNotification(String),
    #[error("Transport error : {0}")]
    Transport(String),
    #[error("Page did not become ready : {0}")]
    PageNotReady(String),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Unknown language : {0}")]
    UnknownLanguage(String),
    #[error("Source file not found : {0}")]
    SourceNotFound(String),
    #[error("Source is empty")]
    EmptySource,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Submission is closed for this problem")]
    SubmissionClosed,
    #[error("Language is not available for this problem : {0}")]
    LanguageUnavailable(String),
}

impl JudgeError {
    /// Finds the judge error inside an error chain, if any.
    pub fn find(err: &anyhow::Error) -> Option<&JudgeError> {
        err.chain().find_map(|cause| cause.downcast_ref::<JudgeError>())
    }
}
