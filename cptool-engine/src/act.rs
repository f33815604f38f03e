use std::time::Duration;

use async_trait::async_trait;

use crate::model::{Contest, LangNameRef, Problem, Registration, Specifier, Submission};
use crate::session::Session;
use crate::stream::{ListingStream, PageBudget};
use crate::track::{Source, TrackMode};
use crate::Result;

/// Everything the command line can ask of one judge.
#[async_trait]
pub trait Act: Send + Sync {
    fn session(&self) -> &Session;

    async fn current_user(&self) -> Result<Option<String>> {
        self.session().current_user().await
    }

    async fn login(&self, user: &str, pass: &str) -> Result<String> {
        self.session().login(user, pass).await
    }

    async fn logout(&self) -> Result<()> {
        self.session().logout().await
    }

    async fn contests(
        &self,
        spec: &Specifier,
        budget: PageBudget,
        omit_finished: bool,
    ) -> Result<ListingStream<Contest>>;

    /// Submissions of `handle`, or of the current user when `None`.
    async fn submissions(
        &self,
        spec: &Specifier,
        handle: Option<&str>,
        mode: TrackMode,
    ) -> Result<ListingStream<Submission>>;

    async fn submit(
        &self,
        spec: &Specifier,
        lang_name: LangNameRef<'_>,
        source: &Source,
        mode: TrackMode,
    ) -> Result<ListingStream<Submission>>;

    async fn problems(&self, spec: &Specifier) -> Result<Vec<Problem>>;

    async fn source_code(&self, spec: &Specifier, id: u64) -> Result<String>;

    /// Time left on the contest countdown, zero once it has run out.
    async fn countdown(&self, spec: &Specifier) -> Result<Duration>;

    async fn registration(&self, spec: &Specifier) -> Result<Registration>;

    async fn register(&self, spec: &Specifier) -> Result<()>;
}
