use std::fmt;
use std::io::{self, Write as _};

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::{Act, TrackMode};
use cptool_util::console::{sty_dim, sty_g, sty_r};
use cptool_util::model::{Page, Submission};
use cptool_util::Console;

use crate::cmd::{drain, parse_spec, Outcome, PagesOpt};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct SubmissionsOpt {
    /// Contest or problem. Lists the whole profile when omitted
    #[structopt(name = "spec", default_value = "")]
    spec: String,
    /// Lists submissions of this user instead of your own
    #[structopt(long)]
    handle: Option<String>,
    #[structopt(flatten)]
    pages: PagesOpt,
    /// Follows the first page until every submission is judged
    #[structopt(long, conflicts_with_all = &["pages", "all"])]
    live: bool,
}

impl SubmissionsOpt {
    pub async fn run(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<SubmissionsOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let mode = if self.live {
            TrackMode::Live
        } else {
            TrackMode::Archive(self.pages.budget())
        };
        let stream = actor
            .submissions(&spec, self.handle.as_deref(), mode)
            .await?;
        let pages = drain(stream, cnsl, |cnsl, page| match mode {
            TrackMode::Live => show_progress(cnsl, page),
            TrackMode::Archive(_) => Ok(()),
        })
        .await?;
        Ok(SubmissionsOutcome::from_pages(pages, mode))
    }
}

/// Prints the verdicts of one live snapshot.
pub(super) fn show_progress(cnsl: &mut Console, page: &Page<Submission>) -> io::Result<()> {
    for sub in page.rows() {
        let verdict = match sub.verdict_status() {
            None => sty_dim(sub.verdict().as_str()),
            Some(status) if status.is_accepted() => sty_g(sub.verdict().as_str()),
            Some(_) => sty_r(sub.verdict().as_str()),
        };
        writeln!(cnsl, "{:>10} {}", sub.id(), verdict)?;
    }
    Ok(())
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmissionsOutcome {
    submissions: Vec<Submission>,
}

impl SubmissionsOutcome {
    /// A live stream re-sends the whole table, so only its last snapshot counts.
    pub(super) fn from_pages(pages: Vec<Page<Submission>>, mode: TrackMode) -> Self {
        let submissions = match mode {
            TrackMode::Live => pages
                .into_iter()
                .last()
                .map(Page::into_rows)
                .unwrap_or_default(),
            TrackMode::Archive(_) => pages.into_iter().flat_map(Page::into_rows).collect(),
        };
        Self { submissions }
    }

    pub(super) fn submissions(&self) -> &[Submission] {
        &self.submissions
    }
}

impl fmt::Display for SubmissionsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for sub in &self.submissions {
            writeln!(
                f,
                "{:>10} {} {:<24} {:<24} {:>8} {:>9} {}",
                sub.id(),
                sub.when().format("%Y-%m-%d %H:%M"),
                sub.problem(),
                sub.language(),
                sub.time(),
                sub.memory(),
                sub.verdict()
            )?;
        }
        write!(f, "{} submissions", self.submissions.len())
    }
}

impl Outcome for SubmissionsOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
