use std::{fmt, io};

use anyhow::Context as _;
use serde::Serialize;
use structopt::StructOpt;

use cptool_codeforces::CodeforcesActor;
use cptool_config::Config;
use cptool_engine::{Act, ListingStream, PageBudget, PageEvent};
use cptool_util::model::{Page, ServiceKind, Specifier};
use cptool_util::Console;

use crate::{OutputFormat, Result};

mod contests;
mod countdown;
mod login;
mod logout;
mod me;
mod problems;
mod register;
mod source;
mod submissions;
mod submit;

pub use contests::{ContestsOpt, ContestsOutcome};
pub use countdown::{CountdownOpt, CountdownOutcome};
pub use login::{LoginOpt, LoginOutcome};
pub use logout::{LogoutOpt, LogoutOutcome};
pub use me::{MeOpt, MeOutcome};
pub use problems::{ProblemsOpt, ProblemsOutcome};
pub use register::{RegisterOpt, RegisterOutcome};
pub use source::{SourceOpt, SourceOutcome};
pub use submissions::{SubmissionsOpt, SubmissionsOutcome};
pub use submit::{SubmitOpt, SubmitOutcome};

pub trait Outcome: OutcomeSerialize {
    fn is_error(&self) -> bool;
}

pub trait OutcomeSerialize: fmt::Display + fmt::Debug {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn print(&self, stdout: &mut dyn io::Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Default => writeln!(stdout, "{}", self)?,
            OutputFormat::Debug => writeln!(stdout, "{:#?}", self)?,
            OutputFormat::Json => {
                self.write_json(stdout)?;
                writeln!(stdout)?
            }
            OutputFormat::Yaml => self.write_yaml(stdout)?,
        }
        Ok(())
    }
}

impl<T: Serialize + fmt::Display + fmt::Debug> OutcomeSerialize for T {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Could not print outcome as json")
    }

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_yaml::to_writer(writer, self).context("Could not print outcome as yaml")
    }
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub enum Cmd {
    /// Logs in to service
    Login(LoginOpt),
    /// Logs out from service
    Logout(LogoutOpt),
    /// Gets info of user currently logged in to service
    Me(MeOpt),
    /// Lists contests
    Contests(ContestsOpt),
    /// Lists submissions, or follows them until judged
    Submissions(SubmissionsOpt),
    /// Submits a solution and follows its verdict
    Submit(SubmitOpt),
    /// Shows problem statements and samples
    Problems(ProblemsOpt),
    /// Prints the source code of a submission
    Source(SourceOpt),
    /// Shows time left until a contest starts
    Countdown(CountdownOpt),
    /// Registers for a contest
    Register(RegisterOpt),
}

impl Cmd {
    pub async fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let actor = build_actor(conf)?;
        let outcome = self.dispatch(actor.as_ref(), conf, cnsl).await;
        // stops producers of streams left unread, e.g. after an output error
        actor.session().shutdown();
        outcome
    }

    async fn dispatch(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<Box<dyn Outcome>> {
        let outcome: Box<dyn Outcome> = match self {
            Self::Login(opt) => Box::new(opt.run(actor, conf, cnsl).await?),
            Self::Logout(opt) => Box::new(opt.run(actor, conf).await?),
            Self::Me(opt) => Box::new(opt.run(actor, conf).await?),
            Self::Contests(opt) => Box::new(opt.run(actor, conf, cnsl).await?),
            Self::Submissions(opt) => Box::new(opt.run(actor, conf, cnsl).await?),
            Self::Submit(opt) => Box::new(opt.run(actor, conf, cnsl).await?),
            Self::Problems(opt) => Box::new(opt.run(actor, conf).await?),
            Self::Source(opt) => Box::new(opt.run(actor, conf).await?),
            Self::Countdown(opt) => Box::new(opt.run(actor, conf).await?),
            Self::Register(opt) => Box::new(opt.run(actor, conf, cnsl).await?),
        };
        Ok(outcome)
    }
}

fn build_actor(conf: &Config) -> Result<Box<dyn Act>> {
    match conf.service_id {
        ServiceKind::Codeforces => Ok(Box::new(CodeforcesActor::new(conf.session())?)),
    }
}

fn parse_spec(service_id: ServiceKind, text: &str) -> Result<Specifier> {
    match service_id {
        ServiceKind::Codeforces => cptool_codeforces::parse_specifier(text),
    }
}

/// How many listing pages to read.
#[derive(StructOpt, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagesOpt {
    /// Number of pages to read
    #[structopt(long, default_value = "1")]
    pages: usize,
    /// Reads every page
    #[structopt(long, conflicts_with = "pages")]
    all: bool,
}

impl PagesOpt {
    fn budget(&self) -> PageBudget {
        if self.all {
            PageBudget::Unbounded
        } else {
            PageBudget::Limit(self.pages)
        }
    }
}

/// Reads a listing to its end, handing every page to `show` as it arrives.
///
/// Failed pages are reported as warnings. Ctrl-C cancels the producer and
/// keeps what was read so far.
async fn drain<T>(
    mut stream: ListingStream<T>,
    cnsl: &mut Console,
    mut show: impl FnMut(&mut Console, &Page<T>) -> io::Result<()>,
) -> Result<Vec<Page<T>>> {
    let mut pages = Vec::new();
    loop {
        let event = tokio::select! {
            event = stream.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                stream.cancel();
                cnsl.warn("Interrupted")?;
                break;
            }
        };
        match event {
            Some(PageEvent::Page(page)) => {
                show(cnsl, &page)?;
                pages.push(page);
            }
            Some(PageEvent::Failed(failure)) => cnsl.warn(&failure.to_string())?,
            None => break,
        }
    }
    Ok(pages)
}
