use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::model::{Class, Contest, RegistrationState, Specifier};
use cptool_util::Console;

use crate::cmd::{drain, parse_spec, Outcome, PagesOpt};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ContestsOpt {
    /// Contest, group or listing such as `(gym)`. Lists every contest when omitted
    #[structopt(name = "spec", default_value = "")]
    spec: String,
    #[structopt(flatten)]
    pages: PagesOpt,
    /// Stops at the first finished contest
    #[structopt(long)]
    omit_finished: bool,
}

impl ContestsOpt {
    #[cfg(test)]
    pub(super) fn pages(&self) -> PagesOpt {
        self.pages
    }

    pub async fn run(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<ContestsOutcome> {
        let mut spec = parse_spec(conf.service_id, &self.spec)?;
        if spec.is_empty() {
            spec = Specifier::listing(Class::Contest);
        }
        let stream = actor
            .contests(&spec, self.pages.budget(), self.omit_finished)
            .await?;
        let pages = drain(stream, cnsl, |_, _| Ok(())).await?;
        Ok(ContestsOutcome {
            contests: pages.into_iter().flat_map(|page| page.into_rows()).collect(),
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContestsOutcome {
    contests: Vec<Contest>,
}

fn registration(contest: &Contest) -> String {
    let state: &str = contest.reg_state().into();
    match (contest.reg_state(), contest.reg_count()) {
        (RegistrationState::NotApplicable, _) => String::new(),
        (_, Some(count)) => format!("{} x{}", state, count),
        (_, None) => state.to_owned(),
    }
}

impl fmt::Display for ContestsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for contest in &self.contests {
            let length = contest.duration().as_secs() / 60;
            writeln!(
                f,
                "{:<24} {} {:>3}:{:02} {:<14} {}",
                contest.specifier().to_string(),
                contest.start_time().format("%Y-%m-%d %H:%M"),
                length / 60,
                length % 60,
                registration(contest),
                contest.name()
            )?;
        }
        write!(f, "{} contests", self.contests.len())
    }
}

impl Outcome for ContestsOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
