use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::{Act, PageBudget, Source, TrackMode};
use cptool_util::abs_path::AbsPathBuf;
use cptool_util::model::{LangName, ServiceKind, Specifier, Submission};
use cptool_util::Console;

use crate::cmd::submissions::{show_progress, SubmissionsOutcome};
use crate::cmd::{drain, parse_spec, Outcome};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct SubmitOpt {
    /// Problem to submit to, such as `1234 b`
    #[structopt(name = "spec")]
    spec: String,
    #[structopt(name = "file", parse(from_os_str))]
    file: PathBuf,
    /// Language name as listed by the judge. Inferred from the file extension
    /// or the config file when omitted
    #[structopt(long)]
    lang: Option<LangName>,
    /// Reads this many pages of the submission table once instead of
    /// following the verdict
    #[structopt(long)]
    pages: Option<usize>,
}

impl SubmitOpt {
    pub async fn run(
        &self,
        actor: &dyn Act,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<SubmitOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let lang = resolve_lang(
            self.lang.as_deref(),
            &self.file,
            conf.service_id,
            conf.service().lang_name(),
        )?;
        let source = Source::File(AbsPathBuf::cwd()?.join_expand(&self.file)?);
        let mode = match self.pages {
            Some(pages) => TrackMode::Archive(PageBudget::Limit(pages)),
            None => TrackMode::Live,
        };
        let stream = actor.submit(&spec, &lang, &source, mode).await?;
        let pages = drain(stream, cnsl, |cnsl, page| match mode {
            TrackMode::Live => show_progress(cnsl, page),
            TrackMode::Archive(_) => Ok(()),
        })
        .await?;
        let submissions = SubmissionsOutcome::from_pages(pages, mode);
        Ok(SubmitOutcome {
            service: conf.service_id,
            spec,
            lang,
            latest: latest(submissions.submissions()).cloned(),
        })
    }
}

/// `--lang` first, then the default for the file extension, then the config.
fn resolve_lang(
    lang: Option<&str>,
    file: &Path,
    service_id: ServiceKind,
    configured: Option<&str>,
) -> Result<LangName> {
    let by_ext = file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match service_id {
            ServiceKind::Codeforces => cptool_codeforces::lang_name_for_ext(ext),
        });
    lang.or(by_ext)
        .or(configured)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            anyhow!(
                "Could not choose a language for {}, specify one with --lang",
                file.display()
            )
        })
}

fn latest(submissions: &[Submission]) -> Option<&Submission> {
    submissions.iter().max_by_key(|sub| sub.id())
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    service: ServiceKind,
    spec: Specifier,
    lang: LangName,
    latest: Option<Submission>,
}

impl SubmitOutcome {
    fn is_accepted(&self) -> bool {
        self.latest
            .as_ref()
            .and_then(Submission::verdict_status)
            .map_or(false, |status| status.is_accepted())
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Submitted {} to {} in {}",
            self.spec, self.service, self.lang
        )?;
        if let Some(sub) = &self.latest {
            write!(f, "\n{:>10} {}", sub.id(), sub.verdict())?;
        }
        Ok(())
    }
}

impl Outcome for SubmitOutcome {
    fn is_error(&self) -> bool {
        !self.is_accepted()
    }
}
