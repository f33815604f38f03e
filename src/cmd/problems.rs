use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::model::Problem;

use crate::cmd::{parse_spec, Outcome};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct ProblemsOpt {
    /// Contest, or a single problem such as `1234 b`
    #[structopt(name = "spec")]
    spec: String,
}

impl ProblemsOpt {
    pub async fn run(&self, actor: &dyn Act, conf: &Config) -> Result<ProblemsOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let problems = actor.problems(&spec).await?;
        Ok(ProblemsOutcome { problems })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProblemsOutcome {
    problems: Vec<Problem>,
}

impl fmt::Display for ProblemsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for problem in &self.problems {
            writeln!(
                f,
                "{} ({}, {})",
                problem.name(),
                problem.time_limit(),
                problem.memory_limit()
            )?;
            for (i, sample) in problem.samples().iter().enumerate() {
                write!(
                    f,
                    "--- sample {} input\n{}--- sample {} output\n{}",
                    i + 1,
                    sample.input(),
                    i + 1,
                    sample.output()
                )?;
            }
        }
        write!(f, "{} problems", self.problems.len())
    }
}

impl Outcome for ProblemsOutcome {
    fn is_error(&self) -> bool {
        self.problems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use cptool_util::model::{SampleTest, Specifier};

    #[test]
    fn test_display() {
        let outcome = ProblemsOutcome {
            problems: vec![Problem::new(
                "A. Watermelon",
                ("1 second".to_owned(), "64 megabytes".to_owned()),
                ("standard input".to_owned(), "standard output".to_owned()),
                vec![SampleTest::new("8\n", "YES\n")],
                Specifier::new(Some("4"), Some("a"), None),
            )],
        };
        assert_eq!(
            outcome.to_string(),
            "A. Watermelon (1 second, 64 megabytes)\n--- sample 1 input\n8\n--- sample 1 output\nYES\n1 problems"
        );
        assert!(!outcome.is_error());
    }
}
