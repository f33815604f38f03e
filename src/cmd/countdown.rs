use std::fmt;
use std::time::Duration;

use serde::Serialize;
use structopt::StructOpt;

use cptool_config::Config;
use cptool_engine::Act;
use cptool_util::model::Specifier;

use crate::cmd::{parse_spec, Outcome};
use crate::Result;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct CountdownOpt {
    #[structopt(name = "spec")]
    spec: String,
}

impl CountdownOpt {
    pub async fn run(&self, actor: &dyn Act, conf: &Config) -> Result<CountdownOutcome> {
        let spec = parse_spec(conf.service_id, &self.spec)?;
        let left = actor.countdown(&spec).await?;
        Ok(CountdownOutcome { spec, left })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountdownOutcome {
    spec: Specifier,
    #[serde(with = "humantime_serde")]
    left: Duration,
}

impl fmt::Display for CountdownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let secs = self.left.as_secs();
        if secs == 0 {
            return write!(f, "{} has started", self.spec);
        }
        write!(
            f,
            "{} starts in {:02}:{:02}:{:02}",
            self.spec,
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        )
    }
}

impl Outcome for CountdownOutcome {
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let spec = Specifier::new(Some("1234"), None, None);
        let tests = &[
            (3723, "1234 (contest) starts in 01:02:03"),
            (0, "1234 (contest) has started"),
        ];
        for (secs, expected) in tests {
            let outcome = CountdownOutcome {
                spec: spec.clone(),
                left: Duration::from_secs(*secs),
            };
            assert_eq!(outcome.to_string(), *expected);
        }
    }
}
